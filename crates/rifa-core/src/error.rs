//! Core error types.

use crate::ticket::TicketStatus;
use thiserror::Error;

/// Errors raised by the draw algorithm and the ticket state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RifaError {
    /// More winners were requested than there are eligible tickets.
    #[error("Insufficient pool: requested {requested} winners but only {available} tickets are available")]
    InsufficientPool { requested: usize, available: usize },

    /// A draw must request at least one winner.
    #[error("Invalid winner count: {requested}. A draw must request at least one winner")]
    InvalidWinnerCount { requested: usize },

    /// The same ticket code appears twice in a pool.
    #[error("Duplicate ticket code in pool: {code}")]
    DuplicateTicket { code: String },

    /// A status change the ticket lifecycle does not allow.
    #[error("Ticket '{code}' cannot move from {from} to {to}")]
    InvalidTransition {
        code: String,
        from: TicketStatus,
        to: TicketStatus,
    },
}

impl RifaError {
    /// Create an insufficient pool error.
    pub fn insufficient_pool(requested: usize, available: usize) -> Self {
        Self::InsufficientPool {
            requested,
            available,
        }
    }

    /// Create a duplicate ticket error.
    pub fn duplicate_ticket(code: impl Into<String>) -> Self {
        Self::DuplicateTicket { code: code.into() }
    }

    /// Create an invalid transition error.
    pub fn invalid_transition(code: impl Into<String>, from: TicketStatus, to: TicketStatus) -> Self {
        Self::InvalidTransition {
            code: code.into(),
            from,
            to,
        }
    }
}
