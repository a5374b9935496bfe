//! Store error types.

use rifa_core::{RifaError, TicketStatus};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store and draw operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Another draw holds the campaign.
    #[error("A draw is already in progress for campaign '{campaign}'")]
    DrawInProgress { campaign: String },

    /// Campaign has no tickets or draws.
    #[error("Campaign not found: {campaign}")]
    CampaignNotFound { campaign: String },

    /// Ticket code not present in the campaign.
    #[error("Ticket not found: {campaign}/{code}")]
    TicketNotFound { campaign: String, code: String },

    /// Ticket code already issued in the campaign.
    #[error("Ticket already exists: {campaign}/{code}")]
    DuplicateTicket { campaign: String, code: String },

    /// A winner changed status between the pool read and the commit.
    #[error("Ticket '{code}' is no longer available (status: {status})")]
    TicketUnavailable { code: String, status: TicketStatus },

    /// Available tickets differ from the pool the draw was computed from.
    #[error("Eligible pool of campaign '{campaign}' changed since the draw read it")]
    PoolChanged { campaign: String },

    /// Draw event whose winners do not fit its own pool.
    #[error("Malformed draw for campaign '{campaign}': {reason}")]
    MalformedDraw { campaign: String, reason: String },

    /// Issuing would run past the largest ticket number.
    #[error("Cannot issue {requested} more tickets for campaign '{campaign}': ticket numbers exhausted")]
    TicketNumbersExhausted { campaign: String, requested: u32 },

    /// Another draw was committed after this one read its pool.
    #[error("Draw sequence conflict for campaign '{campaign}': expected {expected}, got {found}")]
    SequenceConflict {
        campaign: String,
        expected: u32,
        found: u32,
    },

    /// Snapshot could not be read or written.
    #[error("Snapshot error for {path}: {message}")]
    Snapshot { path: PathBuf, message: String },

    /// Draw or ticket lifecycle error.
    #[error(transparent)]
    Draw(#[from] RifaError),

    /// Generic store error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Create a draw in progress error.
    pub fn draw_in_progress(campaign: impl Into<String>) -> Self {
        Self::DrawInProgress {
            campaign: campaign.into(),
        }
    }

    /// Create a campaign not found error.
    pub fn campaign_not_found(campaign: impl Into<String>) -> Self {
        Self::CampaignNotFound {
            campaign: campaign.into(),
        }
    }

    /// Create a ticket not found error.
    pub fn ticket_not_found(campaign: impl Into<String>, code: impl Into<String>) -> Self {
        Self::TicketNotFound {
            campaign: campaign.into(),
            code: code.into(),
        }
    }

    /// Create a duplicate ticket error.
    pub fn duplicate_ticket(campaign: impl Into<String>, code: impl Into<String>) -> Self {
        Self::DuplicateTicket {
            campaign: campaign.into(),
            code: code.into(),
        }
    }

    /// Create a pool changed error.
    pub fn pool_changed(campaign: impl Into<String>) -> Self {
        Self::PoolChanged {
            campaign: campaign.into(),
        }
    }

    /// Create a malformed draw error.
    pub fn malformed_draw(campaign: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDraw {
            campaign: campaign.into(),
            reason: reason.into(),
        }
    }

    /// Create a snapshot error.
    pub fn snapshot(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Snapshot {
            path: path.into(),
            message: message.into(),
        }
    }
}
