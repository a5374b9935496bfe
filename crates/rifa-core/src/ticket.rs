//! Raffle tickets and their lifecycle.

use crate::error::RifaError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a ticket.
///
/// ```text
/// available ──win──▶ assigned ──claim──▶ redeemed
///     │
///     └──void──▶ canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Available,
    Assigned,
    Redeemed,
    Canceled,
}

impl TicketStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Available, TicketStatus::Assigned)
                | (TicketStatus::Available, TicketStatus::Canceled)
                | (TicketStatus::Assigned, TicketStatus::Redeemed)
        )
    }

    /// Redeemed and canceled tickets never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Redeemed | TicketStatus::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Available => "available",
            TicketStatus::Assigned => "assigned",
            TicketStatus::Redeemed => "redeemed",
            TicketStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single raffle ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket code, e.g. `T001`
    pub code: String,

    /// Campaign the ticket belongs to
    pub campaign_id: String,

    pub status: TicketStatus,

    /// Participant (student) holding the ticket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,

    /// Class of the participant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Time of the last status change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Create an available ticket.
    pub fn new(code: impl Into<String>, campaign_id: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            campaign_id: campaign_id.into(),
            status: TicketStatus::Available,
            student_id: None,
            class_name: None,
            updated_at: None,
        }
    }

    /// Associate the ticket with a participant.
    pub fn with_student(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    /// Associate the ticket with a class.
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == TicketStatus::Available
    }

    /// Move the ticket to `next`, stamping the change time.
    pub fn transition(&mut self, next: TicketStatus, at: DateTime<Utc>) -> Result<(), RifaError> {
        if !self.status.can_transition_to(next) {
            return Err(RifaError::invalid_transition(&self.code, self.status, next));
        }
        self.status = next;
        self.updated_at = Some(at);
        Ok(())
    }
}
