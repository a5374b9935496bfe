//! Ticket issuance.

use crate::{StoreError, TicketStore};
use rifa_core::Ticket;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Format of issued ticket codes: prefix followed by a zero-padded number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCodeFormat {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_width")]
    pub width: usize,
}

fn default_prefix() -> String {
    "T".to_string()
}

fn default_width() -> usize {
    3
}

impl Default for TicketCodeFormat {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            width: default_width(),
        }
    }
}

impl TicketCodeFormat {
    /// Render the code for `number`, e.g. `T007`.
    pub fn code(&self, number: u32) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.width)
    }

    /// Number encoded in `code`, if it follows this format.
    pub fn number(&self, code: &str) -> Option<u32> {
        let digits = code.strip_prefix(&self.prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// Participant a batch of tickets is handed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketHolder {
    pub student_id: Option<String>,
    pub class_name: Option<String>,
}

impl TicketHolder {
    fn apply(&self, mut ticket: Ticket) -> Ticket {
        ticket.student_id.clone_from(&self.student_id);
        ticket.class_name.clone_from(&self.class_name);
        ticket
    }
}

/// Issue `count` new available tickets for a campaign.
///
/// Numbering continues after the highest existing code in the same format,
/// so issuing twice never reuses a code.
pub async fn issue_tickets(
    store: &dyn TicketStore,
    campaign_id: &str,
    count: u32,
    format: &TicketCodeFormat,
    holder: &TicketHolder,
) -> Result<Vec<Ticket>, StoreError> {
    let existing = match store.tickets(campaign_id).await {
        Ok(tickets) => tickets,
        Err(StoreError::CampaignNotFound { .. }) => Vec::new(),
        Err(e) => return Err(e),
    };

    let highest = existing
        .iter()
        .filter_map(|ticket| format.number(&ticket.code))
        .max()
        .unwrap_or(0);
    let (start, end) = highest
        .checked_add(1)
        .and_then(|start| start.checked_add(count).map(|end| (start, end)))
        .ok_or_else(|| StoreError::TicketNumbersExhausted {
            campaign: campaign_id.to_string(),
            requested: count,
        })?;

    let tickets: Vec<Ticket> = (start..end)
        .map(|number| holder.apply(Ticket::new(format.code(number), campaign_id)))
        .collect();

    store.insert_tickets(tickets.clone()).await?;

    info!(campaign = campaign_id, count, first = start, "issued tickets");
    Ok(tickets)
}
