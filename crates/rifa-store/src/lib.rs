//! Ticket store seam and draw orchestration for rifa.
//!
//! This crate defines the interface the surrounding application implements
//! over its persistence layer, an in-memory implementation with JSON
//! snapshots, and the [`DrawService`] that runs a draw as one atomic,
//! campaign-exclusive operation.

mod error;
mod issue;
mod lock;
mod memory;
mod service;

pub use error::StoreError;
pub use issue::{issue_tickets, TicketCodeFormat, TicketHolder};
pub use lock::{DataLock, DataLockGuard};
pub use memory::{CampaignSnapshot, MemoryStore, StoreSnapshot};
pub use service::{DrawRequest, DrawService};

use async_trait::async_trait;
use rifa_core::{DrawEvent, Ticket};

/// Abstract interface over ticket persistence.
///
/// Stores are responsible for:
/// - Reading the tickets of a campaign
/// - Committing a draw atomically (winner statuses and the draw event)
/// - Applying claim and void transitions
/// - Keeping the campaign's draw history
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// All tickets of a campaign, in ticket code order.
    async fn tickets(&self, campaign_id: &str) -> Result<Vec<Ticket>, StoreError>;

    /// Tickets of a campaign with status `available`.
    async fn available_tickets(&self, campaign_id: &str) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .tickets(campaign_id)
            .await?
            .into_iter()
            .filter(Ticket::is_available)
            .collect())
    }

    /// Insert tickets. Either all are inserted or none.
    async fn insert_tickets(&self, tickets: Vec<Ticket>) -> Result<(), StoreError>;

    /// Draw events of a campaign, in sequence order.
    async fn draw_events(&self, campaign_id: &str) -> Result<Vec<DrawEvent>, StoreError>;

    /// Sequence number the next draw of a campaign takes.
    async fn next_sequence(&self, campaign_id: &str) -> Result<u32, StoreError> {
        let events = self.draw_events(campaign_id).await?;
        Ok(events.last().map_or(1, |event| event.sequence + 1))
    }

    /// Mark every winner `assigned` and append the event.
    ///
    /// Must fail without changing anything if any winner is no longer
    /// available or the event's sequence is not the next one.
    async fn commit_draw(&self, event: &DrawEvent) -> Result<(), StoreError>;

    /// Claim an assigned ticket (`assigned` to `redeemed`).
    async fn redeem_ticket(&self, campaign_id: &str, code: &str) -> Result<Ticket, StoreError>;

    /// Void an available ticket (`available` to `canceled`).
    async fn cancel_ticket(&self, campaign_id: &str, code: &str) -> Result<Ticket, StoreError>;
}
