//! In-memory ticket store with JSON snapshots.

use crate::{StoreError, TicketStore};
use async_trait::async_trait;
use chrono::Utc;
use rifa_core::{DrawEvent, Ticket, TicketStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Serializable state of a whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub campaigns: BTreeMap<String, CampaignSnapshot>,
}

/// Serializable state of one campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub draws: Vec<DrawEvent>,
}

#[derive(Default)]
struct CampaignState {
    tickets: BTreeMap<String, Ticket>,
    draws: Vec<DrawEvent>,
}

/// Ticket store held in process memory.
///
/// All state sits behind one mutex, so every trait operation is atomic with
/// respect to the others.
#[derive(Default)]
pub struct MemoryStore {
    campaigns: Mutex<BTreeMap<String, CampaignState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot, rejecting duplicate ticket codes.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut campaigns = BTreeMap::new();

        for (campaign_id, campaign) in snapshot.campaigns {
            let mut state = CampaignState::default();
            for ticket in campaign.tickets {
                if state.tickets.contains_key(&ticket.code) {
                    return Err(StoreError::duplicate_ticket(&campaign_id, ticket.code));
                }
                state.tickets.insert(ticket.code.clone(), ticket);
            }
            state.draws = campaign.draws;
            state.draws.sort_by_key(|event| event.sequence);
            campaigns.insert(campaign_id, state);
        }

        Ok(Self {
            campaigns: Mutex::new(campaigns),
        })
    }

    /// Copy the current state into a snapshot.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let campaigns = self.lock()?;
        Ok(StoreSnapshot {
            campaigns: campaigns
                .iter()
                .map(|(id, state)| {
                    (
                        id.clone(),
                        CampaignSnapshot {
                            tickets: state.tickets.values().cloned().collect(),
                            draws: state.draws.clone(),
                        },
                    )
                })
                .collect(),
        })
    }

    /// Load a store from a JSON snapshot file.
    ///
    /// A missing file yields an empty store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "no snapshot file, starting empty");
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::snapshot(path, e.to_string()))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)
            .map_err(|e| StoreError::snapshot(path, e.to_string()))?;

        Self::from_snapshot(snapshot)
    }

    /// Write the store to a JSON snapshot file.
    ///
    /// The snapshot is written next to `path` and renamed over it, so a
    /// failed save leaves the previous file intact. Processes sharing the
    /// file hold a [`DataLock`](crate::DataLock) from `open` to `save`.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = self.snapshot()?;
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::snapshot(path, e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::snapshot(path, e.to_string()))?;
        }

        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, json).map_err(|e| StoreError::snapshot(path, e.to_string()))?;
        std::fs::rename(&staging, path).map_err(|e| StoreError::snapshot(path, e.to_string()))?;

        debug!(path = %path.display(), "saved snapshot");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, CampaignState>>, StoreError> {
        self.campaigns
            .lock()
            .map_err(|_| StoreError::Other(anyhow::anyhow!("ticket store lock poisoned")))
    }

    fn transition(
        &self,
        campaign_id: &str,
        code: &str,
        next: TicketStatus,
    ) -> Result<Ticket, StoreError> {
        let mut campaigns = self.lock()?;
        let state = campaigns
            .get_mut(campaign_id)
            .ok_or_else(|| StoreError::campaign_not_found(campaign_id))?;
        let ticket = state
            .tickets
            .get_mut(code)
            .ok_or_else(|| StoreError::ticket_not_found(campaign_id, code))?;

        ticket.transition(next, Utc::now())?;
        info!(campaign = campaign_id, code, status = %next, "ticket status changed");
        Ok(ticket.clone())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn tickets(&self, campaign_id: &str) -> Result<Vec<Ticket>, StoreError> {
        let campaigns = self.lock()?;
        let state = campaigns
            .get(campaign_id)
            .ok_or_else(|| StoreError::campaign_not_found(campaign_id))?;
        Ok(state.tickets.values().cloned().collect())
    }

    async fn insert_tickets(&self, tickets: Vec<Ticket>) -> Result<(), StoreError> {
        let mut campaigns = self.lock()?;

        // Validate the whole batch before touching any campaign
        let mut batch = HashSet::with_capacity(tickets.len());
        for ticket in &tickets {
            let key = (ticket.campaign_id.as_str(), ticket.code.as_str());
            let exists = campaigns
                .get(&ticket.campaign_id)
                .is_some_and(|state| state.tickets.contains_key(&ticket.code));
            if exists || !batch.insert(key) {
                return Err(StoreError::duplicate_ticket(&ticket.campaign_id, &ticket.code));
            }
        }

        let count = tickets.len();
        for ticket in tickets {
            campaigns
                .entry(ticket.campaign_id.clone())
                .or_default()
                .tickets
                .insert(ticket.code.clone(), ticket);
        }

        debug!(count, "inserted tickets");
        Ok(())
    }

    async fn draw_events(&self, campaign_id: &str) -> Result<Vec<DrawEvent>, StoreError> {
        let campaigns = self.lock()?;
        let state = campaigns
            .get(campaign_id)
            .ok_or_else(|| StoreError::campaign_not_found(campaign_id))?;
        Ok(state.draws.clone())
    }

    async fn commit_draw(&self, event: &DrawEvent) -> Result<(), StoreError> {
        let mut campaigns = self.lock()?;
        let state = campaigns
            .get_mut(&event.campaign_id)
            .ok_or_else(|| StoreError::campaign_not_found(&event.campaign_id))?;

        let expected = state.draws.last().map_or(1, |last| last.sequence + 1);
        if event.sequence != expected {
            return Err(StoreError::SequenceConflict {
                campaign: event.campaign_id.clone(),
                expected,
                found: event.sequence,
            });
        }

        // Winners must be distinct members of the recorded pool that are still available
        let eligible: HashSet<&str> = event.eligible.iter().map(String::as_str).collect();
        let mut seen = HashSet::with_capacity(event.winners.len());
        for code in &event.winners {
            if !seen.insert(code.as_str()) {
                return Err(StoreError::malformed_draw(
                    &event.campaign_id,
                    format!("winner '{}' appears more than once", code),
                ));
            }
            if !eligible.contains(code.as_str()) {
                return Err(StoreError::malformed_draw(
                    &event.campaign_id,
                    format!("winner '{}' is not in the eligible pool", code),
                ));
            }

            let ticket = state
                .tickets
                .get(code)
                .ok_or_else(|| StoreError::ticket_not_found(&event.campaign_id, code))?;
            if !ticket.is_available() {
                return Err(StoreError::TicketUnavailable {
                    code: code.clone(),
                    status: ticket.status,
                });
            }
        }

        // The pool itself must not have moved since it was read
        let available = state
            .tickets
            .values()
            .filter(|ticket| ticket.is_available())
            .map(|ticket| ticket.code.as_str());
        if !available.eq(event.eligible.iter().map(String::as_str)) {
            warn!(campaign = %event.campaign_id, "eligible pool changed before commit");
            return Err(StoreError::pool_changed(&event.campaign_id));
        }

        for code in &event.winners {
            if let Some(ticket) = state.tickets.get_mut(code) {
                ticket.transition(TicketStatus::Assigned, event.drawn_at)?;
            }
        }
        state.draws.push(event.clone());

        Ok(())
    }

    async fn redeem_ticket(&self, campaign_id: &str, code: &str) -> Result<Ticket, StoreError> {
        self.transition(campaign_id, code, TicketStatus::Redeemed)
    }

    async fn cancel_ticket(&self, campaign_id: &str, code: &str) -> Result<Ticket, StoreError> {
        self.transition(campaign_id, code, TicketStatus::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rifa_core::{EligiblePool, Selection};
    use tempfile::TempDir;

    const FIVE: [&str; 5] = ["T001", "T002", "T003", "T004", "T005"];

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_tickets(
                FIVE.into_iter()
                    .map(|code| Ticket::new(code, "camp2024"))
                    .collect(),
            )
            .await
            .unwrap();
        store
    }

    /// Event recording `winners` drawn from `eligible`.
    fn event_over(eligible: &[&str], winners: &[&str], sequence: u32) -> DrawEvent {
        let pool = EligiblePool::new(eligible.iter().copied()).unwrap();
        let selection = Selection {
            winners: winners.iter().map(|code| code.to_string()).collect(),
            requested: winners.len(),
        };
        DrawEvent::new("camp2024", sequence, "seed", pool, selection, Utc::now())
    }

    fn event_for(winners: &[&str], sequence: u32) -> DrawEvent {
        event_over(&FIVE, winners, sequence)
    }

    async fn assert_untouched(store: &MemoryStore) {
        let available = store.available_tickets("camp2024").await.unwrap();
        assert_eq!(available.len(), 5);
        assert!(store.draw_events("camp2024").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_campaign() {
        let store = MemoryStore::new();
        let err = store.available_tickets("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::CampaignNotFound { .. }));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates_atomically() {
        let store = seeded_store().await;
        let err = store
            .insert_tickets(vec![
                Ticket::new("T006", "camp2024"),
                Ticket::new("T001", "camp2024"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTicket { .. }));
        assert_eq!(store.tickets("camp2024").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_commit_assigns_winners() {
        let store = seeded_store().await;
        let event = event_for(&["T001", "T003"], 1);
        store.commit_draw(&event).await.unwrap();

        let available = store.available_tickets("camp2024").await.unwrap();
        let codes: Vec<&str> = available.iter().map(|t| t.code.as_str()).collect();
        assert_eq!(codes, vec!["T002", "T004", "T005"]);

        let tickets = store.tickets("camp2024").await.unwrap();
        let t1 = tickets.iter().find(|t| t.code == "T001").unwrap();
        assert_eq!(t1.status, TicketStatus::Assigned);
        assert_eq!(t1.updated_at, Some(event.drawn_at));

        assert_eq!(store.next_sequence("camp2024").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_commit_aborts_on_unavailable_winner() {
        let store = seeded_store().await;
        store.cancel_ticket("camp2024", "T003").await.unwrap();

        let event = event_for(&["T001", "T003"], 1);
        let err = store.commit_draw(&event).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::TicketUnavailable { ref code, status: TicketStatus::Canceled } if code == "T003"
        ));

        // Nothing was applied
        let tickets = store.tickets("camp2024").await.unwrap();
        let t1 = tickets.iter().find(|t| t.code == "T001").unwrap();
        assert_eq!(t1.status, TicketStatus::Available);
        assert!(store.draw_events("camp2024").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_rejects_stale_sequence() {
        let store = seeded_store().await;
        store.commit_draw(&event_for(&["T001"], 1)).await.unwrap();

        let err = store.commit_draw(&event_for(&["T002"], 1)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::SequenceConflict { expected: 2, found: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_commit_rejects_repeated_winner() {
        let store = seeded_store().await;

        let err = store
            .commit_draw(&event_for(&["T001", "T001"], 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MalformedDraw { ref reason, .. } if reason.contains("T001")));
        assert_untouched(&store).await;
    }

    #[tokio::test]
    async fn test_commit_rejects_winner_outside_pool() {
        let store = seeded_store().await;

        let mut event = event_for(&["T001"], 1);
        event.winners.push("T999".to_string());
        let err = store.commit_draw(&event).await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedDraw { .. }));
        assert_untouched(&store).await;
    }

    #[tokio::test]
    async fn test_commit_rejects_pool_shrunk_after_read() {
        let store = seeded_store().await;
        let event = event_for(&["T002", "T001"], 1);

        // A non-winning ticket is voided between pool read and commit
        store.cancel_ticket("camp2024", "T005").await.unwrap();

        let err = store.commit_draw(&event).await.unwrap_err();
        assert!(matches!(err, StoreError::PoolChanged { ref campaign } if campaign == "camp2024"));

        let tickets = store.tickets("camp2024").await.unwrap();
        let t1 = tickets.iter().find(|t| t.code == "T001").unwrap();
        assert_eq!(t1.status, TicketStatus::Available);
        assert!(store.draw_events("camp2024").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_rejects_pool_grown_after_read() {
        let store = seeded_store().await;
        let event = event_for(&["T003"], 1);

        store
            .insert_tickets(vec![Ticket::new("T006", "camp2024")])
            .await
            .unwrap();

        let err = store.commit_draw(&event).await.unwrap_err();
        assert!(matches!(err, StoreError::PoolChanged { .. }));
        assert_eq!(store.available_tickets("camp2024").await.unwrap().len(), 6);
        assert!(store.draw_events("camp2024").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redraw_commits_over_remaining_pool() {
        let store = seeded_store().await;
        store.commit_draw(&event_for(&["T002", "T001"], 1)).await.unwrap();

        let second = event_over(&["T003", "T004", "T005"], &["T004"], 2);
        store.commit_draw(&second).await.unwrap();
        assert_eq!(store.draw_events("camp2024").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_claim_and_void() {
        let store = seeded_store().await;
        store.commit_draw(&event_for(&["T001"], 1)).await.unwrap();

        let redeemed = store.redeem_ticket("camp2024", "T001").await.unwrap();
        assert_eq!(redeemed.status, TicketStatus::Redeemed);

        // Available tickets cannot be claimed
        let err = store.redeem_ticket("camp2024", "T002").await.unwrap_err();
        assert!(matches!(err, StoreError::Draw(_)));

        let canceled = store.cancel_ticket("camp2024", "T002").await.unwrap();
        assert_eq!(canceled.status, TicketStatus::Canceled);

        let err = store.cancel_ticket("camp2024", "T999").await.unwrap_err();
        assert!(matches!(err, StoreError::TicketNotFound { .. }));
    }

    #[tokio::test]
    async fn test_snapshot_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("rifa.json");

        let store = seeded_store().await;
        store.commit_draw(&event_for(&["T004"], 1)).await.unwrap();
        store.save(&path).unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.snapshot().unwrap(), store.snapshot().unwrap());
        assert_eq!(reopened.draw_events("camp2024").await.unwrap().len(), 1);
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = MemoryStore::open(&temp_dir.path().join("missing.json")).unwrap();
        assert!(store.snapshot().unwrap().campaigns.is_empty());
    }

    #[test]
    fn test_open_rejects_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rifa.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = MemoryStore::open(&path).err().unwrap();
        assert!(matches!(err, StoreError::Snapshot { .. }));
    }
}
