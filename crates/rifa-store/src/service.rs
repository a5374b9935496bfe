//! Atomic draw orchestration.

use crate::{StoreError, TicketStore};
use chrono::Utc;
use rifa_core::{draw, DrawEvent, EligiblePool, ShortfallPolicy};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, instrument, warn};

/// Parameters of a single draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRequest {
    pub campaign_id: String,
    pub seed: String,
    pub winners: usize,
    pub shortfall: ShortfallPolicy,
}

impl DrawRequest {
    pub fn new(campaign_id: impl Into<String>, seed: impl Into<String>, winners: usize) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            seed: seed.into(),
            winners,
            shortfall: ShortfallPolicy::default(),
        }
    }

    pub fn with_shortfall(mut self, shortfall: ShortfallPolicy) -> Self {
        self.shortfall = shortfall;
        self
    }
}

/// Runs draws against a [`TicketStore`].
///
/// A draw reads the available pool, selects winners, and commits the
/// assignments with the draw event in one store call. At most one draw per
/// campaign runs at a time; a concurrent attempt fails with
/// [`StoreError::DrawInProgress`] instead of waiting.
pub struct DrawService {
    store: Arc<dyn TicketStore>,
    in_flight: Mutex<HashSet<String>>,
}

impl DrawService {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn TicketStore> {
        &self.store
    }

    /// Run a draw and commit its result.
    #[instrument(skip(self, request), fields(campaign = %request.campaign_id))]
    pub async fn run_draw(&self, request: &DrawRequest) -> Result<DrawEvent, StoreError> {
        let _guard = self.lock_campaign(&request.campaign_id)?;

        let tickets = self.store.available_tickets(&request.campaign_id).await?;
        let pool = EligiblePool::from_tickets(&tickets)?;
        let selection = draw(&request.seed, &pool, request.winners, request.shortfall)?;

        if !selection.is_complete() {
            warn!(
                requested = selection.requested,
                drawn = selection.winners.len(),
                "pool smaller than requested winner count"
            );
        }

        let sequence = self.store.next_sequence(&request.campaign_id).await?;
        let event = DrawEvent::new(
            &request.campaign_id,
            sequence,
            &request.seed,
            pool,
            selection,
            Utc::now(),
        );

        self.store.commit_draw(&event).await?;

        info!(
            sequence,
            winners = event.winners.len(),
            digest = %event.digest,
            "draw committed"
        );
        Ok(event)
    }

    fn lock_campaign(&self, campaign_id: &str) -> Result<CampaignGuard<'_>, StoreError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(campaign_id.to_string()) {
            warn!(campaign = campaign_id, "rejected concurrent draw");
            return Err(StoreError::draw_in_progress(campaign_id));
        }

        Ok(CampaignGuard {
            in_flight: &self.in_flight,
            campaign_id: campaign_id.to_string(),
        })
    }
}

/// Releases a campaign when the draw finishes, on success or failure.
struct CampaignGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    campaign_id: String,
}

impl Drop for CampaignGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.campaign_id);
    }
}
