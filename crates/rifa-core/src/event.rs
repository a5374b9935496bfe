//! Draw events and their independent verification.
//!
//! A [`DrawEvent`] is the immutable record of one draw: the seed, the pool it
//! drew from, the ordered winners and the integrity digest. Re-running a
//! draw creates a new event with the next sequence number; existing events
//! are never edited.

use crate::error::RifaError;
use crate::integrity::{compute_integrity_hash, verify_integrity_hash};
use crate::selection::{draw, EligiblePool, Selection, ShortfallPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable record of a completed draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawEvent {
    pub id: Uuid,
    pub campaign_id: String,
    /// 1-based position of this draw within its campaign
    pub sequence: u32,
    pub seed: String,
    /// Eligible ticket codes at draw time, in canonical order
    pub eligible: Vec<String>,
    pub requested: usize,
    /// Winner codes in draw order
    pub winners: Vec<String>,
    pub digest: String,
    pub drawn_at: DateTime<Utc>,
}

impl DrawEvent {
    /// Record a selection, computing its integrity digest.
    pub fn new(
        campaign_id: impl Into<String>,
        sequence: u32,
        seed: impl Into<String>,
        pool: EligiblePool,
        selection: Selection,
        drawn_at: DateTime<Utc>,
    ) -> Self {
        let campaign_id = campaign_id.into();
        let seed = seed.into();
        let digest = compute_integrity_hash(&seed, &selection.winners, &campaign_id);

        Self {
            id: Uuid::new_v4(),
            campaign_id,
            sequence,
            seed,
            eligible: pool.into_codes(),
            requested: selection.requested,
            winners: selection.winners,
            digest,
            drawn_at,
        }
    }

    /// Requested winners the pool could not supply.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.winners.len())
    }

    /// Auditor-facing copy of this event.
    ///
    /// With `disclose_seed == false` the seed is withheld; the record can
    /// still be checked once the seed is published.
    pub fn publish(&self, disclose_seed: bool) -> PublishedDraw {
        PublishedDraw {
            id: self.id,
            campaign_id: self.campaign_id.clone(),
            sequence: self.sequence,
            seed: disclose_seed.then(|| self.seed.clone()),
            eligible: self.eligible.clone(),
            requested: self.requested,
            winners: self.winners.clone(),
            digest: self.digest.clone(),
            drawn_at: self.drawn_at,
        }
    }

    /// Replay this event and check it against its own record.
    pub fn verify(&self) -> Result<Verification, RifaError> {
        verify_draw(&DrawRecord {
            seed: &self.seed,
            campaign_id: &self.campaign_id,
            eligible: &self.eligible,
            requested: self.requested,
            winners: &self.winners,
            digest: &self.digest,
        })
    }
}

/// Published form of a draw event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedDraw {
    pub id: Uuid,
    pub campaign_id: String,
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    pub eligible: Vec<String>,
    pub requested: usize,
    pub winners: Vec<String>,
    pub digest: String,
    pub drawn_at: DateTime<Utc>,
}

impl PublishedDraw {
    /// Verify the record, using `seed` when the record withholds it.
    ///
    /// A seed disclosed on the record takes precedence over `seed`.
    pub fn verify(&self, seed: Option<&str>) -> Result<Verification, RifaError> {
        let Some(seed) = self.seed.as_deref().or(seed) else {
            return Ok(Verification::SeedWithheld);
        };

        verify_draw(&DrawRecord {
            seed,
            campaign_id: &self.campaign_id,
            eligible: &self.eligible,
            requested: self.requested,
            winners: &self.winners,
            digest: &self.digest,
        })
    }
}

/// Borrowed view of the fields needed to verify a draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawRecord<'a> {
    pub seed: &'a str,
    pub campaign_id: &'a str,
    pub eligible: &'a [String],
    pub requested: usize,
    pub winners: &'a [String],
    pub digest: &'a str,
}

/// Result of checking a recorded draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verification {
    /// Digest and winners both reproduce.
    Verified,
    /// The digest does not match the recorded winners.
    DigestMismatch { expected: String, recorded: String },
    /// Replaying the seed over the pool yields different winners.
    WinnersMismatch {
        expected: Vec<String>,
        recorded: Vec<String>,
    },
    /// No seed is available to replay the draw.
    SeedWithheld,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified)
    }
}

/// Check a recorded draw.
///
/// The digest is recomputed over the recorded winners first, then the
/// selection is replayed from the seed over the recorded pool.
pub fn verify_draw(record: &DrawRecord<'_>) -> Result<Verification, RifaError> {
    if !verify_integrity_hash(record.seed, record.winners, record.campaign_id, record.digest) {
        return Ok(Verification::DigestMismatch {
            expected: compute_integrity_hash(record.seed, record.winners, record.campaign_id),
            recorded: record.digest.to_string(),
        });
    }

    let pool = EligiblePool::new(record.eligible.iter().cloned())?;
    let replay = draw(record.seed, &pool, record.requested, ShortfallPolicy::AcceptFewer)?;

    if replay.winners != record.winners {
        return Ok(Verification::WinnersMismatch {
            expected: replay.winners,
            recorded: record.winners.to_vec(),
        });
    }

    Ok(Verification::Verified)
}
