//! Winner selection without replacement.
//!
//! The eligible pool is kept in canonical order (ascending ticket code). Each
//! round draws `index = floor(next() * remaining)` from the seeded generator,
//! removes the ticket at that index while preserving the order of the rest,
//! and appends it to the winners. Selection stops once the requested count is
//! reached or the pool is exhausted.

use crate::error::RifaError;
use crate::rng::SeededGenerator;
use crate::ticket::Ticket;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// What to do when more winners are requested than the pool holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Fail with [`RifaError::InsufficientPool`] and draw nothing.
    #[default]
    Reject,
    /// Draw the whole pool and report the shortfall on the result.
    AcceptFewer,
}

/// Snapshot of the tickets eligible for a draw, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligiblePool {
    codes: Vec<String>,
}

impl EligiblePool {
    /// Build a pool from ticket codes.
    ///
    /// Codes are sorted; a repeated code is an error rather than a second
    /// chance to win.
    pub fn new<I, S>(codes: I) -> Result<Self, RifaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut codes: Vec<String> = codes.into_iter().map(Into::into).collect();
        codes.sort();

        let mut seen = HashSet::with_capacity(codes.len());
        for code in &codes {
            if !seen.insert(code.as_str()) {
                return Err(RifaError::duplicate_ticket(code.clone()));
            }
        }

        Ok(Self { codes })
    }

    /// Build a pool from the `available` tickets in `tickets`.
    pub fn from_tickets<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Result<Self, RifaError> {
        Self::new(
            tickets
                .into_iter()
                .filter(|ticket| ticket.is_available())
                .map(|ticket| ticket.code.clone()),
        )
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn into_codes(self) -> Vec<String> {
        self.codes
    }
}

/// Outcome of a selection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Winner codes in draw order
    pub winners: Vec<String>,
    /// Number of winners requested
    pub requested: usize,
}

impl Selection {
    /// Requested winners that could not be drawn.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.winners.len())
    }

    pub fn is_complete(&self) -> bool {
        self.shortfall() == 0
    }
}

/// Select `requested` distinct winners from `pool` using `rng`.
pub fn select_winners(
    pool: &EligiblePool,
    requested: usize,
    policy: ShortfallPolicy,
    rng: &mut SeededGenerator,
) -> Result<Selection, RifaError> {
    if requested == 0 {
        return Err(RifaError::InvalidWinnerCount { requested });
    }
    if requested > pool.len() && policy == ShortfallPolicy::Reject {
        return Err(RifaError::insufficient_pool(requested, pool.len()));
    }

    let mut remaining = pool.codes.clone();
    let mut winners = Vec::with_capacity(requested.min(remaining.len()));

    while winners.len() < requested {
        let Some(index) = rng.next_index(remaining.len()) else {
            break;
        };
        winners.push(remaining.remove(index));
    }

    debug!(
        requested,
        pool_size = pool.len(),
        drawn = winners.len(),
        "selected winners"
    );

    Ok(Selection { winners, requested })
}

/// Run a full selection from a seed.
///
/// # Example
/// ```
/// use rifa_core::selection::{draw, EligiblePool, ShortfallPolicy};
///
/// let pool = EligiblePool::new(["T001", "T002", "T003", "T004", "T005"]).unwrap();
/// let selection = draw("raffle-2024-final", &pool, 2, ShortfallPolicy::Reject).unwrap();
/// assert_eq!(selection.winners, vec!["T002", "T001"]);
/// ```
pub fn draw(
    seed: &str,
    pool: &EligiblePool,
    requested: usize,
    policy: ShortfallPolicy,
) -> Result<Selection, RifaError> {
    let mut rng = SeededGenerator::new(seed);
    select_winners(pool, requested, policy, &mut rng)
}
