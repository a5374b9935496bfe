//! Seeded raffle draws with tamper-evident integrity digests.
//!
//! This crate holds the deterministic core of the raffle ("rifa") feature:
//! a seed-reproducible number stream, winner selection without replacement
//! over a pool of available tickets, and a SHA-256 digest that binds a draw's
//! seed, campaign and ordered winners so anyone can later check a published
//! result.
//!
//! # Key Features
//!
//! - **Deterministic**: Same seed and pool always produce identical winners
//! - **Portable**: Pure `u32` wrapping arithmetic, bit-identical everywhere
//! - **Auditable**: Draw events replay and verify from their own record
//!
//! # Quick Start
//!
//! ```rust
//! use rifa_core::{draw, compute_integrity_hash, EligiblePool, ShortfallPolicy};
//!
//! let pool = EligiblePool::new(["T001", "T002", "T003", "T004", "T005"]).unwrap();
//! let selection = draw("raffle-2024-final", &pool, 2, ShortfallPolicy::Reject).unwrap();
//!
//! let digest = compute_integrity_hash("raffle-2024-final", &selection.winners, "camp2024");
//! println!("winners {:?} digest {}", selection.winners, digest);
//! ```
//!
//! # Verification
//!
//! ```rust
//! use chrono::Utc;
//! use rifa_core::{draw, DrawEvent, EligiblePool, ShortfallPolicy};
//!
//! let pool = EligiblePool::new(["T001", "T002", "T003"]).unwrap();
//! let selection = draw("seed", &pool, 1, ShortfallPolicy::Reject).unwrap();
//! let event = DrawEvent::new("camp2024", 1, "seed", pool, selection, Utc::now());
//!
//! let published = event.publish(false);
//! assert!(published.verify(Some("seed")).unwrap().is_verified());
//! ```

pub mod error;
pub mod event;
pub mod integrity;
pub mod rng;
pub mod selection;
pub mod ticket;

// Re-export main types for convenience
pub use error::RifaError;
pub use event::{verify_draw, DrawEvent, DrawRecord, PublishedDraw, Verification};
pub use integrity::{compute_integrity_hash, verify_integrity_hash};
pub use rng::SeededGenerator;
pub use selection::{draw, select_winners, EligiblePool, Selection, ShortfallPolicy};
pub use ticket::{Ticket, TicketStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end() {
        let seed = "raffle-2024-final";
        let pool = EligiblePool::new(["T001", "T002", "T003", "T004", "T005"]).unwrap();

        let selection = draw(seed, &pool, 2, ShortfallPolicy::Reject).unwrap();
        assert_eq!(selection.winners, vec!["T002", "T001"]);

        let digest = compute_integrity_hash(seed, &selection.winners, "camp2024");
        assert_eq!(
            digest,
            "94a3de6d2a2b423edda879d5c3f2cf871884ee986ea1394b0855cc17024007c8"
        );
    }

    #[test]
    fn test_redraw_excludes_previous_winners() {
        let seed = "raffle-2024-final";
        let pool = EligiblePool::new(["T001", "T002", "T003", "T004", "T005"]).unwrap();
        let first = draw(seed, &pool, 2, ShortfallPolicy::Reject).unwrap();

        let remaining = EligiblePool::new(
            pool.codes()
                .iter()
                .filter(|code| !first.winners.contains(code))
                .cloned(),
        )
        .unwrap();
        let second = draw(seed, &remaining, 2, ShortfallPolicy::Reject).unwrap();

        assert_eq!(second.winners, vec!["T004", "T003"]);
    }
}
