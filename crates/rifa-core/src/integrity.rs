//! Integrity digests binding a draw's seed, campaign and winners.
//!
//! The digest is SHA-256 over the raw bytes of the seed, then the campaign
//! id, then each winner code in draw order, with no separators. Changing the
//! feed order or inserting delimiters produces a different digest, so the
//! order here is part of the published format.

use sha2::{Digest, Sha256};

/// Length of a rendered digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// Compute the integrity digest for a draw.
///
/// # Example
/// ```
/// use rifa_core::integrity::compute_integrity_hash;
///
/// let digest = compute_integrity_hash("seed1", &["T001", "T002"], "camp2024");
/// assert_eq!(digest.len(), 64);
/// ```
pub fn compute_integrity_hash<S: AsRef<str>>(seed: &str, winners: &[S], campaign_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(campaign_id.as_bytes());
    for winner in winners {
        hasher.update(winner.as_ref().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Check a published digest against a recomputation.
///
/// Hex case is ignored; surrounding whitespace is not.
pub fn verify_integrity_hash<S: AsRef<str>>(
    seed: &str,
    winners: &[S],
    campaign_id: &str,
    digest: &str,
) -> bool {
    digest.len() == DIGEST_HEX_LEN
        && compute_integrity_hash(seed, winners, campaign_id).eq_ignore_ascii_case(digest)
}
