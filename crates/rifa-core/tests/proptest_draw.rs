//! Property-based tests for the seeded generator and the draw
//!
//! These tests use proptest to generate seeds and ticket pools and verify that:
//! 1. The generator is deterministic and stays in [0, 1)
//! 2. Draws never repeat a winner and only pick pooled tickets
//! 3. Oversized requests surface an explicit insufficient-pool error
//! 4. Digests are order sensitive

use proptest::prelude::*;
use rifa_core::{
    compute_integrity_hash, draw, DrawEvent, EligiblePool, RifaError, SeededGenerator,
    ShortfallPolicy,
};
use std::collections::HashSet;

/// Strategy for a pool of unique ticket codes
fn arb_pool() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("T[0-9]{1,4}", 1..60).prop_map(|codes| codes.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the same seed yields the same 10,000 values
    #[test]
    fn prop_generator_deterministic(seed in ".*") {
        let first: Vec<u64> = SeededGenerator::new(&seed).take(10_000).map(f64::to_bits).collect();
        let second: Vec<u64> = SeededGenerator::new(&seed).take(10_000).map(f64::to_bits).collect();
        prop_assert_eq!(first, second);
    }

    /// Property: every value lies in [0, 1)
    #[test]
    fn prop_generator_range(seed in ".*") {
        for value in SeededGenerator::new(&seed).take(10_000) {
            prop_assert!((0.0..1.0).contains(&value), "out of range: {}", value);
        }
    }

    /// Property: k <= N yields exactly k distinct winners from the pool
    #[test]
    fn prop_no_duplicate_winners(seed in ".*", codes in arb_pool(), k_seed in any::<usize>()) {
        let pool = EligiblePool::new(codes.clone()).unwrap();
        let k = 1 + k_seed % pool.len();

        let selection = draw(&seed, &pool, k, ShortfallPolicy::Reject).unwrap();
        prop_assert_eq!(selection.winners.len(), k);

        let unique: HashSet<&String> = selection.winners.iter().collect();
        prop_assert_eq!(unique.len(), k);
        for winner in &selection.winners {
            prop_assert!(codes.contains(winner));
        }
    }

    /// Property: k > N is reported, never silently truncated
    #[test]
    fn prop_exhaustion_reported(seed in ".*", codes in arb_pool(), extra in 1usize..10) {
        let pool = EligiblePool::new(codes).unwrap();
        let requested = pool.len() + extra;

        let err = draw(&seed, &pool, requested, ShortfallPolicy::Reject).unwrap_err();
        prop_assert_eq!(err, RifaError::insufficient_pool(requested, pool.len()));
    }

    /// Property: input order of the pool never changes the result
    #[test]
    fn prop_pool_order_irrelevant(seed in ".*", codes in arb_pool()) {
        let mut reversed = codes.clone();
        reversed.reverse();

        let a = draw(&seed, &EligiblePool::new(codes).unwrap(), 1, ShortfallPolicy::Reject).unwrap();
        let b = draw(&seed, &EligiblePool::new(reversed).unwrap(), 1, ShortfallPolicy::Reject).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Property: swapping two distinct winners changes the digest
    #[test]
    fn prop_digest_order_sensitive(
        seed in ".*",
        a in "T[0-9]{3}",
        b in "T[0-9]{3}",
        campaign in "[a-z0-9]{1,12}"
    ) {
        prop_assume!(a != b);
        let forward = compute_integrity_hash(&seed, &[a.as_str(), b.as_str()], &campaign);
        let reversed = compute_integrity_hash(&seed, &[b.as_str(), a.as_str()], &campaign);
        prop_assert_ne!(forward, reversed);
    }

    /// Property: every recorded draw verifies against itself
    #[test]
    fn prop_recorded_draw_verifies(seed in ".*", codes in arb_pool()) {
        let pool = EligiblePool::new(codes).unwrap();
        let k = pool.len().min(3);
        let selection = draw(&seed, &pool, k, ShortfallPolicy::Reject).unwrap();
        let event = DrawEvent::new("camp", 1, seed, pool, selection, chrono::Utc::now());

        prop_assert!(event.verify().unwrap().is_verified());
    }
}
