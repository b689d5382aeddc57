//! Differential testing: the engine against the O(N²) brute force.
//!
//! The pruning machinery (prefix split, size cursor, candidate cutoff,
//! upper-bound scoring) is all optimization; none of it may change the
//! answer. So the strongest test is also the simplest: compare the full
//! output against the obviously-correct quadratic reference on arbitrary
//! valid datasets. If they disagree, the oracle is right.

use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::common::{assert_same_pairs, brute_force_pairs, collect_pairs, pair_key, pair_set};
use crate::oracles::{dataset_strategy, threshold_strategy};

/// Feature universe used across these tests; small enough to force overlap.
const UNIVERSE: u32 = 24;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// The emitted pair set equals the brute-force pair set, scores included.
    #[test]
    fn engine_matches_brute_force(
        records in dataset_strategy(14, UNIVERSE),
        threshold in threshold_strategy(),
    ) {
        let (pairs, _) = collect_pairs(threshold, UNIVERSE, u64::MAX, &records);
        assert_same_pairs(&pair_set(&pairs), &brute_force_pairs(threshold, &records));
    }

    /// No unordered pair is ever emitted twice, and no vector pairs with
    /// itself. (`pair_set` panics on duplicates; self-pairs checked here.)
    #[test]
    fn no_self_pairs_and_no_duplicates(
        records in dataset_strategy(14, UNIVERSE),
        threshold in threshold_strategy(),
    ) {
        let (pairs, _) = collect_pairs(threshold, UNIVERSE, u64::MAX, &records);
        for &(a, b, _) in &pairs {
            prop_assert_ne!(a, b, "self-pair emitted");
        }
        pair_set(&pairs);
    }

    /// The probe id of every pair was read after the candidate id: pairs
    /// only ever point backward in the stream.
    #[test]
    fn probe_is_the_later_vector(
        records in dataset_strategy(14, UNIVERSE),
        threshold in threshold_strategy(),
    ) {
        let (pairs, _) = collect_pairs(threshold, UNIVERSE, u64::MAX, &records);
        let position = |id: u32| records.iter().position(|r| r.0 == id).unwrap();
        for &(probe, candidate, _) in &pairs {
            prop_assert!(position(probe) > position(candidate));
        }
    }

    /// Raising the threshold can only shrink the pair set.
    #[test]
    fn threshold_monotonicity(
        records in dataset_strategy(14, UNIVERSE),
        t_low in 0.05f64..0.9,
        delta in 0.0f64..0.5,
    ) {
        let t_high = (t_low + delta).min(1.0);
        let (low_pairs, _) = collect_pairs(t_low, UNIVERSE, u64::MAX, &records);
        let (high_pairs, _) = collect_pairs(t_high, UNIVERSE, u64::MAX, &records);

        let low_keys: BTreeSet<_> =
            low_pairs.iter().map(|&(a, b, _)| pair_key(a, b)).collect();
        for &(a, b, _) in &high_pairs {
            prop_assert!(
                low_keys.contains(&pair_key(a, b)),
                "pair {{{}, {}}} present at t={} but missing at t={}",
                a, b, t_high, t_low
            );
        }
    }

    /// Emitted scores actually clear the threshold (minus the shared fudge).
    #[test]
    fn emitted_scores_clear_the_threshold(
        records in dataset_strategy(14, UNIVERSE),
        threshold in threshold_strategy(),
    ) {
        let (pairs, _) = collect_pairs(threshold, UNIVERSE, u64::MAX, &records);
        for &(_, _, score) in &pairs {
            // Tiny slack on top of the fudge: scores round-trip through a
            // sqrt before we square them again here.
            prop_assert!(score * score >= threshold * threshold - simpair::FUDGE_FACTOR - 1e-12);
            prop_assert!(score <= 1.0 + 1e-9);
        }
    }

    /// A stingy sizing hint must not change the answer: the index and the
    /// probe mask both grow on demand past `max_feature_id`.
    #[test]
    fn undersized_feature_hint_is_harmless(
        records in dataset_strategy(14, UNIVERSE),
        threshold in threshold_strategy(),
        hint in 0u32..4,
    ) {
        let (pairs, _) = collect_pairs(threshold, hint, u64::MAX, &records);
        assert_same_pairs(&pair_set(&pairs), &brute_force_pairs(threshold, &records));
    }
}
