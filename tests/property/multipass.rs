//! RAM-budget invariance: the multi-pass loop is pure mechanism.
//!
//! Shrinking the budget changes how many passes the driver makes and how
//! often the file is re-read — it must never change the emitted pair set.
//! Budgets down to a single feature force a pass per vector, which is the
//! harshest exercise the resume/seek path gets.

use proptest::prelude::*;

use crate::common::{assert_same_pairs, brute_force_pairs, collect_pairs, pair_set};
use crate::oracles::{dataset_strategy, threshold_strategy};

const UNIVERSE: u32 = 24;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Any budget, same answer — including budgets forcing 2, 3, or a pass
    /// per vector.
    #[test]
    fn pair_set_is_budget_invariant(
        records in dataset_strategy(12, UNIVERSE),
        threshold in threshold_strategy(),
    ) {
        let expected = brute_force_pairs(threshold, &records);
        for budget in [1u64, 4, 16, 64, u64::MAX] {
            let (pairs, _) = collect_pairs(threshold, UNIVERSE, budget, &records);
            assert_same_pairs(&pair_set(&pairs), &expected);
        }
    }

    /// Tighter budgets never make fewer passes, and the unbounded budget
    /// needs exactly one.
    #[test]
    fn passes_grow_as_the_budget_shrinks(
        records in dataset_strategy(12, UNIVERSE),
        threshold in threshold_strategy(),
    ) {
        let (_, unbounded) = collect_pairs(threshold, UNIVERSE, u64::MAX, &records);
        prop_assert_eq!(unbounded.passes, 1);

        let (_, tight) = collect_pairs(threshold, UNIVERSE, 4, &records);
        let (_, tighter) = collect_pairs(threshold, UNIVERSE, 1, &records);
        prop_assert!(tight.passes >= unbounded.passes);
        prop_assert!(tighter.passes >= tight.passes);
    }

    /// Stats that don't depend on pass structure are budget-invariant too.
    #[test]
    fn pair_count_matches_across_budgets(
        records in dataset_strategy(12, UNIVERSE),
        threshold in threshold_strategy(),
    ) {
        let (pairs_a, stats_a) = collect_pairs(threshold, UNIVERSE, u64::MAX, &records);
        let (pairs_b, stats_b) = collect_pairs(threshold, UNIVERSE, 2, &records);
        prop_assert_eq!(stats_a.similar_pairs, pairs_a.len() as u64);
        prop_assert_eq!(stats_b.similar_pairs, pairs_b.len() as u64);
        prop_assert_eq!(stats_a.similar_pairs, stats_b.similar_pairs);
    }
}
