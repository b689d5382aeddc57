//! Proptest strategies for valid datasets, and sanity checks on the
//! brute-force oracle itself.
//!
//! A generated dataset honors the input contract the engine depends on:
//! features within a vector are strictly increasing (a `BTreeSet` can't do
//! otherwise), vectors are sorted by size, and ids are unique. The feature
//! *order* doubles as the global consistent order — the engine's correctness
//! never depends on it being a true rarity order, only on consistency, so
//! ascending ids are as good as frequency-sorted ones here.

use proptest::prelude::*;

use crate::common::cosine;

/// Datasets of up to `max_vectors` vectors over feature ids `0..universe`.
/// A small universe forces overlap, which is what makes pairs appear.
pub fn dataset_strategy(
    max_vectors: usize,
    universe: u32,
) -> impl Strategy<Value = Vec<(u32, Vec<u32>)>> {
    prop::collection::vec(
        prop::collection::btree_set(0..universe, 0..12),
        0..max_vectors,
    )
    .prop_map(|sets| {
        let mut vectors: Vec<Vec<u32>> = sets
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect();
        vectors.sort_by_key(|v| v.len());
        vectors
            .into_iter()
            .enumerate()
            .map(|(i, features)| (i as u32 + 1, features))
            .collect()
    })
}

/// Thresholds away from 0 (where "similar" stops meaning anything) but
/// covering the interesting range including exactly 1.0.
pub fn threshold_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        (0.05f64..1.0),
        Just(0.5),
        Just(1.0),
    ]
}

#[test]
fn oracle_cosine_on_known_values() {
    // The mixed-size worked example: 2/sqrt(6), 2/sqrt(8), 3/sqrt(12).
    assert!((cosine(&[1, 2], &[1, 2, 3]) - 2.0 / 6.0f64.sqrt()).abs() < 1e-12);
    assert!((cosine(&[1, 2], &[1, 2, 3, 4]) - 2.0 / 8.0f64.sqrt()).abs() < 1e-12);
    assert!((cosine(&[1, 2, 3], &[1, 2, 3, 4]) - 3.0 / 12.0f64.sqrt()).abs() < 1e-12);
}

#[test]
fn oracle_cosine_identical_and_disjoint() {
    assert_eq!(cosine(&[1, 2, 3], &[1, 2, 3]), 1.0);
    assert_eq!(cosine(&[1, 2, 3], &[4, 5, 6]), 0.0);
    assert_eq!(cosine(&[], &[1, 2]), 0.0);
    assert_eq!(cosine(&[], &[]), 0.0);
}

proptest! {
    /// The strategy must uphold the dataset contract it promises.
    #[test]
    fn generated_datasets_satisfy_the_input_contract(
        records in dataset_strategy(12, 30),
    ) {
        for window in records.windows(2) {
            prop_assert!(window[0].1.len() <= window[1].1.len());
        }
        for (_, features) in &records {
            for pair in features.windows(2) {
                prop_assert!(pair[0] < pair[1], "features must strictly increase");
            }
        }
        let mut ids: Vec<u32> = records.iter().map(|r| r.0).collect();
        ids.dedup();
        prop_assert_eq!(ids.len(), records.len());
    }

    /// Cosine is symmetric and bounded.
    #[test]
    fn oracle_cosine_symmetric_and_bounded(
        records in dataset_strategy(6, 20),
    ) {
        for (_, a) in &records {
            for (_, b) in &records {
                let ab = cosine(a, b);
                let ba = cosine(b, a);
                prop_assert!((ab - ba).abs() < 1e-12);
                prop_assert!((0.0..=1.0 + 1e-12).contains(&ab));
            }
        }
    }
}
