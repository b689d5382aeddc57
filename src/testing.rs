// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Test utilities shared between unit, property, and integration tests.
//!
//! This module is always compiled but hidden from documentation. It provides
//! the canonical dataset encoder and engine-run helpers so the test suites
//! don't each grow their own slightly-different copy.

#![doc(hidden)]

use std::io::Cursor;

use crate::engine::AllPairs;
use crate::source::ApBinarySource;
use crate::types::ScanStats;

/// Encode records into the apriori binary wire format: for each record,
/// `id: u32le, size: u32le, features: size x u32le`.
///
/// Callers are responsible for the dataset contract (records in
/// non-decreasing size order, features sorted and duplicate-free) — the
/// encoder writes whatever it is given, which is exactly what the
/// format-error tests need.
pub fn encode_records(records: &[(u32, Vec<u32>)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (id, features) in records {
        bytes.extend(id.to_le_bytes());
        bytes.extend((features.len() as u32).to_le_bytes());
        for feature in features {
            bytes.extend(feature.to_le_bytes());
        }
    }
    bytes
}

/// An in-memory data source over the encoded form of `records`.
pub fn records_source(records: &[(u32, Vec<u32>)]) -> ApBinarySource<Cursor<Vec<u8>>> {
    ApBinarySource::new(Cursor::new(encode_records(records)))
}

/// Run the engine over `records` and collect every emitted pair.
pub fn collect_pairs(
    threshold: f64,
    max_feature_id: u32,
    ram_budget: u64,
    records: &[(u32, Vec<u32>)],
) -> (Vec<(u32, u32, f64)>, ScanStats) {
    let mut engine = AllPairs::new(threshold, max_feature_id, ram_budget);
    let mut source = records_source(records);
    let mut pairs = Vec::new();
    let stats = engine
        .find_all_similar_pairs(&mut source, |a, b, score| pairs.push((a, b, score)))
        .expect("in-memory source cannot fail");
    (pairs, stats)
}
