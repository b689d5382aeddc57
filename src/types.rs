// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Core types shared across the engine.
//!
//! A sparse binary vector is just its sorted feature-id list; the weight of
//! every present feature is 1. Cosine similarity between two such vectors
//! reduces to `|A ∩ B| / sqrt(|A| * |B|)`, which is why the engine only ever
//! needs intersection counts and lengths.
//!
//! # Invariants
//!
//! - **VectorRecord**: `features` is strictly increasing in the dataset's
//!   global feature order and free of duplicates. This is a caller
//!   precondition on the input file, not something we re-validate per record.
//! - **VectorHandle**: valid only for the scan that created it. Handles are
//!   indices into an append-only arena, so they never dangle mid-scan, but a
//!   new scan starts the numbering over.

use std::fmt;

/// Conservative fudge subtracted from every threshold comparison so that
/// floating-point rounding can only let borderline pairs through, never drop
/// them. All comparisons in the crate must use this same constant.
pub const FUDGE_FACTOR: f64 = 1e-8;

/// Handle to a partial vector owned by the store.
///
/// Plain index into the store's arena. Copy-cheap, hashable, and stable for
/// the duration of one scan (the arena is append-only between clears).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VectorHandle(pub(crate) u32);

impl VectorHandle {
    /// Convert to usize for arena indexing.
    #[inline]
    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VectorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One input vector as decoded from the data source.
///
/// The driver owns a single `VectorRecord` and passes it back into
/// [`DataSource::next`](crate::DataSource::next) for every read, so the
/// feature buffer is reused instead of reallocated per record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VectorRecord {
    pub id: u32,
    pub features: Vec<u32>,
}

impl VectorRecord {
    /// Number of features in the vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True for the (legal) zero-feature vector.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Counters accumulated over one full run of the driver.
///
/// `candidates_considered` and `intersections` are the two knobs that tell
/// you whether the prefix filter is earning its keep: candidates is the size
/// of the pruned search space, intersections is how often the upper bound was
/// not tight enough to skip exact verification.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    /// Pairs at or above the similarity threshold.
    pub similar_pairs: u64,
    /// Candidate entries examined across all probes.
    pub candidates_considered: u64,
    /// Exact suffix intersections performed.
    pub intersections: u64,
    /// Dataset passes needed to stay within the RAM budget.
    pub passes: u32,
    /// Records decoded, counting re-reads in later passes.
    pub vectors_read: u64,
}
