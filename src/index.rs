// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The prefix-filtered inverted index.
//!
//! One list per feature id, holding handles to every indexed vector whose
//! *indexed prefix* contains that feature. Because input vectors arrive in
//! non-decreasing size order and we only ever append, each list is sorted by
//! `original_size` for free — no sort call anywhere.
//!
//! That ordering is what makes the `start` cursor work: when a probe of
//! length n arrives, every indexed vector shorter than `min_prev = ⌊n·t²⌋+1`
//! is too short to ever reach the threshold against this or any later probe.
//! The cursor slides forward past them once and never looks back. It is
//! reset only by [`clear_and_resize`](InvertedIndex::clear_and_resize) at
//! scan boundaries, not between probes — probe lengths are non-decreasing,
//! so the bound only tightens.
//!
//! # Invariants
//!
//! - **LIST_SIZE_SORTED**: within a list, `original_size` is non-decreasing
//!   in entry order.
//! - **START_IN_RANGE**: `start <= entries.len()` at all times.
//! - Every handle refers to a live store entry of the current scan.

use crate::types::VectorHandle;

/// Per-feature posting list with its size-pruning cursor.
#[derive(Debug, Default)]
pub struct InvertedList {
    /// Entries with index below `start` are known too short for every probe
    /// from here on.
    pub(crate) start: usize,
    pub(crate) entries: Vec<VectorHandle>,
}

impl InvertedList {
    /// The not-yet-pruned tail of the list.
    #[inline]
    pub(crate) fn live(&self) -> &[VectorHandle] {
        &self.entries[self.start..]
    }
}

/// Array of inverted lists indexed by feature id.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    lists: Vec<InvertedList>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to `max_feature_id` empty lists with their cursors at zero.
    /// The hint does not have to be exact; [`append`](Self::append) grows the
    /// array when an indexed vector surfaces a larger feature id.
    pub fn clear_and_resize(&mut self, max_feature_id: u32) {
        self.lists.clear();
        self.lists
            .resize_with(max_feature_id as usize, InvertedList::default);
    }

    /// Append a handle to the list for `feature`, growing the array on
    /// demand. Caller guarantees non-decreasing `original_size` across calls,
    /// which keeps LIST_SIZE_SORTED without sorting.
    pub fn append(&mut self, feature: u32, handle: VectorHandle) {
        let slot = feature as usize;
        if slot >= self.lists.len() {
            self.lists.resize_with(slot + 1, InvertedList::default);
        }
        self.lists[slot].entries.push(handle);
    }

    /// Mutable access to the list for `feature`, or `None` when the feature
    /// lies beyond the index — the probe loop treats that as an empty list.
    #[inline]
    pub(crate) fn list_mut(&mut self, feature: u32) -> Option<&mut InvertedList> {
        self.lists.get_mut(feature as usize)
    }

    /// Number of feature slots currently allocated.
    pub fn num_lists(&self) -> usize {
        self.lists.len()
    }

    /// Total entries across all lists. Diagnostic only.
    pub fn num_entries(&self) -> usize {
        self.lists.iter().map(|l| l.entries.len()).sum()
    }
}
