// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The all-pairs similarity engine.
//!
//! Finds every pair of input vectors whose cosine similarity meets a
//! threshold t, without comparing every pair. Three ideas carry all the
//! weight:
//!
//! 1. **Prefix filtering.** An indexed vector of length n only puts its
//!    rarest `n - ⌊n·t⌋` features into the inverted index; the common tail is
//!    kept back as a suffix. Under the dataset's rarity order, two vectors
//!    that reach the threshold must collide on at least one indexed feature,
//!    so nothing is lost — but the hottest lists stay short.
//! 2. **Size pruning.** Vectors arrive shortest-first, so each inverted list
//!    is sorted by length. A probe of length n can't reach t against
//!    anything shorter than `⌊n·t²⌋ + 1`, and each list's start cursor
//!    slides past those entries exactly once per scan.
//! 3. **Upper-bound scoring.** A candidate's partial count plus its suffix
//!    length bounds the true overlap from above. Most candidates die on that
//!    bound; only the survivors pay for an exact suffix intersection.
//!
//! The driver wraps this in a multi-pass loop so datasets larger than the
//! RAM budget still get exact results: each pass indexes a contiguous block
//! of the file and matches everything after it, and the next pass resumes
//! where indexing stopped.
//!
//! Matching always happens before indexing, so a probe only ever sees
//! vectors read before it — each unordered pair is considered exactly once,
//! and a vector never pairs with itself.
//!
//! All threshold comparisons subtract [`FUDGE_FACTOR`] so rounding can only
//! admit borderline pairs, never drop them.

use std::collections::HashMap;

use indicatif::ProgressBar;

use crate::index::InvertedIndex;
use crate::source::{DataSource, SourceError};
use crate::store::PartialVectorStore;
use crate::types::{ScanStats, VectorHandle, VectorRecord, FUDGE_FACTOR};

/// Number of trailing features to hold back from the index for a vector of
/// length `n`: `⌊n·t − ε⌋`, clamped at zero.
///
/// The fudge matters here: at `n·t` exactly integral the suffix shrinks by
/// one, which is what keeps a threshold-exact pair reachable through the
/// index (its shared feature could otherwise hide in both suffixes).
#[inline]
fn unindexed_count(n: usize, threshold: f64) -> usize {
    // `as` truncates and saturates negative values to 0, which handles n = 0.
    (n as f64 * threshold - FUDGE_FACTOR) as usize
}

/// Smallest `original_size` a previously indexed vector can have and still
/// reach the threshold against a probe of length `n`: `⌊n·t² − ε⌋ + 1`.
///
/// Follows from `cos ≤ √(m/n)` for m ≤ n: anything shorter than `n·t²` is
/// hopeless no matter how much it overlaps.
#[inline]
fn min_matchable_size(n: usize, threshold_sq: f64) -> u32 {
    (n as f64 * threshold_sq - FUDGE_FACTOR) as u32 + 1
}

/// First probe position at which discovering a *new* candidate is pointless:
/// `n − ⌊n·t² − ε⌋`.
///
/// A candidate first seen at position j or later can share at most the
/// probe's remaining `n − j` features, and past this cutoff that is below
/// every overlap that could reach the threshold. Existing candidates still
/// get their counts updated.
///
/// Tied to [`min_matchable_size`] by `cutoff = n − (min_prev − 1)`: a
/// qualifying pair shares at least `min_prev` features, so its first shared
/// feature sits at probe position `n − min_prev` or earlier, which this
/// cutoff keeps eligible. The superficially tidier `⌊n − n·t² − ε⌋ + 1` is
/// one smaller when `n·t²` is integral and silently drops threshold-exact
/// pairs (e.g. `[a,b,c,d]` vs `[d]` at t = 0.5).
#[inline]
fn new_candidate_cutoff(n: usize, threshold_sq: f64) -> usize {
    n - (n as f64 * threshold_sq - FUDGE_FACTOR) as usize
}

/// Set a probe-membership bit for every feature of `probe`, growing the mask
/// on demand. The caller must clear the same bits before the next probe.
fn set_probe_mask(mask: &mut Vec<bool>, probe: &[u32]) {
    for &feature in probe {
        let slot = feature as usize;
        if slot >= mask.len() {
            mask.resize(slot + 1, false);
        }
        mask[slot] = true;
    }
}

/// Exact all-pairs cosine similarity search over sparse binary vectors.
///
/// One instance owns all scan state (inverted index, partial-vector store,
/// candidate map, probe mask) and must not be shared between concurrent
/// callers. The engine is single-threaded by design; its throughput comes
/// from pruning, not parallelism.
///
/// ```no_run
/// use simpair::{AllPairs, ApBinarySource};
///
/// let mut source = ApBinarySource::open("vectors.bin")?;
/// let mut engine = AllPairs::new(0.9, 600_000, 120_000_000);
/// let stats = engine.find_all_similar_pairs(&mut source, |a, b, score| {
///     println!("{},{},{}", a, b, score);
/// })?;
/// eprintln!("{} similar pairs", stats.similar_pairs);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct AllPairs {
    threshold: f64,
    threshold_sq: f64,
    /// Sizing hint for the inverted-list array and the probe mask. Not a
    /// hard limit; both grow when the data disagrees.
    max_feature_id: u32,
    /// Max features (indexed prefixes + suffixes) resident in one pass.
    ram_budget: u64,
    index: InvertedIndex,
    store: PartialVectorStore,
    /// Candidate handle -> partial overlap count. Reused across probes;
    /// `clear()` keeps the allocation.
    candidates: HashMap<VectorHandle, u32>,
    /// Probe-membership bits for suffix verification. All false between
    /// probes.
    probe_mask: Vec<bool>,
    stats: ScanStats,
    progress: Option<ProgressBar>,
}

impl AllPairs {
    /// Create an engine for the given similarity threshold.
    ///
    /// `threshold` must lie in (0.0, 1.0] — the CLI validates this before
    /// construction. `max_feature_id` sizes the inverted-list array and the
    /// verification mask up front; `ram_budget` caps the features indexed
    /// per pass (spilling to extra passes, never to wrong answers).
    pub fn new(threshold: f64, max_feature_id: u32, ram_budget: u64) -> Self {
        debug_assert!(
            threshold > 0.0 && threshold <= 1.0,
            "threshold {} outside (0, 1]",
            threshold
        );
        Self {
            threshold,
            threshold_sq: threshold * threshold,
            max_feature_id,
            ram_budget,
            index: InvertedIndex::new(),
            store: PartialVectorStore::new(),
            candidates: HashMap::new(),
            probe_mask: vec![false; max_feature_id as usize + 1],
            stats: ScanStats::default(),
            progress: None,
        }
    }

    /// Attach a progress bar; the driver ticks it per record and prints
    /// pass-boundary events through it.
    pub fn attach_progress(&mut self, bar: ProgressBar) {
        self.progress = Some(bar);
    }

    /// Counters from the last (or current) run.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Find all pairs at or above the threshold, emitting each through
    /// `on_pair(probe_id, candidate_id, score)` with the probe being the
    /// more recently read vector.
    ///
    /// Makes as many passes over `source` as the RAM budget requires. Pairs
    /// emitted before an error stay emitted; there is no recovery inside the
    /// engine.
    pub fn find_all_similar_pairs<S, F>(
        &mut self,
        source: &mut S,
        mut on_pair: F,
    ) -> Result<ScanStats, SourceError>
    where
        S: DataSource,
        F: FnMut(u32, u32, f64),
    {
        self.stats = ScanStats::default();
        let mut record = VectorRecord::default();
        let mut resume_offset: u64 = 0;

        loop {
            self.stats.passes += 1;
            self.init_scan(self.max_feature_id);
            source.seek(resume_offset)?;
            resume_offset = 0;
            let mut features_in_ram: u64 = 0;
            // Length of the last vector indexed this pass, set when the
            // budget trips.
            let mut longest_indexed = 0.0f64;

            while source.next(&mut record)? {
                self.stats.vectors_read += 1;
                if let Some(pb) = &self.progress {
                    pb.inc(1);
                }
                self.find_matches(record.id, &record.features, &mut on_pair);
                if resume_offset == 0 {
                    self.index_vector(record.id, &record.features);
                    features_in_ram += record.features.len() as u64;
                    if features_in_ram > self.ram_budget {
                        resume_offset = source.tell()?;
                        longest_indexed = record.features.len() as f64;
                        if let Some(pb) = &self.progress {
                            pb.println(format!(
                                "pass {}: halting indexing at vector id {}",
                                self.stats.passes, record.id
                            ));
                        }
                    }
                } else if (longest_indexed / record.features.len() as f64)
                    < self.threshold_sq - FUDGE_FACTOR
                {
                    // Everything from here on is so much longer than the
                    // indexed block that the length ratio alone caps the
                    // cosine below t. Later passes will index these vectors
                    // and match them among themselves.
                    if let Some(pb) = &self.progress {
                        pb.println(format!(
                            "pass {}: ending early, remaining vectors too long ({} features)",
                            self.stats.passes,
                            record.features.len()
                        ));
                    }
                    break;
                }
            }

            if resume_offset == 0 {
                break;
            }
        }

        self.release_scan_memory();
        Ok(self.stats)
    }

    /// Reset per-pass state. Capacity is retained where that helps the next
    /// pass (store arena, candidate map); inverted lists are rebuilt from
    /// the sizing hint.
    fn init_scan(&mut self, max_feature_id: u32) {
        self.index.clear_and_resize(max_feature_id);
        self.store.clear();
        self.candidates.clear();
    }

    /// Drop the big per-scan structures for real, not just their lengths.
    fn release_scan_memory(&mut self) {
        self.index = InvertedIndex::new();
        self.store = PartialVectorStore::new();
        self.candidates = HashMap::new();
    }

    /// Match one probe against everything indexed so far.
    fn find_matches<F>(&mut self, probe_id: u32, probe: &[u32], on_pair: &mut F)
    where
        F: FnMut(u32, u32, f64),
    {
        let threshold_sq = self.threshold_sq;
        let Self {
            index,
            store,
            candidates,
            probe_mask,
            stats,
            ..
        } = self;

        candidates.clear();
        let n = probe.len();
        let min_prev = min_matchable_size(n, threshold_sq);
        let cutoff = new_candidate_cutoff(n, threshold_sq);

        // Phase 1: accumulate partial counts through the inverted lists.
        for (j, &feature) in probe.iter().enumerate() {
            let Some(list) = index.list_mut(feature) else {
                continue;
            };
            // Slide past entries too short for this (and every later) probe.
            while list.start < list.entries.len()
                && store.original_size(list.entries[list.start]) < min_prev
            {
                list.start += 1;
            }
            if j < cutoff {
                for &handle in list.live() {
                    debug_assert_ne!(store.id(handle), probe_id, "probe found in index");
                    *candidates.entry(handle).or_insert(0) += 1;
                }
            } else {
                // Too late for new candidates to reach the threshold; only
                // finish the counts of ones we already have.
                for &handle in list.live() {
                    debug_assert_ne!(store.id(handle), probe_id, "probe found in index");
                    if let Some(count) = candidates.get_mut(&handle) {
                        *count += 1;
                    }
                }
            }
        }
        stats.candidates_considered += candidates.len() as u64;

        // Phase 2: score candidates, verifying against the suffix when the
        // upper bound is not tight.
        let nf = n as f64;
        let mut mask_set = false;
        for (&handle, &partial_count) in candidates.iter() {
            let suffix = store.suffix(handle);
            let denominator = nf * store.original_size(handle) as f64;
            let upper = (u64::from(partial_count) + suffix.len() as u64) as f64;
            let score_sq = upper * upper / denominator;
            if score_sq < threshold_sq - FUDGE_FACTOR {
                continue;
            }
            if suffix.is_empty() {
                // Every shared feature went through the index: the bound is
                // the exact score.
                stats.similar_pairs += 1;
                on_pair(probe_id, store.id(handle), score_sq.sqrt());
            } else {
                stats.intersections += 1;
                if !mask_set {
                    set_probe_mask(probe_mask, probe);
                    mask_set = true;
                }
                let shared = u64::from(partial_count)
                    + suffix
                        .iter()
                        .filter(|&&f| probe_mask.get(f as usize).is_some_and(|&set| set))
                        .count() as u64;
                let exact_sq = (shared * shared) as f64 / denominator;
                if exact_sq >= threshold_sq - FUDGE_FACTOR {
                    stats.similar_pairs += 1;
                    on_pair(probe_id, store.id(handle), exact_sq.sqrt());
                }
            }
        }
        if mask_set {
            // Leave the mask all-false for the next probe.
            for &feature in probe {
                probe_mask[feature as usize] = false;
            }
        }
    }

    /// Split a vector into indexed prefix and retained suffix, and add it to
    /// the scan state.
    fn index_vector(&mut self, id: u32, features: &[u32]) {
        let n = features.len();
        let keep_back = unindexed_count(n, self.threshold);
        let split = n - keep_back;
        let handle = self.store.push(id, n as u32, &features[split..]);
        for &feature in &features[..split] {
            self.index.append(feature, handle);
        }
    }
}
