// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Exact all-pairs cosine similarity search over sparse binary vectors.
//!
//! Given a dataset of feature-set vectors and a threshold t in (0, 1], the
//! engine reports every pair whose cosine similarity is at least t — exactly,
//! not approximately — while reading the dataset as a stream and staying
//! inside a configurable RAM budget. The pruning machinery is the All-Pairs
//! inverted-index scheme: index only each vector's rarest features, bound
//! candidate scores from partial counts, and verify the few survivors.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐    ┌──────────────┐    ┌──────────────────────────┐
//! │ source.rs │───▶│  engine.rs   │───▶│  on_pair(a, b, score)    │
//! │ (records) │    │ (match+index │    │  callback / sink.rs      │
//! └───────────┘    │  multi-pass) │    └──────────────────────────┘
//!                  └──────┬───────┘
//!                    ┌────┴─────┐
//!              ┌─────▼───┐ ┌────▼─────┐
//!              │ index.rs│ │ store.rs │
//!              │ (lists) │ │ (arena)  │
//!              └─────────┘ └──────────┘
//! ```
//!
//! # Input contract
//!
//! The dataset must deliver vectors in non-decreasing size order, with each
//! vector's features strictly increasing in one consistent global order
//! (conventionally rarest-first — that's what makes the indexed prefixes
//! selective). The decoder enforces the size ordering and the wire format;
//! the feature ordering is a caller precondition the engine cannot check and
//! silently depends on.
//!
//! # Usage
//!
//! ```no_run
//! use simpair::{AllPairs, ApBinarySource};
//!
//! let mut source = ApBinarySource::open("dataset.bin")?;
//! let mut engine = AllPairs::new(0.9, 600_000, 120_000_000);
//! let stats = engine.find_all_similar_pairs(&mut source, |a, b, score| {
//!     println!("{},{},{}", a, b, score);
//! })?;
//! eprintln!("found {} similar pairs", stats.similar_pairs);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Module declarations
mod engine;
mod index;
mod sink;
mod source;
mod store;
mod types;

pub mod testing;

// Re-exports for public API
pub use engine::AllPairs;
pub use index::InvertedIndex;
pub use sink::PairWriter;
pub use source::{ApBinarySource, DataSource, SourceError, MAX_VECTOR_SIZE};
pub use store::PartialVectorStore;
pub use types::{ScanStats, VectorHandle, VectorRecord, FUDGE_FACTOR};
