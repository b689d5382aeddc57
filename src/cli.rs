// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the simpair command line.
//!
//! One job, two positional arguments: a similarity threshold and a dataset
//! path. The optional knobs mirror the engine's constructor — a feature-id
//! sizing hint and the per-pass RAM budget — with defaults sized for
//! web-scale document corpora.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "simpair",
    about = "Report all pairs of input vectors with cosine similarity >= threshold",
    version
)]
pub struct Cli {
    /// Cosine similarity threshold, in (0.0, 1.0]
    pub threshold: f64,

    /// Path to the dataset in apriori binary format
    pub dataset: PathBuf,

    /// Largest feature id expected in the dataset (sizing hint; the index
    /// grows past it on demand)
    #[arg(long, default_value_t = 600_000)]
    pub max_feature_id: u32,

    /// Maximum number of features held in RAM per pass; smaller budgets
    /// trade extra passes over the input for less memory
    #[arg(long, default_value_t = 120_000_000)]
    pub ram_budget: u64,

    /// Suppress the progress spinner on stderr
    #[arg(long)]
    pub quiet: bool,
}
