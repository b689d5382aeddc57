// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! simpair CLI: stream a dataset, print every similar pair.
//!
//! ```bash
//! # All pairs with cosine >= 0.9, pairs on stdout, diagnostics on stderr
//! simpair 0.9 vectors.bin > pairs.csv
//!
//! # Bounded memory: spill to extra passes after 10M resident features
//! simpair 0.9 vectors.bin --ram-budget 10000000
//! ```
//!
//! Exit codes: 0 success, 1 bad invocation, 2 threshold out of range,
//! 3 input not openable, 4 engine failure (I/O, format, or stdout error).

use std::io::{self, BufWriter};
use std::process;
use std::time::{Duration, Instant};

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use simpair::{AllPairs, ApBinarySource, PairWriter};

mod cli;
use cli::Cli;

const EXIT_BAD_ARGS: i32 = 1;
const EXIT_BAD_THRESHOLD: i32 = 2;
const EXIT_OPEN_FAILED: i32 = 3;
const EXIT_ENGINE_FAILED: i32 = 4;

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => 0,
                // The threshold failed to parse as a float.
                ClapErrorKind::ValueValidation | ClapErrorKind::InvalidValue => {
                    EXIT_BAD_THRESHOLD
                }
                _ => EXIT_BAD_ARGS,
            };
            let _ = e.print();
            return code;
        }
    };

    if !(cli.threshold > 0.0 && cli.threshold <= 1.0) {
        eprintln!(
            "ERROR: threshold must be in (0.0, 1.0], got {}",
            cli.threshold
        );
        return EXIT_BAD_THRESHOLD;
    }

    let mut source = match ApBinarySource::open(&cli.dataset) {
        Ok(source) => source,
        Err(e) => {
            eprintln!(
                "ERROR: failed to open input file ({}): {}",
                cli.dataset.display(),
                e
            );
            return EXIT_OPEN_FAILED;
        }
    };

    eprintln!("; similarity threshold: {}", cli.threshold);

    let mut engine = AllPairs::new(cli.threshold, cli.max_feature_id, cli.ram_budget);
    // Keep a clone so the spinner can be cleared once the engine is done;
    // ProgressBar clones share the same underlying bar.
    let mut spinner = None;
    if !cli.quiet {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {pos} vectors {msg}")
                .expect("static template"),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        spinner = Some(bar.clone());
        engine.attach_progress(bar);
    }

    let started = Instant::now();
    let stdout = io::stdout();
    let mut writer = PairWriter::new(BufWriter::new(stdout.lock()));

    let result = engine.find_all_similar_pairs(&mut source, |a, b, score| {
        writer.write_pair(a, b, score)
    });
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return EXIT_ENGINE_FAILED;
        }
    };

    if let Err(e) = writer.finish() {
        eprintln!("ERROR: failed writing pairs to stdout: {}", e);
        return EXIT_ENGINE_FAILED;
    }

    let elapsed = started.elapsed();
    eprintln!("; found {} similar pairs", stats.similar_pairs);
    eprintln!("; candidates considered: {}", stats.candidates_considered);
    eprintln!("; vector intersections performed: {}", stats.intersections);
    eprintln!("; passes over the input: {}", stats.passes);
    eprintln!("; total running time: {:.2} seconds", elapsed.as_secs_f64());

    0
}
