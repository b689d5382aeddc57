// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Default output sink: one CSV line per pair.
//!
//! The engine only knows about its `on_pair` callback; this adapter turns
//! that callback into `"{id_a},{id_b},{score}\n"` lines on any writer. The
//! callback signature has no error channel, so the writer latches the first
//! I/O failure, turns further writes into no-ops, and hands the error back
//! from [`finish`](PairWriter::finish) — pairs are cheap, losing the error
//! is not.

use std::io::{self, Write};

/// Writes similar pairs as CSV lines and counts them.
pub struct PairWriter<W: Write> {
    inner: W,
    pairs_written: u64,
    error: Option<io::Error>,
}

impl<W: Write> PairWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pairs_written: 0,
            error: None,
        }
    }

    /// Write one pair. Silently drops output after the first failure; the
    /// latched error surfaces from [`finish`](Self::finish).
    pub fn write_pair(&mut self, id_a: u32, id_b: u32, score: f64) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.inner, "{},{},{}", id_a, id_b, score) {
            self.error = Some(e);
            return;
        }
        self.pairs_written += 1;
    }

    /// Pairs successfully written so far.
    pub fn pairs_written(&self) -> u64 {
        self.pairs_written
    }

    /// Flush and return the pair count, or the first write/flush error.
    pub fn finish(mut self) -> io::Result<u64> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.inner.flush()?;
        Ok(self.pairs_written)
    }
}
