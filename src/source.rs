// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Record sources: where vectors come from.
//!
//! The engine never touches files directly. It drives a [`DataSource`], which
//! hands back one [`VectorRecord`] at a time and supports seeking back to a
//! previously-told byte offset — that is all the multi-pass driver needs.
//!
//! The default implementation decodes the "apriori binary" format: a flat
//! concatenation of `id: u32le, size: u32le, features: size x u32le` records.
//! No magic, no header, no checksum; the only framing is the size field, so
//! the decoder is paranoid about it. A size above [`MAX_VECTOR_SIZE`] is
//! treated as corruption rather than an instruction to allocate gigabytes.
//!
//! The format also carries two soft guarantees the engine relies on: records
//! appear in non-decreasing size order, and features within a record follow
//! the dataset's global rarity order. The first is cheap to check, so we do
//! (except right after a seek, where the previous size is unknown). The
//! second is not checkable without global statistics and is left as a caller
//! precondition.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::types::VectorRecord;

/// Hard ceiling on the size field of a record. Anything above this is
/// corruption, not data: it protects against runaway allocations when the
/// stream is garbage.
pub const MAX_VECTOR_SIZE: u32 = 99_999;

// ============================================================================
// ERRORS
// ============================================================================

/// Everything that can go wrong while pulling records from a source.
///
/// The format variants carry the offending vector id so the diagnostic points
/// at a concrete spot in a multi-gigabyte file.
#[derive(Debug)]
pub enum SourceError {
    /// Underlying read, seek, or tell failed.
    Io(io::Error),
    /// A whole id was read but the size field was cut short.
    TruncatedHeader { id: u32 },
    /// The feature array ended before `size` features were read.
    TruncatedFeatures { id: u32 },
    /// Input ended inside a vector id. A clean EOF lands exactly on a record
    /// boundary; anything else means the file was chopped.
    TrailingBytes,
    /// Size field above [`MAX_VECTOR_SIZE`].
    OversizedVector { id: u32, size: u32 },
    /// Record smaller than its predecessor while reading forward. The input
    /// contract requires non-decreasing sizes; a violation breaks the
    /// engine's length-sorted inverted lists.
    ShrinkingVector { id: u32, size: u32, previous: u32 },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(e) => write!(f, "dataset read error: {}", e),
            SourceError::TruncatedHeader { id } => {
                write!(f, "dataset format error: partial length for vector id {}", id)
            }
            SourceError::TruncatedFeatures { id } => write!(
                f,
                "dataset format error: input truncated while reading features of vector id {}",
                id
            ),
            SourceError::TrailingBytes => {
                write!(f, "dataset format error: partial vector id at end of input")
            }
            SourceError::OversizedVector { id, size } => write!(
                f,
                "dataset format error: size of vector id {} exceeds maximum: {}",
                id, size
            ),
            SourceError::ShrinkingVector { id, size, previous } => write!(
                f,
                "dataset format error: size of vector id {} is smaller than the preceding vector's: {} < {}",
                id, size, previous
            ),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SourceError {
    fn from(e: io::Error) -> Self {
        SourceError::Io(e)
    }
}

// ============================================================================
// TRAIT
// ============================================================================

/// A seekable stream of input vectors.
///
/// Contract required by the driver:
///
/// - `next` fills the caller-owned record (reusing its feature buffer) and
///   returns `Ok(false)` on a clean end of input.
/// - `tell` returns an offset that `seek` accepts later, landing on the same
///   record boundary.
/// - `seek` resets any internal size-monotonicity check, so the first record
///   after a seek is accepted regardless of its size; checking resumes from
///   that record onward.
pub trait DataSource {
    /// Decode the next record into `record`. `Ok(true)` on success,
    /// `Ok(false)` on clean EOF.
    fn next(&mut self, record: &mut VectorRecord) -> Result<bool, SourceError>;

    /// Reposition at a byte offset previously returned by [`tell`](Self::tell).
    fn seek(&mut self, offset: u64) -> Result<(), SourceError>;

    /// Current byte offset, valid for a later [`seek`](Self::seek).
    fn tell(&mut self) -> Result<u64, SourceError>;
}

// ============================================================================
// APRIORI BINARY DECODER
// ============================================================================

/// Outcome of trying to read one little-endian word.
enum WordRead {
    Word(u32),
    /// Zero bytes available: clean boundary.
    Eof,
    /// One to three bytes, then EOF: the stream is chopped mid-word.
    Partial,
}

/// Decoder for the "apriori binary" vector format over any `Read + Seek`.
///
/// Files go through [`ApBinarySource::open`], which wraps the file in a
/// `BufReader`; tests feed `io::Cursor<Vec<u8>>` directly.
pub struct ApBinarySource<R> {
    inner: R,
    /// Size of the previously decoded record; 0 after open or seek, which
    /// disables the monotonicity check for exactly one record.
    last_size: u32,
    /// Scratch for bulk feature reads, reused across records.
    byte_buf: Vec<u8>,
}

impl ApBinarySource<BufReader<File>> {
    /// Open a dataset file for decoding.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read + Seek> ApBinarySource<R> {
    /// Wrap an already-open stream. The stream position is taken as a record
    /// boundary.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            last_size: 0,
            byte_buf: Vec::new(),
        }
    }

    /// Read exactly one u32, distinguishing a clean boundary from a chopped
    /// stream. `read_exact` can't make that distinction, hence the loop.
    fn read_word(&mut self) -> io::Result<WordRead> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(match filled {
            0 => WordRead::Eof,
            4 => WordRead::Word(u32::from_le_bytes(buf)),
            _ => WordRead::Partial,
        })
    }
}

impl<R: Read + Seek> DataSource for ApBinarySource<R> {
    fn next(&mut self, record: &mut VectorRecord) -> Result<bool, SourceError> {
        let id = match self.read_word()? {
            WordRead::Word(id) => id,
            WordRead::Eof => return Ok(false),
            WordRead::Partial => return Err(SourceError::TrailingBytes),
        };

        let size = match self.read_word()? {
            WordRead::Word(size) => size,
            WordRead::Eof | WordRead::Partial => {
                return Err(SourceError::TruncatedHeader { id })
            }
        };
        if size > MAX_VECTOR_SIZE {
            return Err(SourceError::OversizedVector { id, size });
        }
        if size < self.last_size {
            return Err(SourceError::ShrinkingVector {
                id,
                size,
                previous: self.last_size,
            });
        }
        self.last_size = size;

        self.byte_buf.resize(size as usize * 4, 0);
        self.inner.read_exact(&mut self.byte_buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                SourceError::TruncatedFeatures { id }
            } else {
                SourceError::Io(e)
            }
        })?;

        record.id = id;
        record.features.clear();
        record.features.extend(
            self.byte_buf
                .chunks_exact(4)
                .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]])),
        );
        Ok(true)
    }

    fn seek(&mut self, offset: u64) -> Result<(), SourceError> {
        self.inner.seek(SeekFrom::Start(offset))?;
        // The first record after a seek has no predecessor to compare against.
        self.last_size = 0;
        Ok(())
    }

    fn tell(&mut self) -> Result<u64, SourceError> {
        Ok(self.inner.stream_position()?)
    }
}
