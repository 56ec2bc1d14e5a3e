//! Line scanning and per-source record production.
//!
//! # Overview
//!
//! [`LineScanner`] splits any [`BufRead`] into numbered lines without
//! assuming UTF-8. [`SourceReader`] drives one scanner for one source,
//! normalizes every line and hands the resulting [`RawRecord`]s to the
//! aggregator over a channel.
//!
//! Line splitting rules:
//! - `\n` terminates a line and a single `\r` before it is dropped
//! - a final line without terminator is still a line
//! - a trailing terminator does not produce an extra empty line
//! - line numbers start at 1 for every source

use std::io::{self, BufRead};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;

use super::{KeyNormalizer, RawRecord, SourceError, SourceId};
use crate::progress::ProgressCallback;

/// How many lines are read between progress notifications.
pub const LINES_PER_PROGRESS_TICK: u64 = 4096;

/// Errors produced while splitting a stream into lines.
#[derive(thiserror::Error, Debug)]
pub enum LineError {
    /// The underlying reader failed.
    #[error("I/O error after line {line}: {source}")]
    Io {
        /// Last line successfully read
        line: u64,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A line exceeded the configured maximum length.
    #[error("Line {line} is {length} bytes, over the {max} byte limit")]
    TooLong {
        /// Offending line number
        line: u64,
        /// Length of the line in bytes
        length: usize,
        /// Configured maximum
        max: usize,
    },
}

/// Splits a buffered reader into 1-based numbered lines.
///
/// The line buffer is reused between calls, so the returned slice is only
/// valid until the next call to [`LineScanner::next_line`].
#[derive(Debug)]
pub struct LineScanner<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: u64,
    bytes_read: u64,
    max_line_length: Option<usize>,
}

impl<R: BufRead> LineScanner<R> {
    /// Create a scanner with no line length limit.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            bytes_read: 0,
            max_line_length: None,
        }
    }

    /// Reject lines longer than `max` bytes (terminator excluded).
    #[must_use]
    pub fn with_max_line_length(mut self, max: Option<usize>) -> Self {
        self.max_line_length = max;
        self
    }

    /// Read the next line.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Io`] if the reader fails and
    /// [`LineError::TooLong`] if the line exceeds the configured maximum.
    pub fn next_line(&mut self) -> Result<Option<(u64, &[u8])>, LineError> {
        self.buf.clear();
        let n = match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(n) => n,
            Err(source) => {
                return Err(LineError::Io {
                    line: self.line_number,
                    source,
                })
            }
        };
        if n == 0 {
            return Ok(None);
        }

        self.bytes_read += n as u64;
        self.line_number += 1;

        let mut line = self.buf.as_slice();
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest;
        }
        if let Some(rest) = line.strip_suffix(b"\r") {
            line = rest;
        }

        if let Some(max) = self.max_line_length {
            if line.len() > max {
                return Err(LineError::TooLong {
                    line: self.line_number,
                    length: line.len(),
                    max,
                });
            }
        }

        Ok(Some((self.line_number, line)))
    }

    /// Number of lines returned so far.
    #[must_use]
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Number of bytes consumed so far, terminators included.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

/// Result of reading one source to completion.
#[derive(Debug, Default)]
pub struct SourceOutcome {
    /// Position of the source in the run's source list
    pub index: usize,
    /// Lines consumed from the source
    pub lines_read: u64,
    /// Bytes consumed
    pub bytes_read: u64,
    /// Why reading stopped early, if it did
    pub error: Option<SourceError>,
}

impl SourceOutcome {
    /// Whether the source was read to the end.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Reads one source and emits a [`RawRecord`] per line.
///
/// Readers are producers only: they never touch the aggregation state. A
/// reader that cannot open its source reports the failure in its
/// [`SourceOutcome`] and emits nothing; other sources are unaffected.
pub struct SourceReader<'a> {
    index: usize,
    id: &'a SourceId,
    normalizer: &'a KeyNormalizer,
    max_line_length: Option<usize>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl<'a> SourceReader<'a> {
    /// Create a reader for the source at `index` in the run's source list.
    #[must_use]
    pub fn new(index: usize, id: &'a SourceId, normalizer: &'a KeyNormalizer) -> Self {
        Self {
            index,
            id,
            normalizer,
            max_line_length: None,
            progress: None,
        }
    }

    /// Reject lines longer than `max` bytes.
    #[must_use]
    pub fn with_max_line_length(mut self, max: Option<usize>) -> Self {
        self.max_line_length = max;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Option<Arc<dyn ProgressCallback>>) -> Self {
        self.progress = callback;
        self
    }

    /// Open the source and read it to the end.
    ///
    /// The source handle is released before this returns, on every path.
    pub fn run(&self, sender: &SyncSender<RawRecord>) -> SourceOutcome {
        if let Some(ref callback) = self.progress {
            callback.on_source_start(self.index, self.id);
        }

        let outcome = match self.id.open() {
            Ok(reader) => self.scan(reader, sender),
            Err(e) => {
                log::warn!("{}, skipping it", e);
                SourceOutcome {
                    index: self.index,
                    error: Some(e),
                    ..Default::default()
                }
            }
        };

        self.finish(outcome)
    }

    /// Read an already opened source to the end.
    pub fn read_from<R: BufRead>(&self, reader: R, sender: &SyncSender<RawRecord>) -> SourceOutcome {
        if let Some(ref callback) = self.progress {
            callback.on_source_start(self.index, self.id);
        }
        let outcome = self.scan(reader, sender);
        self.finish(outcome)
    }

    fn scan<R: BufRead>(&self, reader: R, sender: &SyncSender<RawRecord>) -> SourceOutcome {
        log::debug!("Reading {}", self.id);

        let mut scanner = LineScanner::new(reader).with_max_line_length(self.max_line_length);
        let mut error = None;

        loop {
            match scanner.next_line() {
                Ok(Some((line, text))) => {
                    let record = RawRecord {
                        key: self.normalizer.normalize(text),
                        source: self.index,
                        line,
                    };
                    if sender.send(record).is_err() {
                        log::debug!("Aggregator gone, stopping {}", self.id);
                        break;
                    }
                    if line % LINES_PER_PROGRESS_TICK == 0 {
                        if let Some(ref callback) = self.progress {
                            callback.on_lines(self.index, line);
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let e = SourceError::from_line_error(self.id, e);
                    log::warn!("{}, keeping the lines read so far", e);
                    error = Some(e);
                    break;
                }
            }
        }

        SourceOutcome {
            index: self.index,
            lines_read: scanner.line_number(),
            bytes_read: scanner.bytes_read(),
            error,
        }
    }

    fn finish(&self, outcome: SourceOutcome) -> SourceOutcome {
        log::debug!(
            "Finished {}: {} lines, {} bytes",
            self.id,
            outcome.lines_read,
            outcome.bytes_read
        );
        if let Some(ref callback) = self.progress {
            callback.on_source_end(self.index, outcome.lines_read, !outcome.is_complete());
        }
        outcome
    }
}
