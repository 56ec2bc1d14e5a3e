//! Scanner module for reading sources and normalizing lines.
//!
//! This module provides functionality for:
//! - Opening sources (files or standard input)
//! - Splitting a source into numbered lines
//! - Mapping each line to a fixed-cost comparison key
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`key`]: Line key normalization (verbatim or digest)
//! - [`reader`]: Line scanning and per-source record production
//!
//! # Example
//!
//! ```
//! use linedupe::scanner::{KeyNormalizer, LineScanner};
//! use std::io::Cursor;
//!
//! let normalizer = KeyNormalizer::default();
//! let mut scanner = LineScanner::new(Cursor::new("x\ny\nx\n"));
//!
//! let mut keys = Vec::new();
//! while let Some((line_number, line)) = scanner.next_line().unwrap() {
//!     keys.push((line_number, normalizer.normalize(line)));
//! }
//! assert_eq!(keys.len(), 3);
//! assert_eq!(keys[0].1, keys[2].1);
//! ```

pub mod key;
pub mod reader;

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

// Re-export main types
pub use key::{
    hash_to_hex, normalize, parse_digest_width, DigestWidth, HashAlgorithm, KeyConfig,
    KeyNormalizer, NormalizedKey, DEFAULT_LONG_LINE_THRESHOLD,
};
pub use reader::{LineError, LineScanner, SourceOutcome, SourceReader};

/// Command-line spelling of the standard input source.
pub const STDIN_SENTINEL: &str = "-";

/// Read buffer size for file sources.
const FILE_BUFFER_SIZE: usize = 64 * 1024;

/// One input stream scanned for duplicate lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// The process's standard input
    Stdin,
    /// A file on disk
    File(PathBuf),
}

impl SourceId {
    /// Build a source from a command-line argument.
    ///
    /// `-` denotes standard input; anything else is a file path.
    #[must_use]
    pub fn from_arg(arg: &str) -> Self {
        if arg == STDIN_SENTINEL {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    /// Build sources from a list of command-line arguments.
    ///
    /// An empty list means standard input only.
    #[must_use]
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Vec<Self> {
        if args.is_empty() {
            return vec![Self::Stdin];
        }
        args.iter().map(|a| Self::from_arg(a.as_ref())).collect()
    }

    /// Path of a file source.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdin => None,
            Self::File(path) => Some(path.as_path()),
        }
    }

    /// Open the source for buffered line reading.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Open`] if a file source cannot be opened.
    pub fn open(&self) -> Result<Box<dyn BufRead>, SourceError> {
        match self {
            Self::Stdin => Ok(Box::new(io::stdin().lock())),
            Self::File(path) => {
                let file = File::open(path).map_err(|source| SourceError::Open {
                    id: self.clone(),
                    source,
                })?;
                Ok(Box::new(BufReader::with_capacity(FILE_BUFFER_SIZE, file)))
            }
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Serialize for SourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A normalized line tagged with where it came from.
///
/// Produced by a [`SourceReader`], consumed once by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Comparison key of the line
    pub key: NormalizedKey,
    /// Position of the source in the run's source list
    pub source: usize,
    /// 1-based line number within the source
    pub line: u64,
}

/// Errors that can occur while reading a source.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// The source could not be opened.
    #[error("Failed to open {id}: {source}")]
    Open {
        /// Source that failed
        id: SourceId,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading failed part-way through the source.
    #[error("Read error in {id} after line {line}: {source}")]
    Read {
        /// Source that failed
        id: SourceId,
        /// Last line successfully read
        line: u64,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A line exceeded the configured maximum length.
    #[error("Line {line} of {id} is {length} bytes, over the {max} byte limit")]
    LineTooLong {
        /// Source that failed
        id: SourceId,
        /// Offending line number
        line: u64,
        /// Length of the line in bytes
        length: usize,
        /// Configured maximum
        max: usize,
    },
}

impl SourceError {
    /// The source this error belongs to.
    #[must_use]
    pub fn source_id(&self) -> &SourceId {
        match self {
            Self::Open { id, .. } | Self::Read { id, .. } | Self::LineTooLong { id, .. } => id,
        }
    }

    /// Whether the source could not be opened at all.
    #[must_use]
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub(crate) fn from_line_error(id: &SourceId, err: LineError) -> Self {
        match err {
            LineError::Io { line, source } => Self::Read {
                id: id.clone(),
                line,
                source,
            },
            LineError::TooLong { line, length, max } => Self::LineTooLong {
                id: id.clone(),
                line,
                length,
                max,
            },
        }
    }
}
