//! Reported duplicate lines.
//!
//! # Overview
//!
//! This module holds the result types handed to callers once detection has
//! finished:
//! - [`DuplicateLine`]: a key seen more than the threshold across one or more
//!   sources, with every location per source
//! - [`SortedRun`]: a repeated line from pre-sorted input, described by the
//!   boundaries of its contiguous run
//!
//! The engine returns both in unspecified order. [`ReportOrder`] gives the
//! presentation orders used by the command line.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::aggregator::OccurrenceEntry;
use crate::scanner::{NormalizedKey, SourceId};

/// Line numbers at which a key occurs within one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLines {
    /// The source
    pub source: SourceId,
    /// 1-based line numbers in scan order
    pub lines: Vec<u64>,
}

/// A line that occurs more often than the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateLine {
    /// Comparison key (the line itself, or the digest of a long line)
    pub key: NormalizedKey,
    /// Number of occurrences across all sources
    pub count: u64,
    /// Occurrences per source, in source list order
    pub locations: Vec<SourceLines>,
}

impl DuplicateLine {
    /// Build a duplicate line from an aggregated entry.
    ///
    /// `sources` is the run's source list; entry locations index into it.
    #[must_use]
    pub fn from_entry(key: NormalizedKey, entry: OccurrenceEntry, sources: &[SourceId]) -> Self {
        let count = entry.count();
        let locations = entry
            .into_locations()
            .into_iter()
            .filter_map(|(index, lines)| {
                sources.get(index).map(|source| SourceLines {
                    source: source.clone(),
                    lines,
                })
            })
            .collect();
        Self {
            key,
            count,
            locations,
        }
    }

    /// Display text of the line (hex digest for hashed lines).
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        self.key.text()
    }

    /// Whether the key is a digest rather than the line itself.
    #[must_use]
    pub fn is_hashed(&self) -> bool {
        self.key.is_digest()
    }

    /// Total number of recorded locations. Always equal to `count`.
    #[must_use]
    pub fn location_count(&self) -> usize {
        self.locations.iter().map(|l| l.lines.len()).sum()
    }

    /// Line numbers recorded for one source.
    #[must_use]
    pub fn lines_in(&self, source: &SourceId) -> Option<&[u64]> {
        self.locations
            .iter()
            .find(|l| &l.source == source)
            .map(|l| l.lines.as_slice())
    }
}

/// A contiguous run of identical lines from sorted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedRun {
    /// The repeated line, without terminator
    pub line: Vec<u8>,
    /// Number of lines in the run
    pub count: u64,
    /// Line number of the first line in the run
    pub start_line: u64,
    /// Line number of the last line in the run
    pub end_line: u64,
}

impl SortedRun {
    /// The line as text (invalid UTF-8 replaced).
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.line)
    }
}

/// Presentation order for reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportOrder {
    /// Highest count first, ties by text
    #[default]
    Count,
    /// By text (or position for sorted runs)
    Text,
    /// Engine order (unspecified)
    None,
}

impl ReportOrder {
    /// Sort duplicate lines in place.
    pub fn sort_lines(self, lines: &mut [DuplicateLine]) {
        match self {
            Self::Count => lines.sort_by(|a, b| by_count(a.count, b.count).then(a.key.cmp(&b.key))),
            Self::Text => lines.sort_by(|a, b| a.key.cmp(&b.key)),
            Self::None => {}
        }
    }

    /// Sort runs in place.
    pub fn sort_runs(self, runs: &mut [SortedRun]) {
        match self {
            Self::Count => {
                runs.sort_by(|a, b| by_count(a.count, b.count).then(a.start_line.cmp(&b.start_line)))
            }
            Self::Text => runs.sort_by_key(|r| r.start_line),
            Self::None => {}
        }
    }
}

fn by_count(a: u64, b: u64) -> Ordering {
    b.cmp(&a)
}
