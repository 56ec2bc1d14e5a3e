//! JSON output formatter for detection results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "text": "x",
//!       "hashed": false,
//!       "count": 3,
//!       "locations": [
//!         { "source": "a.txt", "lines": [1, 3] },
//!         { "source": "b.txt", "lines": [1] }
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "mode": "multi",
//!     "sources": 2,
//!     "lines_read": 4,
//!     "duplicate_lines": 1,
//!     "exit_code": 0,
//!     "exit_code_name": "LD000"
//!   },
//!   "generated_at": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! For hashed keys `text` holds the hexadecimal digest and `algorithm` names
//! the hash. Sorted runs replace `locations` with `start_line` and `end_line`.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{OutputError, Report};
use crate::duplicates::{DuplicateLine, ScanSummary, SortedRun, SourceLines};
use crate::error::ExitCode;

/// A repeated key in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicate {
    /// The line, or the hex digest for hashed keys
    pub text: String,
    /// Whether `text` is a digest
    pub hashed: bool,
    /// Hash algorithm for hashed keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    /// Occurrences across all sources
    pub count: u64,
    /// Line numbers per source
    pub locations: Vec<SourceLines>,
}

impl JsonDuplicate {
    /// Create a JSON entry from a duplicate line.
    #[must_use]
    pub fn from_duplicate_line(line: &DuplicateLine) -> Self {
        Self {
            text: line.text().into_owned(),
            hashed: line.is_hashed(),
            algorithm: line.key.algorithm().map(|a| a.name().to_string()),
            count: line.count,
            locations: line.locations.clone(),
        }
    }
}

/// A sorted run in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRun {
    /// The repeated line
    pub text: String,
    /// Lines in the run
    pub count: u64,
    /// First line of the run
    pub start_line: u64,
    /// Last line of the run
    pub end_line: u64,
}

impl JsonRun {
    /// Create a JSON entry from a sorted run.
    #[must_use]
    pub fn from_sorted_run(run: &SortedRun) -> Self {
        Self {
            text: run.text().into_owned(),
            count: run.count,
            start_line: run.start_line,
            end_line: run.end_line,
        }
    }
}

/// Reported entries of either kind.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JsonEntries {
    /// Multi-source results
    Lines(Vec<JsonDuplicate>),
    /// Sorted-input results
    Runs(Vec<JsonRun>),
}

impl JsonEntries {
    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Lines(lines) => lines.len(),
            Self::Runs(runs) => runs.len(),
        }
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Detection path: "multi" or "sorted"
    pub mode: &'static str,
    /// Number of sources requested
    pub sources: usize,
    /// Number of sources that failed
    pub sources_failed: usize,
    /// Total lines read
    pub lines_read: u64,
    /// Total bytes read
    pub bytes_read: u64,
    /// Distinct keys (multi) or runs (sorted)
    pub distinct_keys: usize,
    /// Distinct keys that are digests
    pub hashed_keys: usize,
    /// Number of reported entries
    pub duplicate_lines: usize,
    /// Duration of the run in milliseconds
    pub duration_ms: u64,
    /// Messages for sources that failed
    pub errors: Vec<String>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "LD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, mode: &'static str, exit_code: ExitCode) -> Self {
        Self {
            mode,
            sources: summary.sources,
            sources_failed: summary.sources_failed,
            lines_read: summary.lines_read,
            bytes_read: summary.bytes_read,
            distinct_keys: summary.distinct_keys,
            hashed_keys: summary.hashed_keys,
            duplicate_lines: summary.duplicate_lines,
            duration_ms: summary.duration.as_millis() as u64,
            errors: summary.source_errors.iter().map(ToString::to_string).collect(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Reported entries
    pub duplicates: JsonEntries,
    /// Run summary
    pub summary: JsonSummary,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
}

impl JsonOutput {
    /// Create a JSON output from a report, its summary and the exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use linedupe::duplicates::ScanSummary;
    /// use linedupe::error::ExitCode;
    /// use linedupe::output::{JsonOutput, Report};
    ///
    /// let output = JsonOutput::new(Report::Lines(&[]), &ScanSummary::default(), ExitCode::NoDuplicates);
    /// assert!(output.duplicates.is_empty());
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(report: Report<'_>, summary: &ScanSummary, exit_code: ExitCode) -> Self {
        let duplicates = match report {
            Report::Lines(lines) => {
                JsonEntries::Lines(lines.iter().map(JsonDuplicate::from_duplicate_line).collect())
            }
            Report::Runs(runs) => JsonEntries::Runs(runs.iter().map(JsonRun::from_sorted_run).collect()),
        };
        Self {
            duplicates,
            summary: JsonSummary::from_scan_summary(summary, report.mode(), exit_code),
            generated_at: Utc::now(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), OutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
