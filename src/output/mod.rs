//! Output formatters for detection results.
//!
//! This module renders results in three formats:
//! - Text for terminals and line-oriented tools
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! Formatters write entries in the order they are given. Callers that want a
//! stable order sort first with [`crate::duplicates::ReportOrder`].
//!
//! # Example
//!
//! ```no_run
//! use linedupe::duplicates::DuplicateFinder;
//! use linedupe::output::{Report, TextOutput};
//! use linedupe::scanner::SourceId;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let sources = SourceId::from_args(&["a.txt", "b.txt"]);
//! let (lines, _summary) = finder.find_duplicates(&sources).unwrap();
//!
//! TextOutput::new(Report::Lines(&lines))
//!     .write_to(&mut std::io::stdout())
//!     .unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::io;

use thiserror::Error;

use crate::duplicates::{DuplicateLine, SortedRun};

// Re-export main types
pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::text::TextOutput;

/// Results of either detection path.
#[derive(Debug, Clone, Copy)]
pub enum Report<'a> {
    /// Keys repeated across one or more sources
    Lines(&'a [DuplicateLine]),
    /// Runs from a single sorted source
    Runs(&'a [SortedRun]),
}

impl Report<'_> {
    /// Number of reported entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Lines(lines) => lines.len(),
            Self::Runs(runs) => runs.len(),
        }
    }

    /// Whether nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the detection path that produced the report.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Lines(_) => "multi",
            Self::Runs(_) => "sorted",
        }
    }
}

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O error during writing
    #[error("I/O error while writing report: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}
