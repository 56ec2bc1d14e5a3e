//! CSV output formatter for detection results.
//!
//! Provides machine-readable CSV output for spreadsheets and data analysis.
//!
//! # Columns
//!
//! Multi-source reports have one row per occurrence:
//!
//! - `entry_id`: Numeric ID of the reported key (1-based, in report order)
//! - `count`: Total occurrences of the key
//! - `hashed`: Whether `text` is a digest
//! - `text`: The line, or its hex digest
//! - `source`: Source name (`stdin` for standard input)
//! - `line`: 1-based line number
//!
//! Sorted reports have one row per run: `count`, `text`, `start_line`,
//! `end_line`.

use std::io;

use serde::Serialize;

use super::{OutputError, Report};
use crate::duplicates::{DuplicateLine, SortedRun};

/// One occurrence of a multi-source entry.
#[derive(Debug, Serialize)]
struct OccurrenceRow<'a> {
    entry_id: usize,
    count: u64,
    hashed: bool,
    text: &'a str,
    source: String,
    line: u64,
}

/// One sorted run.
#[derive(Debug, Serialize)]
struct RunRow<'a> {
    count: u64,
    text: &'a str,
    start_line: u64,
    end_line: u64,
}

/// CSV output formatter.
#[derive(Debug, Clone, Copy)]
pub struct CsvOutput<'a> {
    report: Report<'a>,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(report: Report<'a>) -> Self {
        Self { report }
    }

    /// Write the CSV output to the given writer.
    ///
    /// A header row is written even when the report is empty.
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), OutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        match self.report {
            Report::Lines(lines) => {
                if lines.is_empty() {
                    csv_writer.write_record(["entry_id", "count", "hashed", "text", "source", "line"])?;
                }
                for (idx, line) in lines.iter().enumerate() {
                    write_occurrences(&mut csv_writer, idx + 1, line)?;
                }
            }
            Report::Runs(runs) => {
                if runs.is_empty() {
                    csv_writer.write_record(["count", "text", "start_line", "end_line"])?;
                }
                for run in runs {
                    write_run(&mut csv_writer, run)?;
                }
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if serialization fails.
    pub fn render(&self) -> Result<String, OutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn write_occurrences<W: io::Write>(
    csv_writer: &mut csv::Writer<W>,
    entry_id: usize,
    line: &DuplicateLine,
) -> Result<(), OutputError> {
    let text = line.text();
    for location in &line.locations {
        let source = location.source.to_string();
        for &number in &location.lines {
            csv_writer.serialize(OccurrenceRow {
                entry_id,
                count: line.count,
                hashed: line.is_hashed(),
                text: &text,
                source: source.clone(),
                line: number,
            })?;
        }
    }
    Ok(())
}

fn write_run<W: io::Write>(csv_writer: &mut csv::Writer<W>, run: &SortedRun) -> Result<(), OutputError> {
    let text = run.text();
    csv_writer.serialize(RunRow {
        count: run.count,
        text: &text,
        start_line: run.start_line,
        end_line: run.end_line,
    })?;
    Ok(())
}
