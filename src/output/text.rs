//! Plain text output for terminals and pipelines.
//!
//! One block per reported entry. Multi-source entries list their locations
//! on indented lines below the count:
//!
//! ```text
//! 3	x
//! 	a.txt: [1, 3]
//! 	b.txt: [1]
//! ```
//!
//! Sorted runs fit on one line:
//!
//! ```text
//! 3	a	start: 1, end: 3
//! ```
//!
//! Long lines are shown by their digest in angle brackets, e.g.
//! `<sha256:9f86d0...>`, so they never read like a line of the same text.
//!
//! Sources that failed are listed after the entries, one `#` line each:
//!
//! ```text
//! # Failed to open missing.txt: No such file or directory (os error 2)
//! ```

use std::fmt;
use std::io::Write;

use yansi::{Paint, Style};

use super::{OutputError, Report};
use crate::duplicates::{DuplicateLine, SortedRun};
use crate::scanner::SourceError;

const COUNT_STYLE: Style = Style::new().yellow().bold();
const DIGEST_STYLE: Style = Style::new().dim();
const SOURCE_STYLE: Style = Style::new().cyan();
const FAILURE_STYLE: Style = Style::new().red();

/// Text output formatter.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    report: Report<'a>,
    failures: &'a [SourceError],
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter without colour.
    #[must_use]
    pub fn new(report: Report<'a>) -> Self {
        Self {
            report,
            failures: &[],
            color: false,
        }
    }

    /// List these source failures after the entries.
    #[must_use]
    pub fn with_failures(mut self, failures: &'a [SourceError]) -> Self {
        self.failures = failures;
        self
    }

    /// Enable or disable ANSI colour.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns `OutputError::Io` if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), OutputError> {
        match self.report {
            Report::Lines(lines) => {
                for line in lines {
                    self.write_line(writer, line)?;
                }
            }
            Report::Runs(runs) => {
                for run in runs {
                    self.write_run(writer, run)?;
                }
            }
        }
        for failure in self.failures {
            writeln!(writer, "{}", self.paint(&format!("# {failure}"), FAILURE_STYLE))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Render the report to a string.
    ///
    /// # Errors
    ///
    /// Returns `OutputError::Io` if rendering fails.
    pub fn render(&self) -> Result<String, OutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn write_line<W: Write>(&self, writer: &mut W, line: &DuplicateLine) -> Result<(), OutputError> {
        let key = if line.is_hashed() {
            self.paint(&format!("<{}>", line.key), DIGEST_STYLE)
        } else {
            line.key.to_string()
        };
        writeln!(writer, "{}\t{}", self.paint(&line.count, COUNT_STYLE), key)?;
        for location in &line.locations {
            writeln!(
                writer,
                "\t{}: {:?}",
                self.paint(&location.source, SOURCE_STYLE),
                location.lines
            )?;
        }
        Ok(())
    }

    fn write_run<W: Write>(&self, writer: &mut W, run: &SortedRun) -> Result<(), OutputError> {
        writeln!(
            writer,
            "{}\t{}\tstart: {}, end: {}",
            self.paint(&run.count, COUNT_STYLE),
            run.text(),
            run.start_line,
            run.end_line
        )?;
        Ok(())
    }

    fn paint<T: fmt::Display + ?Sized>(&self, value: &T, style: Style) -> String {
        if self.color {
            value.paint(style).to_string()
        } else {
            value.to_string()
        }
    }
}
