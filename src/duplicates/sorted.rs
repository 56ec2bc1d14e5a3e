//! Run tracking for pre-sorted single-source input.
//!
//! When every occurrence of a line is contiguous, the location list of a
//! repeated line is fully described by the first and last line number of its
//! run. [`RunTracker`] keeps one open run at a time and closes it when a
//! different line arrives. [`RunTracker::finish`] closes the final run and
//! must be called once input is exhausted.
//!
//! Sortedness is not verified. On unsorted input a value that appears in
//! several separate runs is reported once per qualifying run.
//!
//! ```
//! use linedupe::duplicates::RunTracker;
//!
//! let mut tracker = RunTracker::new(1);
//! for (n, line) in ["a", "a", "a", "b", "b", "c"].iter().enumerate() {
//!     tracker.push(n as u64 + 1, line.as_bytes());
//! }
//! let runs = tracker.finish();
//!
//! assert_eq!(runs.len(), 2);
//! assert_eq!((runs[0].count, runs[0].start_line, runs[0].end_line), (3, 1, 3));
//! assert_eq!((runs[1].count, runs[1].start_line, runs[1].end_line), (2, 4, 5));
//! ```

use std::mem;

use super::groups::SortedRun;

/// Tracker state between lines.
#[derive(Debug, Default)]
enum RunState {
    #[default]
    NoRun,
    Open {
        line: Vec<u8>,
        start: u64,
        end: u64,
        count: u64,
    },
}

/// Single-pass state machine over sorted lines.
#[derive(Debug, Default)]
pub struct RunTracker {
    threshold: u64,
    state: RunState,
    runs: Vec<SortedRun>,
    runs_seen: u64,
}

impl RunTracker {
    /// Create a tracker reporting runs longer than `threshold` lines.
    #[must_use]
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Feed the next line and its 1-based line number.
    pub fn push(&mut self, line_number: u64, line: &[u8]) {
        if let RunState::Open {
            line: current,
            end,
            count,
            ..
        } = &mut self.state
        {
            if current.as_slice() == line {
                *end = line_number;
                *count += 1;
                return;
            }
        }

        self.close_run();
        self.state = RunState::Open {
            line: line.to_vec(),
            start: line_number,
            end: line_number,
            count: 1,
        };
    }

    /// Number of runs closed so far.
    #[must_use]
    pub fn runs_seen(&self) -> u64 {
        self.runs_seen
    }

    /// Close the last open run and return the qualifying runs in input order.
    ///
    /// Must be called once after the last line, otherwise the final run is lost.
    #[must_use]
    pub fn finish(&mut self) -> Vec<SortedRun> {
        self.close_run();
        mem::take(&mut self.runs)
    }

    fn close_run(&mut self) {
        if let RunState::Open {
            line,
            start,
            end,
            count,
        } = mem::take(&mut self.state)
        {
            self.runs_seen += 1;
            if count > self.threshold {
                self.runs.push(SortedRun {
                    line,
                    count,
                    start_line: start,
                    end_line: end,
                });
            }
        }
    }
}
