//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display one spinner per source on stderr while sources are being read.
//!
//! Spinners are hidden automatically when stderr is not a terminal.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::scanner::SourceId;

/// Progress callback for source reading.
///
/// Implement this trait to receive progress updates while sources are
/// scanned. Callbacks arrive from reader threads concurrently.
pub trait ProgressCallback: Send + Sync {
    /// Called when a source starts being read.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the source in the run's source list
    /// * `source` - The source being read
    fn on_source_start(&self, index: usize, source: &SourceId);

    /// Called periodically with the number of lines read so far.
    fn on_lines(&self, index: usize, lines: u64);

    /// Called when a source is done, whether it completed or failed.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the source in the run's source list
    /// * `lines` - Total lines read from the source
    /// * `failed` - Whether reading stopped because of an error
    fn on_source_end(&self, index: usize, lines: u64, failed: bool);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    bars: Mutex<HashMap<usize, ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use linedupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            quiet,
        }
    }

    fn source_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} {prefix} [{elapsed_precise}] {pos} lines ({per_sec}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }
}

impl ProgressCallback for Progress {
    fn on_source_start(&self, index: usize, source: &SourceId) {
        if self.quiet {
            return;
        }

        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::source_style());
        pb.set_prefix(truncate_name(&source.to_string(), 30));
        pb.enable_steady_tick(Duration::from_millis(100));
        self.bars.lock().unwrap().insert(index, pb);
    }

    fn on_lines(&self, index: usize, lines: u64) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.bars.lock().unwrap().get(&index) {
            pb.set_position(lines);
        }
    }

    fn on_source_end(&self, index: usize, lines: u64, failed: bool) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.bars.lock().unwrap().remove(&index) {
            pb.set_position(lines);
            pb.finish_with_message(if failed { "failed" } else { "done" });
        }
    }
}

/// Truncate a source name for display, keeping its tail.
fn truncate_name(name: &str, max_len: usize) -> String {
    let count = name.chars().count();
    if count <= max_len {
        return name.to_string();
    }

    let tail: String = name.chars().skip(count - (max_len - 3)).collect();
    format!("...{tail}")
}
