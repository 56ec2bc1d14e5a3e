//! Duplicate finder implementation.
//!
//! # Overview
//!
//! This module orchestrates the two detection paths:
//! 1. **Multi-source** ([`DuplicateFinder::find_duplicates`]): one reader
//!    thread per source feeds a single aggregator over a rendezvous channel.
//!    A source that cannot be opened or read is reported in the summary and
//!    the run continues with the others.
//! 2. **Sorted** ([`DuplicateFinder::find_sorted_duplicates`]): one source,
//!    one pass, no threads. Any failure is fatal since a partial result of a
//!    single sorted source means nothing.
//!
//! Runs are not cancellable: once started, every source is consumed to its
//! end.
//!
//! # Example
//!
//! ```no_run
//! use linedupe::duplicates::{DuplicateFinder, FinderConfig};
//! use linedupe::scanner::SourceId;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_threshold(1));
//! let sources = SourceId::from_args(&["a.txt", "b.txt"]);
//! let (lines, summary) = finder.find_duplicates(&sources).unwrap();
//!
//! for line in &lines {
//!     println!("{}\t{}", line.count, line.text());
//! }
//! println!("{} lines read from {} sources", summary.lines_read, summary.sources);
//! ```

use std::io::BufRead;
use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::aggregator::Aggregator;
use super::groups::{DuplicateLine, SortedRun};
use super::sorted::RunTracker;
use crate::progress::ProgressCallback;
use crate::scanner::reader::LINES_PER_PROGRESS_TICK;
use crate::scanner::{
    KeyConfig, KeyNormalizer, LineScanner, RawRecord, SourceError, SourceId, SourceOutcome,
    SourceReader,
};

/// Default reporting threshold: lines seen more than once.
pub const DEFAULT_THRESHOLD: u64 = 1;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Lines are reported when seen more than this many times.
    pub threshold: u64,
    /// Key normalization settings.
    pub key_config: KeyConfig,
    /// Capacity of the reader to aggregator channel.
    /// Zero makes every hand-off a rendezvous.
    pub channel_capacity: usize,
    /// Lines longer than this fail their source.
    pub max_line_length: Option<usize>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("threshold", &self.threshold)
            .field("key_config", &self.key_config)
            .field("channel_capacity", &self.channel_capacity)
            .field("max_line_length", &self.max_line_length)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            key_config: KeyConfig::default(),
            channel_capacity: 0,
            max_line_length: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the reporting threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the key normalization settings.
    #[must_use]
    pub fn with_key_config(mut self, config: KeyConfig) -> Self {
        self.key_config = config;
        self
    }

    /// Set the channel capacity.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the maximum accepted line length.
    #[must_use]
    pub fn with_max_line_length(mut self, max: Option<usize>) -> Self {
        self.max_line_length = max;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Summary statistics from a detection run.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Number of sources requested
    pub sources: usize,
    /// Number of sources that failed to open or stopped on an error
    pub sources_failed: usize,
    /// Total lines read across all sources
    pub lines_read: u64,
    /// Total bytes read across all sources
    pub bytes_read: u64,
    /// Number of distinct keys (multi-source) or runs (sorted)
    pub distinct_keys: usize,
    /// Number of distinct keys that are digests of long lines
    pub hashed_keys: usize,
    /// Number of reported entries
    pub duplicate_lines: usize,
    /// Duration of the run
    pub duration: Duration,
    /// Errors encountered on individual sources
    pub source_errors: Vec<SourceError>,
}

impl ScanSummary {
    /// Whether any source failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.source_errors.is_empty()
    }

    /// Format bytes read as human-readable string.
    #[must_use]
    pub fn bytes_display(&self) -> String {
        ByteSize(self.bytes_read).to_string()
    }

    fn absorb(&mut self, outcome: SourceOutcome) {
        self.lines_read += outcome.lines_read;
        self.bytes_read += outcome.bytes_read;
        if let Some(error) = outcome.error {
            self.sources_failed += 1;
            self.source_errors.push(error);
        }
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The only source of a sorted run failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A reader thread could not be started.
    #[error("Failed to start reader thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// A reader thread panicked.
    #[error("Reader for {0} panicked")]
    ReaderPanicked(SourceId),
}

/// Duplicate finder that runs either detection path.
///
/// # Example
///
/// ```
/// use linedupe::duplicates::{DuplicateFinder, FinderConfig};
/// use linedupe::scanner::SourceId;
/// use std::io::Cursor;
///
/// let finder = DuplicateFinder::new(FinderConfig::default().with_threshold(1));
/// let inputs = vec![
///     (SourceId::from_arg("a"), Cursor::new("x\ny\nx\n")),
///     (SourceId::from_arg("b"), Cursor::new("x\n")),
/// ];
/// let (lines, summary) = finder.find_duplicates_from_readers(inputs).unwrap();
///
/// assert_eq!(lines.len(), 1);
/// assert_eq!(lines[0].count, 3);
/// assert_eq!(summary.lines_read, 4);
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    normalizer: KeyNormalizer,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let normalizer = KeyNormalizer::new(config.key_config);
        Self { config, normalizer }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find lines repeated across the given sources.
    ///
    /// Each source is opened and read on its own thread. Sources that fail
    /// are listed in [`ScanSummary::source_errors`]; lines read before a
    /// failure still count.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` only if a reader thread cannot be started or
    /// panics. Per-source failures are not errors.
    pub fn find_duplicates(
        &self,
        sources: &[SourceId],
    ) -> Result<(Vec<DuplicateLine>, ScanSummary), FinderError> {
        let inputs = vec![(); sources.len()];
        self.run_readers(sources.to_vec(), inputs, |reader, (), sender| {
            reader.run(sender)
        })
    }

    /// Find lines repeated across already opened readers.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` only if a reader thread cannot be started or
    /// panics.
    pub fn find_duplicates_from_readers<R: BufRead + Send>(
        &self,
        inputs: Vec<(SourceId, R)>,
    ) -> Result<(Vec<DuplicateLine>, ScanSummary), FinderError> {
        let (sources, readers): (Vec<SourceId>, Vec<R>) = inputs.into_iter().unzip();
        self.run_readers(sources, readers, |reader, input, sender| {
            reader.read_from(input, sender)
        })
    }

    fn run_readers<T, F>(
        &self,
        sources: Vec<SourceId>,
        inputs: Vec<T>,
        read: F,
    ) -> Result<(Vec<DuplicateLine>, ScanSummary), FinderError>
    where
        T: Send,
        F: Fn(&SourceReader<'_>, T, &SyncSender<RawRecord>) -> SourceOutcome + Sync,
    {
        let start_time = Instant::now();
        let mut summary = ScanSummary {
            sources: sources.len(),
            ..Default::default()
        };

        log::info!(
            "Scanning {} source(s) for lines seen more than {} time(s)",
            sources.len(),
            self.config.threshold
        );

        let (sender, receiver) = mpsc::sync_channel::<RawRecord>(self.config.channel_capacity);
        let mut aggregator = Aggregator::new(self.config.threshold);

        let outcomes = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(inputs.len());
            let mut spawn_error = None;

            for (index, input) in inputs.into_iter().enumerate() {
                let sender = sender.clone();
                let reader = SourceReader::new(index, &sources[index], &self.normalizer)
                    .with_max_line_length(self.config.max_line_length)
                    .with_progress_callback(self.config.progress_callback.clone());
                let read = &read;

                let spawned = thread::Builder::new()
                    .name(format!("linedupe-reader-{index}"))
                    .spawn_scoped(scope, move || read(&reader, input, &sender));
                match spawned {
                    Ok(handle) => handles.push((index, handle)),
                    Err(e) => {
                        log::error!("Failed to start reader for {}: {}", sources[index], e);
                        spawn_error = Some(e);
                        break;
                    }
                }
            }

            // Readers hold the remaining senders; the channel closes when the last one finishes.
            drop(sender);
            aggregator.consume(receiver);

            let mut outcomes = Vec::with_capacity(handles.len());
            for (index, handle) in handles {
                match handle.join() {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(_) => return Err(FinderError::ReaderPanicked(sources[index].clone())),
                }
            }
            match spawn_error {
                Some(e) => Err(FinderError::Spawn(e)),
                None => Ok(outcomes),
            }
        })?;

        for outcome in outcomes {
            summary.absorb(outcome);
        }

        summary.distinct_keys = aggregator.distinct_keys();
        summary.hashed_keys = aggregator.hashed_keys();

        let lines: Vec<DuplicateLine> = aggregator
            .into_duplicates()
            .into_iter()
            .map(|(key, entry)| DuplicateLine::from_entry(key, entry, &sources))
            .collect();

        summary.duplicate_lines = lines.len();
        summary.duration = start_time.elapsed();

        log::info!(
            "Read {} lines ({}) from {} source(s), {} distinct, {} repeated more than {} time(s) in {:?}",
            summary.lines_read,
            summary.bytes_display(),
            summary.sources - summary.sources_failed,
            summary.distinct_keys,
            summary.duplicate_lines,
            self.config.threshold,
            summary.duration
        );
        if summary.has_errors() {
            log::warn!("{} source(s) failed", summary.sources_failed);
        }

        Ok((lines, summary))
    }

    /// Find repeated lines in a single pre-sorted source.
    ///
    /// Sortedness is assumed, not checked.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Source`] if the source cannot be opened or
    /// fails part-way; no partial result is produced.
    pub fn find_sorted_duplicates(
        &self,
        source: &SourceId,
    ) -> Result<(Vec<SortedRun>, ScanSummary), FinderError> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_source_start(0, source);
        }
        let reader = match source.open() {
            Ok(reader) => reader,
            Err(e) => {
                log::error!("{}", e);
                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_source_end(0, 0, true);
                }
                return Err(e.into());
            }
        };
        self.scan_sorted(source, reader)
    }

    /// Find repeated lines in an already opened pre-sorted reader.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Source`] if reading fails part-way.
    pub fn find_sorted_duplicates_from_reader<R: BufRead>(
        &self,
        source: &SourceId,
        reader: R,
    ) -> Result<(Vec<SortedRun>, ScanSummary), FinderError> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_source_start(0, source);
        }
        self.scan_sorted(source, reader)
    }

    fn scan_sorted<R: BufRead>(
        &self,
        source: &SourceId,
        reader: R,
    ) -> Result<(Vec<SortedRun>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        log::info!(
            "Scanning sorted {} for runs longer than {} line(s)",
            source,
            self.config.threshold
        );

        let mut scanner = LineScanner::new(reader).with_max_line_length(self.config.max_line_length);
        let mut tracker = RunTracker::new(self.config.threshold);
        let mut failure = None;

        loop {
            match scanner.next_line() {
                Ok(Some((line_number, line))) => {
                    tracker.push(line_number, line);
                    if line_number % LINES_PER_PROGRESS_TICK == 0 {
                        if let Some(ref callback) = self.config.progress_callback {
                            callback.on_lines(0, line_number);
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    failure = Some(SourceError::from_line_error(source, e));
                    break;
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_source_end(0, scanner.line_number(), failure.is_some());
        }
        if let Some(e) = failure {
            log::error!("{}", e);
            return Err(e.into());
        }

        let runs = tracker.finish();

        let summary = ScanSummary {
            sources: 1,
            lines_read: scanner.line_number(),
            bytes_read: scanner.bytes_read(),
            distinct_keys: tracker.runs_seen() as usize,
            duplicate_lines: runs.len(),
            duration: start_time.elapsed(),
            ..Default::default()
        };

        log::info!(
            "Read {} lines ({}) from {}, {} run(s) longer than {} line(s) in {:?}",
            summary.lines_read,
            summary.bytes_display(),
            source,
            summary.duplicate_lines,
            self.config.threshold,
            summary.duration
        );

        Ok((runs, summary))
    }
}
