//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Aggregating line records from many sources (single writer)
//! - Run tracking over pre-sorted single-source input
//! - Orchestrating reader threads and collecting results
//! - Result types and presentation order

pub mod aggregator;
pub mod finder;
pub mod groups;
pub mod sorted;

pub use aggregator::{aggregate, Aggregator, OccurrenceEntry};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary, DEFAULT_THRESHOLD};
pub use groups::{DuplicateLine, ReportOrder, SortedRun, SourceLines};
pub use sorted::RunTracker;
