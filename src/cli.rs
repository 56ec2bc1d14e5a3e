//! Command-line interface definitions for linedupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, config file) apply to every subcommand.
//!
//! Options that also exist in the configuration file are optional here: when
//! given they override the file and environment, when omitted the
//! configured value is used.
//!
//! # Example
//!
//! ```bash
//! # Lines repeated anywhere across three logs
//! linedupe scan a.log b.log c.log
//!
//! # Lines seen more than 5 times, as JSON
//! linedupe scan -t 5 -o json a.log b.log
//!
//! # Runs in sorted input read from stdin
//! sort words.txt | linedupe sorted
//! ```

use std::path::PathBuf;

use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::duplicates::ReportOrder;
use crate::scanner::{parse_digest_width, DigestWidth, HashAlgorithm};

/// Find lines that repeat within and across text files.
///
/// Short lines are compared as-is; long lines are compared by a cryptographic
/// digest to keep memory bounded.
#[derive(Debug, Parser)]
#[command(name = "linedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Do not draw progress spinners
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for linedupe.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find lines repeated across one or more sources
    Scan(ScanArgs),
    /// Find runs of repeated lines in one sorted source
    Sorted(SortedArgs),
    /// Show or save the effective configuration
    Config(ConfigArgs),
}

/// Options shared by both detection subcommands.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Report lines seen more than N times
    #[arg(short, long, value_name = "N")]
    pub threshold: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Presentation order of the report
    #[arg(long, value_enum)]
    pub sort: Option<ReportOrder>,

    /// Fail a source on lines longer than this (e.g., 64KiB, 1MB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_line_length: Option<usize>,
}

impl ReportArgs {
    /// Override configured values with the options that were given.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(sort) = self.sort {
            config.sort = sort;
        }
        if self.max_line_length.is_some() {
            config.max_line_length = self.max_line_length;
        }
    }
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Files to scan; `-` reads standard input. Defaults to standard input.
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<String>,

    #[command(flatten)]
    pub report: ReportArgs,

    /// Hash used for long lines
    #[arg(long, value_enum)]
    pub hash: Option<HashAlgorithm>,

    /// Digest width in bits for long lines (128 or 256)
    #[arg(long, value_name = "BITS", value_parser = parse_digest_width)]
    pub digest_bits: Option<DigestWidth>,

    /// Lines of at least this many bytes are compared by digest
    #[arg(long, value_name = "BYTES")]
    pub long_line_threshold: Option<usize>,

    /// Records buffered between readers and the aggregator (0 = hand-off)
    #[arg(long, value_name = "N")]
    pub channel_capacity: Option<usize>,
}

impl ScanArgs {
    /// Override configured values with the options that were given.
    pub fn apply_to(&self, config: &mut Config) {
        self.report.apply_to(config);
        if let Some(hash) = self.hash {
            config.hash_algorithm = hash;
        }
        if let Some(width) = self.digest_bits {
            config.digest_width = width;
        }
        if let Some(threshold) = self.long_line_threshold {
            config.long_line_threshold = threshold;
        }
        if let Some(capacity) = self.channel_capacity {
            config.channel_capacity = capacity;
        }
    }
}

/// Arguments for the sorted subcommand.
#[derive(Debug, Args)]
pub struct SortedArgs {
    /// Sorted file to scan; `-` or nothing reads standard input
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    pub save: bool,

    /// Print the config file location only
    #[arg(long, conflicts_with = "save")]
    pub path: bool,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Numbers without a suffix are bytes. Decimal (KB, MB) and binary (KiB,
/// MiB) suffixes are accepted, case-insensitively.
///
/// # Examples
///
/// ```
/// use linedupe::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, not a size, or too large for
/// this platform.
pub fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    let size: ByteSize = s.parse().map_err(|e| format!("Invalid size '{s}': {e}"))?;
    usize::try_from(size.as_u64()).map_err(|_| format!("Size '{s}' is too large"))
}
