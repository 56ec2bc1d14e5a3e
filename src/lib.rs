//! linedupe - Concurrent Duplicate Line Finder
//!
//! Finds lines that repeat within and across text sources. Each source is
//! read on its own thread and every line is handed to a single aggregator,
//! which records how often each line occurs and where. Lines of 32 bytes or
//! more are compared by a SHA-256 digest so memory stays bounded for long
//! lines. Pre-sorted single sources take a lighter path that tracks runs.
//!
//! # Example
//!
//! ```
//! use linedupe::duplicates::{DuplicateFinder, FinderConfig};
//! use linedupe::scanner::SourceId;
//! use std::io::Cursor;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let (lines, _summary) = finder
//!     .find_duplicates_from_readers(vec![(SourceId::from_arg("a"), Cursor::new("x\nx\n"))])
//!     .unwrap();
//! assert_eq!(lines[0].count, 2);
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;

use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::{Cli, Commands, ConfigArgs, OutputFormat};
use crate::config::{Config, ConfigError};
use crate::duplicates::{DuplicateFinder, FinderConfig, ScanSummary};
use crate::error::ExitCode;
use crate::output::{CsvOutput, JsonOutput, OutputError, Report, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{SourceId, STDIN_SENTINEL};

/// Presentation settings resolved from global flags.
#[derive(Debug, Clone, Copy)]
struct Presentation {
    color: bool,
    progress: bool,
}

/// Run the application with parsed arguments, writing reports to stdout.
///
/// # Errors
///
/// Returns an error for fatal failures: invalid configuration, a failed
/// sorted source, or a report that cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let color = !cli.no_color && io::stdout().is_terminal();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run_with_output(cli, &mut out, color)
}

/// Run the application with parsed arguments, writing reports to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with_output<W: Write>(cli: Cli, out: &mut W, color: bool) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let presentation = Presentation {
        color,
        progress: !(cli.quiet || cli.no_progress),
    };
    let config_path = cli.config.as_deref();

    let mut config = match (&cli.command, config_path) {
        // Saving to a new file: nothing to read from it yet.
        (Commands::Config(args), Some(path)) if args.save && !path.exists() => {
            Config::figment(None)
                .extract::<Config>()
                .map_err(ConfigError::from)
        }
        (_, path) => Config::load(path),
    }
    .context("Failed to load configuration")?;

    match &cli.command {
        Commands::Scan(args) => {
            args.apply_to(&mut config);
            run_scan(&args.sources, &config, presentation, out)
        }
        Commands::Sorted(args) => {
            args.report.apply_to(&mut config);
            run_sorted(args.source.as_deref(), &config, presentation, out)
        }
        Commands::Config(args) => run_config(args, &config, config_path, out),
    }
}

fn run_scan<W: Write>(
    sources: &[String],
    config: &Config,
    presentation: Presentation,
    out: &mut W,
) -> Result<ExitCode> {
    let sources = SourceId::from_args(sources);
    if sources.iter().filter(|s| **s == SourceId::Stdin).count() > 1 {
        log::warn!("Standard input is listed more than once; later listings will read nothing");
    }

    let finder = DuplicateFinder::new(finder_config(config, presentation));
    let (mut lines, summary) = finder.find_duplicates(&sources).context("Scan failed")?;

    config.sort.sort_lines(&mut lines);
    let exit_code = ExitCode::for_run(!lines.is_empty(), summary.has_errors());
    if lines.is_empty() {
        log::info!("No line seen more than {} time(s)", config.threshold);
    }

    write_report(out, Report::Lines(&lines), &summary, exit_code, config.output, presentation)?;
    Ok(exit_code)
}

fn run_sorted<W: Write>(
    source: Option<&str>,
    config: &Config,
    presentation: Presentation,
    out: &mut W,
) -> Result<ExitCode> {
    let source = SourceId::from_arg(source.unwrap_or(STDIN_SENTINEL));

    let finder = DuplicateFinder::new(finder_config(config, presentation));
    let (mut runs, summary) = finder.find_sorted_duplicates(&source)?;

    config.sort.sort_runs(&mut runs);
    let exit_code = ExitCode::for_run(!runs.is_empty(), false);
    if runs.is_empty() {
        log::info!("No run longer than {} line(s) in {}", config.threshold, source);
    }

    write_report(out, Report::Runs(&runs), &summary, exit_code, config.output, presentation)?;
    Ok(exit_code)
}

fn run_config<W: Write>(
    args: &ConfigArgs,
    config: &Config,
    path: Option<&Path>,
    out: &mut W,
) -> Result<ExitCode> {
    if args.path {
        let Some(path) = path.map(Path::to_path_buf).or_else(Config::default_path) else {
            bail!(ConfigError::NoConfigDir);
        };
        writeln!(out, "{}", path.display())?;
    } else if args.save {
        let written = config.save(path)?;
        writeln!(out, "{}", written.display())?;
    } else {
        out.write_all(config.to_toml()?.as_bytes())?;
    }
    out.flush()?;
    Ok(ExitCode::Success)
}

fn finder_config(config: &Config, presentation: Presentation) -> FinderConfig {
    let finder_config = config.finder_config();
    if presentation.progress {
        let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(false));
        finder_config.with_progress_callback(progress)
    } else {
        finder_config
    }
}

fn write_report<W: Write>(
    out: &mut W,
    report: Report<'_>,
    summary: &ScanSummary,
    exit_code: ExitCode,
    format: OutputFormat,
    presentation: Presentation,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Text => TextOutput::new(report)
            .with_failures(&summary.source_errors)
            .with_color(presentation.color)
            .write_to(out),
        OutputFormat::Json => JsonOutput::new(report, summary, exit_code).write_to(out, true),
        OutputFormat::Csv => CsvOutput::new(report).write_to(out),
    }
}
