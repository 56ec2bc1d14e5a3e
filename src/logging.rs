//! Logging setup for linedupe.
//!
//! Logging goes through the `log` facade with an `env_logger` backend on
//! stderr, so reports on stdout stay clean. The level is chosen by
//! (highest priority first):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (errors only) or `--verbose` (debug, then trace)
//! 3. Default: info
//!
//! Debug builds prefix each record with a timestamp, and with the module
//! path from `-v` on. Release builds print level and message only.
//!
//! # Example
//!
//! ```rust,no_run
//! use linedupe::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

const LOG_ENV: &str = "RUST_LOG";

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// Only the first call in a process installs a logger; later calls are
/// ignored.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by `RUST_LOG`)
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var_os(LOG_ENV).is_some();

    let mut builder = Builder::new();
    if from_env {
        builder.parse_env(LOG_ENV);
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        log::trace!("Logger already initialized");
        return;
    }

    if from_env {
        log::debug!("Logging configured from {}", LOG_ENV);
    } else {
        log::debug!("Logging initialized at level: {}", current_level_name());
    }
}

/// Map CLI flags to a level filter. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    let show_module = verbose >= 1;
    builder.format(move |buf, record| {
        let level_style = buf.default_level_style(record.level());
        write!(
            buf,
            "{} {level_style}{:<5}{level_style:#} ",
            buf.timestamp_seconds(),
            record.level()
        )?;
        if show_module {
            write!(buf, "[{}] ", record.module_path().unwrap_or("unknown"))?;
        }
        writeln!(buf, "{}", record.args())
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let level_style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "{level_style}{:<5}{level_style:#} {}",
            record.level(),
            record.args()
        )
    });
}

/// Get the current maximum log level as a string.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
