//! Application configuration management.
//!
//! Settings are layered, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. `config.toml` in the platform config directory, or the file given
//!    with `--config`
//! 3. `LINEDUPE_*` environment variables (e.g. `LINEDUPE_THRESHOLD=3`,
//!    `LINEDUPE_HASH_ALGORITHM=blake3`)
//! 4. Command-line flags, applied by [`crate::cli`]
//!
//! # Example file
//!
//! ```toml
//! threshold = 2
//! long_line_threshold = 64
//! hash_algorithm = "blake3"
//! digest_width = 128
//! output = "json"
//! sort = "text"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::OutputFormat;
use crate::duplicates::{FinderConfig, ReportOrder, DEFAULT_THRESHOLD};
use crate::scanner::{DigestWidth, HashAlgorithm, KeyConfig, DEFAULT_LONG_LINE_THRESHOLD};

/// Prefix of environment variables read as configuration.
pub const ENV_PREFIX: &str = "LINEDUPE_";

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Report lines seen more than this many times.
    pub threshold: u64,
    /// Lines of at least this many bytes are compared by digest.
    pub long_line_threshold: usize,
    /// Hash used for long lines.
    pub hash_algorithm: HashAlgorithm,
    /// Digest width in bits (128 or 256).
    pub digest_width: DigestWidth,
    /// Records buffered between readers and the aggregator.
    pub channel_capacity: usize,
    /// Lines longer than this fail their source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_line_length: Option<usize>,
    /// Report format.
    pub output: OutputFormat,
    /// Report order.
    pub sort: ReportOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            long_line_threshold: DEFAULT_LONG_LINE_THRESHOLD,
            hash_algorithm: HashAlgorithm::default(),
            digest_width: DigestWidth::default(),
            channel_capacity: 0,
            max_line_length: None,
            output: OutputFormat::default(),
            sort: ReportOrder::default(),
        }
    }
}

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A layer holds a value of the wrong type or shape.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] figment::Error),

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The config file could not be written.
    #[error("Failed to write configuration to {}: {source}", .path.display())]
    Write {
        /// Target file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// No platform config directory could be determined.
    #[error("Failed to determine the configuration directory")]
    NoConfigDir,
}

impl Config {
    /// Build the layered configuration source without extracting it.
    ///
    /// A missing `file` contributes nothing.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the configuration.
    ///
    /// With `path`, that file must exist. Without it, the default
    /// platform-specific file is used if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` for a missing explicit file and
    /// `ConfigError::Invalid` if any layer holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };
        if let Some(ref file) = file {
            log::debug!("Configuration file: {}", file.display());
        }

        let config: Self = Self::figment(file.as_deref()).extract()?;
        log::trace!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Save the configuration as TOML, creating parent directories.
    ///
    /// Writes to `path` if given, otherwise to the default location.
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns an error if no location is available or writing fails.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path().ok_or(ConfigError::NoConfigDir)?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.clone(),
                source,
            })?;
        }

        let content = self.to_toml()?;
        fs::write(&path, content).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!("Configuration saved to {}", path.display());
        Ok(path)
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "linedupe", "linedupe")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Key normalization settings.
    #[must_use]
    pub fn key_config(&self) -> KeyConfig {
        KeyConfig::default()
            .with_long_line_threshold(self.long_line_threshold)
            .with_algorithm(self.hash_algorithm)
            .with_digest_width(self.digest_width)
    }

    /// Finder settings, without a progress callback.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_threshold(self.threshold)
            .with_key_config(self.key_config())
            .with_channel_capacity(self.channel_capacity)
            .with_max_line_length(self.max_line_length)
    }
}
