//! Line key normalization.
//!
//! # Overview
//!
//! Every scanned line is mapped to a [`NormalizedKey`] before it reaches the
//! aggregator. Lines shorter than the configured threshold (32 bytes by
//! default) are kept verbatim. Longer lines are replaced by a fixed-size
//! cryptographic digest so that the memory cost of one distinct key is
//! bounded regardless of line length.
//!
//! # Collisions
//!
//! Two different long lines may produce the same digest. Such a collision is
//! neither detected nor reported: both lines are counted under one key. With
//! a 256-bit digest the probability is negligible; a 128-bit digest halves key
//! memory at the cost of a larger (still tiny) probability. Removing collisions
//! entirely needs a second pass that keeps full text for the reported keys.
//!
//! # Example
//!
//! ```
//! use linedupe::scanner::{KeyConfig, KeyNormalizer, NormalizedKey};
//!
//! let normalizer = KeyNormalizer::new(KeyConfig::default());
//!
//! let short = normalizer.normalize(b"hello");
//! assert_eq!(short, NormalizedKey::Verbatim(b"hello".to_vec().into_boxed_slice()));
//!
//! let long = normalizer.normalize(&[b'x'; 40]);
//! assert!(long.is_digest());
//! assert_eq!(long.hex().len(), 64);
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default line length (in bytes) at which lines are hashed instead of stored.
pub const DEFAULT_LONG_LINE_THRESHOLD: usize = 32;

/// Cryptographic hash used for long-line keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// BLAKE3 (256-bit output)
    Blake3,
}

impl HashAlgorithm {
    /// Short lowercase name used in reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    fn digest(self, data: &[u8]) -> [u8; 32] {
        match self {
            Self::Sha256 => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&Sha256::digest(data));
                out
            }
            Self::Blake3 => *blake3::hash(data).as_bytes(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of digest bits kept for a long-line key.
///
/// Serialized as the plain bit count (`128` or `256`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum DigestWidth {
    /// First 16 bytes of the digest.
    Bits128,
    /// Full 32-byte digest.
    #[default]
    Bits256,
}

impl DigestWidth {
    /// Number of bytes kept from the digest.
    #[must_use]
    pub fn bytes(self) -> usize {
        match self {
            Self::Bits128 => 16,
            Self::Bits256 => 32,
        }
    }

    /// Number of bits kept from the digest.
    #[must_use]
    pub fn bits(self) -> u16 {
        (self.bytes() * 8) as u16
    }
}

impl TryFrom<u16> for DigestWidth {
    type Error = String;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            128 => Ok(Self::Bits128),
            256 => Ok(Self::Bits256),
            other => Err(format!("Unsupported digest width: {other} (expected 128 or 256)")),
        }
    }
}

impl From<DigestWidth> for u16 {
    fn from(width: DigestWidth) -> Self {
        width.bits()
    }
}

/// Parse a digest width from a command-line value.
///
/// # Errors
///
/// Returns an error unless the value is `128` or `256`.
pub fn parse_digest_width(s: &str) -> Result<DigestWidth, String> {
    let bits: u16 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid digest width: '{s}'"))?;
    DigestWidth::try_from(bits)
}

/// Settings for [`KeyNormalizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Lines of at least this many bytes are hashed.
    pub long_line_threshold: usize,
    /// Hash used for long lines.
    pub algorithm: HashAlgorithm,
    /// How much of the digest is kept.
    pub digest_width: DigestWidth,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            long_line_threshold: DEFAULT_LONG_LINE_THRESHOLD,
            algorithm: HashAlgorithm::default(),
            digest_width: DigestWidth::default(),
        }
    }
}

impl KeyConfig {
    /// Set the long-line threshold in bytes.
    #[must_use]
    pub fn with_long_line_threshold(mut self, threshold: usize) -> Self {
        self.long_line_threshold = threshold;
        self
    }

    /// Set the hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the digest width.
    #[must_use]
    pub fn with_digest_width(mut self, width: DigestWidth) -> Self {
        self.digest_width = width;
        self
    }
}

/// Comparison key standing in for a raw line.
///
/// The two variants never compare equal to each other, so a short line can
/// not be confused with the digest of a long one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NormalizedKey {
    /// The line's bytes, unchanged.
    Verbatim(Box<[u8]>),
    /// Digest of the line's bytes.
    Digest {
        /// Hash that produced the digest
        algorithm: HashAlgorithm,
        /// Raw digest bytes (16 or 32)
        bytes: Box<[u8]>,
    },
}

impl NormalizedKey {
    /// Whether this key is a digest rather than the line itself.
    #[must_use]
    pub fn is_digest(&self) -> bool {
        matches!(self, Self::Digest { .. })
    }

    /// Raw key bytes: the line for verbatim keys, the digest otherwise.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Verbatim(bytes) | Self::Digest { bytes, .. } => bytes,
        }
    }

    /// Lowercase hexadecimal encoding of the key bytes.
    #[must_use]
    pub fn hex(&self) -> String {
        hash_to_hex(self.as_bytes())
    }

    /// Text form of the key.
    ///
    /// Verbatim keys render as the line (invalid UTF-8 replaced), digest keys
    /// as their hexadecimal encoding.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Verbatim(bytes) => String::from_utf8_lossy(bytes),
            Self::Digest { bytes, .. } => Cow::Owned(hash_to_hex(bytes)),
        }
    }

    /// Hash algorithm for digest keys.
    #[must_use]
    pub fn algorithm(&self) -> Option<HashAlgorithm> {
        match self {
            Self::Verbatim(_) => None,
            Self::Digest { algorithm, .. } => Some(*algorithm),
        }
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verbatim(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Self::Digest { algorithm, bytes } => {
                write!(f, "{}:{}", algorithm, hash_to_hex(bytes))
            }
        }
    }
}

/// Maps raw lines to [`NormalizedKey`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyNormalizer {
    config: KeyConfig,
}

impl KeyNormalizer {
    /// Create a normalizer with the given settings.
    #[must_use]
    pub fn new(config: KeyConfig) -> Self {
        Self { config }
    }

    /// The settings in use.
    #[must_use]
    pub fn config(&self) -> &KeyConfig {
        &self.config
    }

    /// Normalize one line (without its terminator).
    #[must_use]
    pub fn normalize(&self, line: &[u8]) -> NormalizedKey {
        if line.len() < self.config.long_line_threshold {
            return NormalizedKey::Verbatim(line.into());
        }

        let digest = self.config.algorithm.digest(line);
        NormalizedKey::Digest {
            algorithm: self.config.algorithm,
            bytes: digest[..self.config.digest_width.bytes()].into(),
        }
    }
}

/// Normalize a line with the default settings (32-byte threshold, SHA-256).
#[must_use]
pub fn normalize(line: &str) -> NormalizedKey {
    KeyNormalizer::default().normalize(line.as_bytes())
}

/// Encode bytes as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
