//! Packaging configuration loaded from TOML.
//!
//! Controls how the builder encodes entries. Every field falls back to its
//! default when omitted, so an empty file is a valid configuration:
//!
//! ```toml
//! compression = "deflated"
//! compression_level = 6
//! default_digest_algorithm = "SHA-256"
//! preserve_timestamps = true
//! ```

use crate::digest_algorithm::DigestAlgorithm;
use crate::error::{FormatError, Result};
use camino::Utf8Path;
use serde::Deserialize;
use std::fs;

/// Compression applied to file entries.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Deflate.
    #[default]
    Deflated,
    /// No compression.
    Stored,
}

/// Builder settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagingConfig {
    /// Entry compression method.
    pub compression: Compression,
    /// Compression level; `None` uses the codec default.
    pub compression_level: Option<i64>,
    /// Algorithm identifier used when a root does not name one.
    pub default_digest_algorithm: String,
    /// Copy source modification times into entries. When false every entry
    /// is stamped with the zip epoch so repeated builds are byte-identical.
    pub preserve_timestamps: bool,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            compression_level: None,
            default_digest_algorithm: DigestAlgorithm::default().as_str().to_owned(),
            preserve_timestamps: true,
        }
    }
}

impl PackagingConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidConfig`] for malformed TOML or unknown
    /// keys, and [`FormatError::UnsupportedAlgorithm`] for an unknown
    /// default algorithm.
    ///
    /// # Examples
    ///
    /// ```
    /// use avail_artifact::config::{Compression, PackagingConfig};
    ///
    /// let config = PackagingConfig::from_toml_str("compression = \"stored\"").expect("valid");
    /// assert_eq!(config.compression, Compression::Stored);
    /// assert!(config.preserve_timestamps);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| FormatError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.default_algorithm()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidConfig`] if the file cannot be read, and
    /// otherwise as [`Self::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| FormatError::InvalidConfig {
            reason: format!("cannot read {path}: {e}"),
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolve [`Self::default_digest_algorithm`].
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnsupportedAlgorithm`] for an unknown name.
    pub fn default_algorithm(&self) -> Result<DigestAlgorithm> {
        DigestAlgorithm::try_from(self.default_digest_algorithm.as_str())
    }

    /// Build zip entry options for a file or directory.
    pub(crate) fn entry_options(&self) -> zip::write::SimpleFileOptions {
        let (method, level) = match self.compression {
            Compression::Deflated => (zip::CompressionMethod::Deflated, self.compression_level),
            Compression::Stored => (zip::CompressionMethod::Stored, None),
        };
        zip::write::SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(level)
            .unix_permissions(0o644)
    }
}
