//! Versioned application configuration.
//!
//! Application artifacts carry `avail-application-configuration.json`
//! naming the roots to load at startup and any renames to apply. The record
//! has its own version sequence, independent of the manifest, and uses the
//! same closed dispatch on `configurationVersion`.

use crate::error::{FormatError, Result};
use crate::manifest::Manifest;
use crate::schema_version::CONFIGURATION_VERSIONS;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON field holding the configuration schema discriminant.
pub const VERSION_FIELD: &str = "configurationVersion";

/// A directive to load a root under a different name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootRename {
    /// Name the root is declared under in the manifest.
    pub original_name: String,
    /// Name to load it as.
    pub rename: String,
}

/// Version 1 of the application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationV1 {
    /// Roots to activate at startup, in order.
    pub included_roots: Vec<String>,
    /// Renames to apply, in order.
    pub root_renames: Vec<RootRename>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigurationV1Record {
    configuration_version: u32,
    #[serde(default)]
    included_roots: Vec<String>,
    #[serde(default)]
    root_renames: Vec<RootRename>,
}

/// An application configuration of any registered schema version.
///
/// # Examples
///
/// ```
/// use avail_artifact::configuration::{ApplicationConfiguration, ConfigurationV1};
///
/// let config = ApplicationConfiguration::from(ConfigurationV1 {
///     included_roots: vec!["avail".to_owned()],
///     root_renames: Vec::new(),
/// });
/// let json = config.to_json().expect("encodes");
/// assert_eq!(ApplicationConfiguration::from_json(&json).expect("decodes"), config);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationConfiguration {
    /// Schema version 1.
    V1(ConfigurationV1),
}

impl Default for ApplicationConfiguration {
    fn default() -> Self {
        Self::V1(ConfigurationV1::default())
    }
}

impl From<ConfigurationV1> for ApplicationConfiguration {
    fn from(config: ConfigurationV1) -> Self {
        Self::V1(config)
    }
}

impl ApplicationConfiguration {
    /// Decode from JSON text.
    ///
    /// # Errors
    ///
    /// As [`Self::from_value`], plus [`FormatError::InvalidJson`] for
    /// malformed text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| invalid(&e))?;
        Self::from_value(value)
    }

    /// Decode by dispatching on `configurationVersion`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MissingVersion`],
    /// [`FormatError::UnknownConfigurationVersion`] or
    /// [`FormatError::InvalidJson`].
    pub fn from_value(value: Value) -> Result<Self> {
        let version = value
            .get(VERSION_FIELD)
            .and_then(Value::as_i64)
            .ok_or(FormatError::MissingVersion {
                field: VERSION_FIELD,
            })?;
        match version {
            1 => {
                let record: ConfigurationV1Record =
                    serde_json::from_value(value).map_err(|e| invalid(&e))?;
                Ok(Self::V1(ConfigurationV1 {
                    included_roots: record.included_roots,
                    root_renames: record.root_renames,
                }))
            }
            found => Err(FormatError::UnknownConfigurationVersion {
                found,
                supported: CONFIGURATION_VERSIONS,
            }),
        }
    }

    /// Encode as pretty-printed JSON using the current schema version.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidJson`] if serialisation fails.
    pub fn to_json(&self) -> Result<String> {
        let current = self.to_current();
        let record = ConfigurationV1Record {
            configuration_version: 1,
            included_roots: current.included_roots,
            root_renames: current.root_renames,
        };
        serde_json::to_string_pretty(&record).map_err(|e| invalid(&e))
    }

    /// Return the schema version this configuration was decoded from.
    #[must_use]
    pub fn version(&self) -> u32 {
        match self {
            Self::V1(_) => 1,
        }
    }

    /// Upgrade to the current schema version.
    #[must_use]
    pub fn to_current(&self) -> ConfigurationV1 {
        match self {
            Self::V1(config) => config.clone(),
        }
    }

    /// Return the roots to activate at startup.
    #[must_use]
    pub fn included_roots(&self) -> &[String] {
        match self {
            Self::V1(c) => &c.included_roots,
        }
    }

    /// Return the rename directives.
    #[must_use]
    pub fn root_renames(&self) -> &[RootRename] {
        match self {
            Self::V1(c) => &c.root_renames,
        }
    }

    /// Check that every referenced root is declared by `manifest`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnknownRootReference`] naming the first
    /// undeclared root.
    pub fn validate_against(&self, manifest: &Manifest) -> Result<()> {
        let referenced = self
            .included_roots()
            .iter()
            .chain(self.root_renames().iter().map(|r| &r.original_name));
        for name in referenced {
            if manifest.root(name).is_none() {
                return Err(FormatError::UnknownRootReference { name: name.clone() });
            }
        }
        Ok(())
    }
}

fn invalid(err: &serde_json::Error) -> FormatError {
    FormatError::InvalidJson {
        record: "application configuration",
        reason: err.to_string(),
    }
}
