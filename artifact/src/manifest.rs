//! Versioned artifact manifest.
//!
//! The manifest records what an artifact is (library or application), when
//! it was built, which roots it carries, and an optional embedded runtime
//! component. It is stored as `avail-artifact-manifest.json`:
//!
//! ```json
//! {
//!   "artifactVersion": 1,
//!   "artifactType": "LIBRARY",
//!   "constructed": "2026-02-03T00:00:00.000Z",
//!   "description": "Standard library",
//!   "roots": [
//!     {
//!       "name": "avail",
//!       "digestAlgorithm": "SHA-256",
//!       "availModuleExtensions": [".avail"]
//!     }
//!   ]
//! }
//! ```
//!
//! Each schema version has its own variant of [`Manifest`] and its own
//! decoder. Decoding reads `artifactVersion` first and dispatches through a
//! closed `match`; versions without a decoder are rejected. Encoding always
//! emits the current version.

use crate::error::{FormatError, Result};
use crate::root_metadata::RootMetadata;
use crate::schema_version::MANIFEST_VERSIONS;
use crate::timestamp::Constructed;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// JSON field holding the manifest schema discriminant.
pub const VERSION_FIELD: &str = "artifactVersion";

/// Whether an artifact is linked into other artifacts or launched directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactType {
    /// A reusable library of roots.
    Library,
    /// A launchable application; carries an application configuration.
    Application,
}

/// Descriptor of an execution component embedded alongside the roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeComponent {
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Entry-point class name to description.
    #[serde(default)]
    pub mains: BTreeMap<String, String>,
}

/// Version 1 of the artifact manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestV1 {
    /// Library or application.
    pub artifact_type: ArtifactType,
    /// When the manifest was constructed.
    pub constructed: Constructed,
    /// Free-form description.
    pub description: String,
    /// Roots keyed by name.
    pub roots: BTreeMap<String, RootMetadata>,
    /// Optional embedded runtime component.
    pub runtime_component: Option<RuntimeComponent>,
}

impl ManifestV1 {
    /// Start a manifest stamped with the current time and no roots.
    #[must_use]
    pub fn new(artifact_type: ArtifactType, description: impl Into<String>) -> Self {
        Self {
            artifact_type,
            constructed: Constructed::now(),
            description: description.into(),
            roots: BTreeMap::new(),
            runtime_component: None,
        }
    }

    /// Add a root, replacing any existing root of the same name.
    #[must_use]
    pub fn with_root(mut self, root: RootMetadata) -> Self {
        self.roots.insert(root.name.clone(), root);
        self
    }

    /// Attach a runtime component.
    #[must_use]
    pub fn with_runtime_component(mut self, component: RuntimeComponent) -> Self {
        self.runtime_component = Some(component);
        self
    }

    /// Add a root, rejecting a name that is already present.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::DuplicateRoot`] if the name is taken.
    pub fn insert_root(&mut self, root: RootMetadata) -> Result<()> {
        if self.roots.contains_key(&root.name) {
            return Err(FormatError::DuplicateRoot { name: root.name });
        }
        self.roots.insert(root.name.clone(), root);
        Ok(())
    }
}

/// The wire shape of a version 1 manifest.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestV1Record {
    artifact_version: u32,
    artifact_type: ArtifactType,
    constructed: Constructed,
    #[serde(default)]
    description: String,
    roots: Vec<RootMetadata>,
    #[serde(rename = "jvmComponent", default, skip_serializing_if = "Option::is_none")]
    runtime_component: Option<RuntimeComponent>,
}

impl TryFrom<ManifestV1Record> for ManifestV1 {
    type Error = FormatError;

    fn try_from(record: ManifestV1Record) -> Result<Self> {
        let mut roots = BTreeMap::new();
        for root in record.roots {
            if roots.contains_key(&root.name) {
                return Err(FormatError::DuplicateRoot { name: root.name });
            }
            roots.insert(root.name.clone(), root);
        }
        Ok(Self {
            artifact_type: record.artifact_type,
            constructed: record.constructed,
            description: record.description,
            roots,
            runtime_component: record.runtime_component,
        })
    }
}

impl From<&ManifestV1> for ManifestV1Record {
    fn from(manifest: &ManifestV1) -> Self {
        Self {
            artifact_version: 1,
            artifact_type: manifest.artifact_type,
            constructed: manifest.constructed.clone(),
            description: manifest.description.clone(),
            roots: manifest.roots.values().cloned().collect(),
            runtime_component: manifest.runtime_component.clone(),
        }
    }
}

/// An artifact manifest of any registered schema version.
///
/// # Examples
///
/// ```
/// use avail_artifact::manifest::{ArtifactType, Manifest, ManifestV1};
/// use avail_artifact::root_metadata::RootMetadata;
///
/// let manifest = Manifest::from(
///     ManifestV1::new(ArtifactType::Library, "demo").with_root(RootMetadata::new("avail")),
/// );
/// let json = manifest.to_json().expect("encodes");
/// assert_eq!(Manifest::from_json(&json).expect("decodes"), manifest);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifest {
    /// Schema version 1.
    V1(ManifestV1),
}

impl From<ManifestV1> for Manifest {
    fn from(manifest: ManifestV1) -> Self {
        Self::V1(manifest)
    }
}

impl Manifest {
    /// Decode a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidJson`] for malformed JSON and otherwise
    /// as [`Self::from_value`].
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| invalid(&e))?;
        Self::from_value(value)
    }

    /// Decode a manifest by dispatching on its `artifactVersion`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MissingVersion`] if the discriminant is absent,
    /// [`FormatError::UnknownManifestVersion`] if no decoder is registered
    /// for it, and [`FormatError::InvalidJson`] or
    /// [`FormatError::DuplicateRoot`] if the version's decoder rejects the
    /// record.
    pub fn from_value(value: Value) -> Result<Self> {
        let version = value
            .get(VERSION_FIELD)
            .and_then(Value::as_i64)
            .ok_or(FormatError::MissingVersion {
                field: VERSION_FIELD,
            })?;
        match version {
            1 => {
                let record: ManifestV1Record =
                    serde_json::from_value(value).map_err(|e| invalid(&e))?;
                Ok(Self::V1(ManifestV1::try_from(record)?))
            }
            found => Err(FormatError::UnknownManifestVersion {
                found,
                supported: MANIFEST_VERSIONS,
            }),
        }
    }

    /// Encode using the current schema version.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidJson`] if serialisation fails.
    pub fn to_value(&self) -> Result<Value> {
        let current = self.to_current();
        serde_json::to_value(ManifestV1Record::from(&current)).map_err(|e| invalid(&e))
    }

    /// Encode as pretty-printed JSON using the current schema version.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidJson`] if serialisation fails.
    pub fn to_json(&self) -> Result<String> {
        let current = self.to_current();
        serde_json::to_string_pretty(&ManifestV1Record::from(&current)).map_err(|e| invalid(&e))
    }

    /// Return the schema version this manifest was decoded from.
    #[must_use]
    pub fn version(&self) -> u32 {
        match self {
            Self::V1(_) => 1,
        }
    }

    /// Upgrade to the current schema version.
    ///
    /// Fields introduced after the source version take their documented
    /// defaults.
    #[must_use]
    pub fn to_current(&self) -> ManifestV1 {
        match self {
            Self::V1(manifest) => manifest.clone(),
        }
    }

    /// Return the artifact type.
    #[must_use]
    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            Self::V1(m) => m.artifact_type,
        }
    }

    /// Return the construction timestamp.
    #[must_use]
    pub fn constructed(&self) -> &Constructed {
        match self {
            Self::V1(m) => &m.constructed,
        }
    }

    /// Return the description.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::V1(m) => &m.description,
        }
    }

    /// Return the roots keyed by name.
    #[must_use]
    pub fn roots(&self) -> &BTreeMap<String, RootMetadata> {
        match self {
            Self::V1(m) => &m.roots,
        }
    }

    /// Look up one root by name.
    #[must_use]
    pub fn root(&self, name: &str) -> Option<&RootMetadata> {
        self.roots().get(name)
    }

    /// Return the embedded runtime component, if any.
    #[must_use]
    pub fn runtime_component(&self) -> Option<&RuntimeComponent> {
        match self {
            Self::V1(m) => m.runtime_component.as_ref(),
        }
    }
}

fn invalid(err: &serde_json::Error) -> FormatError {
    FormatError::InvalidJson {
        record: "manifest",
        reason: err.to_string(),
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
