//! Error types for artifact reading.

use crate::container::ContainerError;
use crate::error::FormatError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising from [`crate::reader::ArtifactReader`] operations.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The container is unreadable, has no valid descriptor, or is not the
    /// packaging kind its descriptor names.
    #[error("corrupt artifact {path}: {reason}")]
    CorruptArtifact {
        /// The artifact location.
        path: Utf8PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// The artifact has no manifest.
    #[error("artifact {path} has no manifest")]
    ManifestNotFound {
        /// The artifact location.
        path: Utf8PathBuf,
    },

    /// An application artifact has no configuration.
    #[error("application artifact {path} has no configuration")]
    ConfigurationNotFound {
        /// The artifact location.
        path: Utf8PathBuf,
    },

    /// The root has no digest index.
    #[error("no digest index for root \"{root}\"")]
    DigestNotFound {
        /// The requested root.
        root: String,
    },

    /// The root is not declared in the manifest.
    #[error("root \"{root}\" is not declared in the manifest")]
    UnknownRoot {
        /// The requested root.
        root: String,
    },

    /// A source file has no digest and missing digests are denied.
    #[error("no digest recorded for {path}")]
    MissingDigest {
        /// The entry name.
        path: String,
    },

    /// A record inside the container is not UTF-8 text.
    #[error("entry {entry} is not valid UTF-8")]
    NotUtf8 {
        /// The entry name.
        entry: String,
    },

    /// The underlying container failed.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// A record failed to decode.
    #[error(transparent)]
    Format(#[from] FormatError),
}
