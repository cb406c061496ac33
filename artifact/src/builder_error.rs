//! Error types for artifact building.
//!
//! Covers output creation, unreadable sources, malformed nested archives and
//! misuse of a finished builder. Each variant names the offending path or
//! entry.

use crate::digest_algorithm::DigestAlgorithm;
use crate::digest_index::DigestIndexError;
use crate::error::FormatError;
use crate::tree::WalkError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising from [`crate::builder::ArtifactBuilder`] operations.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// The output container could not be created.
    #[error("cannot create output {path}: {source}")]
    CannotCreateOutput {
        /// The requested output path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A root source is neither a directory nor an archive.
    #[error("root source is not a directory: {path}")]
    NotADirectory {
        /// The rejected source path.
        path: Utf8PathBuf,
    },

    /// A root of this name was already written to the container.
    #[error("root \"{root}\" is already present in the artifact")]
    RootAlreadyPresent {
        /// The repeated root name.
        root: String,
    },

    /// A root was added with a different algorithm from the one its
    /// manifest entry declares.
    #[error("root \"{root}\" declares {declared} but was digested with {requested}")]
    AlgorithmMismatch {
        /// The root name.
        root: String,
        /// The algorithm named in the manifest.
        declared: DigestAlgorithm,
        /// The algorithm passed to the builder.
        requested: DigestAlgorithm,
    },

    /// An archive entry name is absolute or climbs out of the container
    /// root with `..`.
    #[error("archive {archive} contains unsafe entry \"{entry}\"")]
    PathTraversal {
        /// The archive being merged.
        archive: Utf8PathBuf,
        /// The offending entry name.
        entry: String,
    },

    /// An application configuration was supplied for a library artifact.
    #[error("application configuration supplied for a LIBRARY artifact")]
    UnexpectedConfiguration,

    /// The builder has been finished and accepts no further operations.
    #[error("artifact builder is closed")]
    BuilderClosed,

    /// A source file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The unreadable path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Streaming an entry's bytes into the output failed.
    #[error("failed to copy entry {entry}: {source}")]
    Copy {
        /// The output entry being written.
        entry: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A nested or raw archive could not be opened or read.
    #[error("invalid archive {path}: {source}")]
    InvalidArchive {
        /// The archive path.
        path: Utf8PathBuf,
        /// The zip decoder's error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The output container rejected a write.
    #[error("zip write error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A source tree could not be walked.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// A root's digest index could not be computed.
    #[error(transparent)]
    Digest(#[from] DigestIndexError),

    /// A record could not be encoded or failed validation.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The finished container could not be moved onto the output path.
    #[error("cannot publish artifact to {path}: {source}")]
    Persist {
        /// The requested output path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
