//! Error types for decoding and validating artifact records.
//!
//! Every variant identifies the rejected input and the constraint that was
//! violated, so callers can build diagnostics without re-parsing anything.
//! I/O-level failures live in [`crate::builder_error`] and
//! [`crate::reader_error`].

use crate::schema_version::VersionRange;
use thiserror::Error;

/// Errors arising from malformed or unsupported artifact records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The named digest algorithm is not one this build can compute.
    #[error("unsupported digest algorithm \"{name}\"; expected one of: {expected}")]
    UnsupportedAlgorithm {
        /// The rejected algorithm identifier.
        name: String,
        /// Comma-separated list of accepted identifiers.
        expected: String,
    },

    /// A digest index line is not of the form `path:hexDigest`.
    #[error("malformed digest line {line_number}: {reason}")]
    MalformedDigestLine {
        /// One-based line number within the digest file.
        line_number: usize,
        /// Description of the validation failure.
        reason: String,
    },

    /// The descriptor record does not have the fixed length.
    #[error("malformed descriptor: expected {expected} bytes, got {actual}")]
    MalformedDescriptor {
        /// Required record length.
        expected: usize,
        /// Length actually read.
        actual: usize,
    },

    /// The descriptor names a packaging kind this build does not know.
    #[error("unsupported packaging kind ordinal {ordinal}")]
    UnsupportedPackagingKind {
        /// The raw ordinal read from the descriptor.
        ordinal: u32,
    },

    /// The descriptor schema version is outside the registered range.
    #[error("unsupported descriptor version {found}; supported: {supported}")]
    UnsupportedDescriptorVersion {
        /// The version read from the descriptor.
        found: u32,
        /// The versions this build understands.
        supported: VersionRange,
    },

    /// A manifest declares an `artifactVersion` with no registered decoder.
    #[error("unknown manifest version {found}; supported: {supported}")]
    UnknownManifestVersion {
        /// The discriminant read from the record.
        found: i64,
        /// The versions this build understands.
        supported: VersionRange,
    },

    /// A configuration declares a `configurationVersion` with no decoder.
    #[error("unknown application configuration version {found}; supported: {supported}")]
    UnknownConfigurationVersion {
        /// The discriminant read from the record.
        found: i64,
        /// The versions this build understands.
        supported: VersionRange,
    },

    /// A versioned record lacks its integer version discriminant.
    #[error("record has no integer \"{field}\" field")]
    MissingVersion {
        /// Name of the expected discriminant field.
        field: &'static str,
    },

    /// A JSON record could not be decoded.
    #[error("invalid {record} JSON: {reason}")]
    InvalidJson {
        /// Which record was being decoded.
        record: &'static str,
        /// The decoder's message.
        reason: String,
    },

    /// Two roots in one manifest share a name.
    #[error("duplicate root \"{name}\" in manifest")]
    DuplicateRoot {
        /// The repeated root name.
        name: String,
    },

    /// A configuration refers to a root the manifest does not declare.
    #[error("application configuration refers to undeclared root \"{name}\"")]
    UnknownRootReference {
        /// The unresolved root name.
        name: String,
    },

    /// A packaging configuration file is invalid.
    #[error("invalid packaging configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
}

/// Result type alias using [`FormatError`].
pub type Result<T> = std::result::Result<T, FormatError>;
