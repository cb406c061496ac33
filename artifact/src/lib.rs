//! Avail artifact container library.
//!
//! Builds and reads self-describing artifact containers: zip archives that
//! merge one or more Avail module roots, pre-built artifacts and loose files,
//! alongside a versioned manifest and a per-root digest index. Every path is
//! written at most once, and nested artifacts are re-rooted rather than
//! concatenated.
//!
//! # Modules
//!
//! - [`builder`] - Container assembly with first-writer-wins merging
//! - [`builder_error`] - Error types for building
//! - [`config`] - Packaging settings loaded from TOML
//! - [`configuration`] - Versioned application configuration record
//! - [`container`] - Zip and unpacked-directory storage behind the reader
//! - [`descriptor`] - Fixed-size packaging kind record
//! - [`digest_algorithm`] - Supported digest algorithms and streaming hashing
//! - [`digest_index`] - Per-root `path:hex` digest index
//! - [`error`] - Format and validation errors shared by every record
//! - [`file_metadata`] - Classification of a root's source entries
//! - [`layout`] - Reserved paths and nested-artifact re-rooting rules
//! - [`manifest`] - Versioned artifact manifest
//! - [`reader`] - Lazy, memoised access to a finished artifact
//! - [`reader_error`] - Error types for reading
//! - [`root_metadata`] - Per-root manifest metadata
//! - [`schema_version`] - Registered schema version ranges
//! - [`timestamp`] - Canonical UTC timestamps
//! - [`tree`] - Sorted walks over loose source trees

pub mod builder;
pub mod builder_error;
pub mod config;
pub mod configuration;
pub mod container;
pub mod descriptor;
pub mod digest_algorithm;
pub mod digest_index;
pub mod error;
pub mod file_metadata;
pub mod layout;
pub mod manifest;
pub mod reader;
pub mod reader_error;
pub mod root_metadata;
pub mod schema_version;
pub mod timestamp;
pub mod tree;

pub use builder::{ArtifactBuilder, BuilderParams};
pub use builder_error::BuilderError;
pub use reader::{ArtifactReader, MissingDigestPolicy, ReaderOptions, VerificationReport};
pub use reader_error::ReaderError;
