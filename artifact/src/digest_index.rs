//! Per-root digest index: relative file path to content digest.
//!
//! The index is stored inside the container as `all_digests.txt`, one
//! `path:hexDigest` line per regular file. Lines are written in byte-wise
//! lexicographic order of the path so that the same tree always serialises
//! to the same bytes, whatever order the filesystem returns entries in.

use crate::digest_algorithm::DigestAlgorithm;
use crate::error::FormatError;
use crate::tree::{self, WalkError};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::fs;
use thiserror::Error;

/// Errors arising while computing a digest index from disk.
#[derive(Debug, Error)]
pub enum DigestIndexError {
    /// The algorithm or a record was rejected.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The source tree could not be walked.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// A relative path cannot be written as a `path:hexDigest` line.
    #[error("cannot record a digest for {path}: names may not contain ':' or line breaks")]
    UnrepresentablePath {
        /// The offending file.
        path: Utf8PathBuf,
    },

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The unreadable file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Mapping from root-relative file path to raw digest bytes.
///
/// # Examples
///
/// ```
/// use avail_artifact::digest_index::DigestIndex;
///
/// let text = "a.avail:00ff\n";
/// let index = DigestIndex::parse(text).expect("well-formed index");
/// assert_eq!(index.digest_of("a.avail"), Some(&[0x00, 0xff][..]));
/// assert_eq!(index.serialize(), text);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestIndex {
    entries: BTreeMap<String, Vec<u8>>,
}

impl DigestIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest every regular file beneath `root` with `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`DigestIndexError::Walk`] if the tree cannot be walked,
    /// [`DigestIndexError::UnrepresentablePath`] for a file whose relative
    /// path contains `:` or a line break, and [`DigestIndexError::Io`] naming
    /// the first unreadable file.
    pub fn compute(root: &Utf8Path, algorithm: DigestAlgorithm) -> Result<Self, DigestIndexError> {
        let mut index = Self::new();
        for entry in tree::walk(root)?.into_iter().filter(|e| !e.is_dir) {
            if entry.relative.contains([':', '\n', '\r']) {
                return Err(DigestIndexError::UnrepresentablePath { path: entry.path });
            }
            let digest = digest_file(&entry.path, algorithm)?;
            index.insert(entry.relative, digest);
        }
        Ok(index)
    }

    /// Like [`Self::compute`], resolving the algorithm from its manifest name.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnsupportedAlgorithm`] (wrapped) for an unknown
    /// name, otherwise as [`Self::compute`].
    pub fn compute_named(root: &Utf8Path, algorithm: &str) -> Result<Self, DigestIndexError> {
        Self::compute(root, DigestAlgorithm::try_from(algorithm)?)
    }

    /// Parse the serialised `path:hexDigest` form.
    ///
    /// Blank lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MalformedDigestLine`] for any line without
    /// exactly one `:`, with an empty path, or with invalid hex.
    pub fn parse(serialized: &str) -> Result<Self, FormatError> {
        let mut index = Self::new();
        for (offset, line) in serialized.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_number = offset + 1;
            let malformed = |reason: String| FormatError::MalformedDigestLine {
                line_number,
                reason,
            };
            let mut parts = line.split(':');
            let (Some(path), Some(hex_digest), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(malformed(format!(
                    "expected exactly one ':' separator in \"{line}\""
                )));
            };
            if path.is_empty() {
                return Err(malformed("empty path".to_owned()));
            }
            let digest = hex::decode(hex_digest.trim_end())
                .map_err(|e| malformed(format!("invalid hex digest for {path}: {e}")))?;
            index.insert(path.to_owned(), digest);
        }
        Ok(index)
    }

    /// Render the index as `path:hexDigest` lines in canonical order.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|(path, digest)| format!("{path}:{}\n", hex::encode(digest)))
            .collect()
    }

    /// Record a digest, replacing any previous one for `path`.
    pub fn insert(&mut self, path: impl Into<String>, digest: Vec<u8>) {
        self.entries.insert(path.into(), digest);
    }

    /// Look up the digest recorded for `path`.
    #[must_use]
    pub fn digest_of(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Return the number of recorded files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the index records no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(path, digest)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(path, digest)| (path.as_str(), digest.as_slice()))
    }
}

fn digest_file(path: &Utf8Path, algorithm: DigestAlgorithm) -> Result<Vec<u8>, DigestIndexError> {
    let io_error = |source| DigestIndexError::Io {
        path: path.to_owned(),
        source,
    };
    let mut file = fs::File::open(path).map_err(io_error)?;
    algorithm.digest_reader(&mut file).map_err(io_error)
}

#[cfg(test)]
#[path = "digest_index_tests.rs"]
mod tests;
