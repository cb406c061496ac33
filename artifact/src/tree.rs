//! Deterministic walks over loose source trees.
//!
//! Both the builder and the digest index need the same view of a directory:
//! every directory and regular file beneath it, named relative to the walk
//! root with `/` separators. Symbolic links and special files are skipped.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use thiserror::Error;
use walkdir::WalkDir;

/// Errors arising while walking a source tree.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The underlying directory walk failed.
    #[error("failed to walk {root}: {source}")]
    Walk {
        /// The walk root.
        root: Utf8PathBuf,
        /// The walker's error.
        #[source]
        source: walkdir::Error,
    },

    /// A path beneath the root is not valid UTF-8.
    #[error("non-UTF-8 path beneath {root}: {path}")]
    NonUtf8Path {
        /// The walk root.
        root: Utf8PathBuf,
        /// Lossy rendering of the rejected path.
        path: String,
    },
}

/// A single directory or regular file found by [`walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the walk root, `/`-separated, empty for the root.
    pub relative: String,
    /// Absolute (or caller-relative) path on disk.
    pub path: Utf8PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Walk `root` and return its directories and regular files.
///
/// The root itself is the first entry, with an empty relative path. Siblings
/// are visited in file-name order so repeated walks of the same tree agree.
///
/// # Errors
///
/// Returns [`WalkError`] if the walk fails or meets a non-UTF-8 path.
pub fn walk(root: &Utf8Path) -> Result<Vec<TreeEntry>, WalkError> {
    let mut entries = Vec::new();
    for item in WalkDir::new(root).sort_by_file_name() {
        let item = item.map_err(|source| WalkError::Walk {
            root: root.to_owned(),
            source,
        })?;
        let file_type = item.file_type();
        if !file_type.is_dir() && !file_type.is_file() {
            debug!("skipping special file {}", item.path().display());
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(item.into_path()).map_err(|raw| {
            WalkError::NonUtf8Path {
                root: root.to_owned(),
                path: raw.to_string_lossy().into_owned(),
            }
        })?;
        entries.push(TreeEntry {
            relative: relative_name(root, &path),
            is_dir: file_type.is_dir(),
            path,
        });
    }
    Ok(entries)
}

/// Render `path` relative to `root` with `/` separators.
fn relative_name(root: &Utf8Path, path: &Utf8Path) -> String {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}
