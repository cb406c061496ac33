//! Classification of a root's source entries.
//!
//! Entry names are relative to the root's `Sources/` directory. A root's
//! declared module extensions decide what each entry is:
//!
//! | Entry                      | Kind                      |
//! |----------------------------|---------------------------|
//! | `P.avail/`                 | package                   |
//! | `docs/`                    | directory                 |
//! | `P.avail/P.avail`          | package representative    |
//! | `P.avail/Q.avail`, `a.avail` | module                  |
//! | anything else              | resource                  |

use crate::root_metadata::RootMetadata;
use std::fmt;

/// MIME hint carried by modules and package representatives.
pub const MODULE_MIME_TYPE: &str = "text/plain";

/// What a source entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A module source file.
    Module,
    /// The module that represents its enclosing package.
    PackageRepresentative,
    /// A directory named with a module extension.
    Package,
    /// Any other directory.
    Directory,
    /// Any other file.
    Resource,
}

impl FileKind {
    /// Whether entries of this kind are module sources.
    #[must_use]
    pub const fn is_module(self) -> bool {
        matches!(self, Self::Module | Self::PackageRepresentative)
    }

    /// Whether entries of this kind are directories.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Package | Self::Directory)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Module => "MODULE",
            Self::PackageRepresentative => "PACKAGE_REPRESENTATIVE",
            Self::Package => "PACKAGE",
            Self::Directory => "DIRECTORY",
            Self::Resource => "RESOURCE",
        })
    }
}

/// Reader-produced description of one source entry. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Path relative to the root's `Sources/`; directories end with `/`.
    pub relative_path: String,
    /// Classification under the root's module extensions.
    pub kind: FileKind,
    /// `/<root>/<path>` with module extensions stripped.
    pub qualified_name: String,
    /// [`MODULE_MIME_TYPE`] for modules, otherwise `None`.
    pub mime_type: Option<&'static str>,
    /// Entry modification time, if recorded.
    pub last_modified_epoch_millis: Option<i64>,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Digest from the root's digest index, if listed.
    pub digest: Option<Vec<u8>>,
}

/// Classify `relative` under `root`'s module extensions.
///
/// # Examples
///
/// ```
/// use avail_artifact::file_metadata::{classify, FileKind};
/// use avail_artifact::root_metadata::RootMetadata;
///
/// let root = RootMetadata::new("avail");
/// assert_eq!(classify(&root, "foo/foo.avail"), FileKind::PackageRepresentative);
/// assert_eq!(classify(&root, "foo/bar.avail"), FileKind::Module);
/// assert_eq!(classify(&root, "foo/"), FileKind::Directory);
/// ```
#[must_use]
pub fn classify(root: &RootMetadata, relative: &str) -> FileKind {
    if let Some(directory) = relative.strip_suffix('/') {
        let name = last_segment(directory);
        return if root.matching_extension(name).is_some() {
            FileKind::Package
        } else {
            FileKind::Directory
        };
    }
    let mut segments = relative.rsplit('/');
    let name = segments.next().unwrap_or(relative);
    if root.matching_extension(name).is_none() {
        return FileKind::Resource;
    }
    match segments.next() {
        Some(parent) if base_name(root, parent) == base_name(root, name) => {
            FileKind::PackageRepresentative
        }
        _ => FileKind::Module,
    }
}

/// Build `/<root>/<relative>` with module extensions stripped from every
/// segment and no trailing `/`.
#[must_use]
pub fn qualified_name(root: &RootMetadata, relative: &str) -> String {
    let mut name = format!("/{}", root.name);
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        name.push('/');
        name.push_str(base_name(root, segment));
    }
    name
}

/// Assemble a record with no size, timestamp or digest.
#[must_use]
pub fn describe(root: &RootMetadata, relative: &str) -> FileMetadata {
    let kind = classify(root, relative);
    FileMetadata {
        relative_path: relative.to_owned(),
        kind,
        qualified_name: qualified_name(root, relative),
        mime_type: kind.is_module().then_some(MODULE_MIME_TYPE),
        last_modified_epoch_millis: None,
        size: 0,
        digest: None,
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn base_name<'a>(root: &RootMetadata, segment: &'a str) -> &'a str {
    root.matching_extension(segment)
        .and_then(|ext| segment.strip_suffix(ext))
        .unwrap_or(segment)
}
