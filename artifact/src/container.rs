//! Storage behind an artifact reader.
//!
//! A [`Container`] answers three questions: what bytes does an entry hold,
//! what does it digest to, and which entries live under a prefix. Single
//! file artifacts are served by [`ZipContainer`]; unpacked trees with the
//! same layout by [`DirectoryContainer`].

use crate::descriptor::PackagingKind;
use crate::digest_algorithm::DigestAlgorithm;
use crate::timestamp::{from_zip_datetime, system_time_millis};
use crate::tree::{self, WalkError};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{self, BufReader, Read};
use zip::ZipArchive;
use zip::result::ZipError;

/// Errors arising from container access.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The unreadable path or entry.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The zip container is malformed.
    #[error("invalid zip container {path}: {source}")]
    Zip {
        /// The container path.
        path: Utf8PathBuf,
        /// The zip decoder's error.
        #[source]
        source: ZipError,
    },

    /// An unpacked tree could not be walked.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// An entry name would resolve outside the container.
    #[error("entry name escapes the container: {name}")]
    PathTraversal {
        /// The offending entry name.
        name: String,
    },
}

/// An entry as listed by [`Container::entries_under`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Full entry name; directories end with `/`.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Modification time, if recorded.
    pub last_modified_millis: Option<i64>,
}

/// Read access to an artifact's entries, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait Container {
    /// The packaging kind this container physically is.
    fn kind(&self) -> PackagingKind;

    /// Read an entry's bytes, or `None` if there is no such entry.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] if the entry exists but cannot be read.
    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>, ContainerError>;

    /// Stream an entry through `algorithm`, or `None` if there is no such
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] if the entry exists but cannot be read.
    fn digest_entry(
        &mut self,
        name: &str,
        algorithm: DigestAlgorithm,
    ) -> Result<Option<Vec<u8>>, ContainerError>;

    /// List every entry whose name starts with `prefix`, excluding the
    /// prefix entry itself.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] if the listing fails.
    fn entries_under(&mut self, prefix: &str) -> Result<Vec<EntryInfo>, ContainerError>;
}

/// A single-file zip container.
pub struct ZipContainer {
    path: Utf8PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl std::fmt::Debug for ZipContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipContainer")
            .field("path", &self.path)
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl ZipContainer {
    /// Open the zip file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Io`] if the file cannot be opened and
    /// [`ContainerError::Zip`] if it is not a zip archive.
    pub fn open(path: &Utf8Path) -> Result<Self, ContainerError> {
        let file = File::open(path).map_err(|source| ContainerError::Io {
            path: path.to_string(),
            source,
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| ContainerError::Zip {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            path: path.to_owned(),
            archive,
        })
    }

    fn with_entry<T>(
        &mut self,
        name: &str,
        read: impl FnOnce(&mut dyn Read) -> io::Result<T>,
    ) -> Result<Option<T>, ContainerError> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(source) => {
                return Err(ContainerError::Zip {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        read(&mut entry)
            .map(Some)
            .map_err(|source| ContainerError::Io {
                path: format!("{}!{name}", self.path),
                source,
            })
    }
}

impl Container for ZipContainer {
    fn kind(&self) -> PackagingKind {
        PackagingKind::SingleFile
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>, ContainerError> {
        self.with_entry(name, |entry| {
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
    }

    fn digest_entry(
        &mut self,
        name: &str,
        algorithm: DigestAlgorithm,
    ) -> Result<Option<Vec<u8>>, ContainerError> {
        self.with_entry(name, |mut entry| algorithm.digest_reader(&mut entry))
    }

    fn entries_under(&mut self, prefix: &str) -> Result<Vec<EntryInfo>, ContainerError> {
        let mut entries = Vec::new();
        for index in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index_raw(index)
                .map_err(|source| ContainerError::Zip {
                    path: self.path.clone(),
                    source,
                })?;
            let name = entry.name();
            if name.len() > prefix.len() && name.starts_with(prefix) {
                entries.push(EntryInfo {
                    name: name.to_owned(),
                    is_dir: entry.is_dir(),
                    size: entry.size(),
                    last_modified_millis: entry.last_modified().map(from_zip_datetime),
                });
            }
        }
        Ok(entries)
    }
}

/// An unpacked artifact laid out on disk.
#[derive(Debug, Clone)]
pub struct DirectoryContainer {
    root: Utf8PathBuf,
}

impl DirectoryContainer {
    /// Serve entries from the tree rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an entry name to a path beneath the root.
    fn resolve(&self, name: &str) -> Result<Utf8PathBuf, ContainerError> {
        let relative = Utf8Path::new(name.trim_end_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Utf8Component::Normal(_) | Utf8Component::CurDir));
        if escapes {
            return Err(ContainerError::PathTraversal {
                name: name.to_owned(),
            });
        }
        Ok(self.root.join(relative))
    }

    fn open_file(&self, name: &str) -> Result<Option<File>, ContainerError> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Ok(None);
        }
        File::open(&path)
            .map(Some)
            .map_err(|source| ContainerError::Io {
                path: path.to_string(),
                source,
            })
    }
}

impl Container for DirectoryContainer {
    fn kind(&self) -> PackagingKind {
        PackagingKind::Directory
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>, ContainerError> {
        let Some(mut file) = self.open_file(name)? else {
            return Ok(None);
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|source| ContainerError::Io {
                path: name.to_owned(),
                source,
            })?;
        Ok(Some(bytes))
    }

    fn digest_entry(
        &mut self,
        name: &str,
        algorithm: DigestAlgorithm,
    ) -> Result<Option<Vec<u8>>, ContainerError> {
        let Some(mut file) = self.open_file(name)? else {
            return Ok(None);
        };
        algorithm
            .digest_reader(&mut file)
            .map(Some)
            .map_err(|source| ContainerError::Io {
                path: name.to_owned(),
                source,
            })
    }

    fn entries_under(&mut self, prefix: &str) -> Result<Vec<EntryInfo>, ContainerError> {
        let base = self.resolve(prefix)?;
        if !base.is_dir() {
            return Ok(Vec::new());
        }
        let prefix = if prefix.is_empty() || prefix.ends_with('/') {
            prefix.to_owned()
        } else {
            format!("{prefix}/")
        };
        let mut entries = Vec::new();
        for entry in tree::walk(&base)? {
            if entry.relative.is_empty() {
                continue;
            }
            let metadata = entry.path.metadata().ok();
            let suffix = if entry.is_dir { "/" } else { "" };
            entries.push(EntryInfo {
                name: format!("{prefix}{}{suffix}", entry.relative),
                is_dir: entry.is_dir,
                size: if entry.is_dir {
                    0
                } else {
                    metadata.as_ref().map_or(0, std::fs::Metadata::len)
                },
                last_modified_millis: metadata
                    .and_then(|m| m.modified().ok())
                    .and_then(system_time_millis),
            });
        }
        Ok(entries)
    }
}
