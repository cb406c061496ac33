//! Read a finished artifact.
//!
//! [`ArtifactReader::open`] validates the descriptor up front; the manifest,
//! configuration and per-root digest indices are loaded on first use and
//! memoised for the reader's lifetime.

use crate::configuration::ApplicationConfiguration;
use crate::container::{Container, DirectoryContainer, ZipContainer};
use crate::descriptor::Descriptor;
use crate::digest_algorithm::DigestAlgorithm;
use crate::digest_index::DigestIndex;
use crate::file_metadata::{self, FileMetadata};
use crate::layout;
use crate::manifest::{ArtifactType, Manifest};
use crate::reader_error::ReaderError;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// What to do when a source file has no digest line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingDigestPolicy {
    /// Record `digest: None` and log a warning.
    #[default]
    Warn,
    /// Fail with [`ReaderError::MissingDigest`].
    Deny,
}

/// Reader settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Handling of files absent from their root's digest index.
    pub missing_digests: MissingDigestPolicy,
}

/// Outcome of [`ArtifactReader::verify_root`]. Paths are relative to the
/// root's `Sources/` directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Files whose content no longer matches their recorded digest.
    pub mismatched: Vec<String>,
    /// Files with no digest line.
    pub missing_digest: Vec<String>,
    /// Digest lines naming files that are not present.
    pub orphaned: Vec<String>,
}

impl VerificationReport {
    /// Whether every file matched and every digest line was accounted for.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty() && self.missing_digest.is_empty() && self.orphaned.is_empty()
    }
}

/// Read access to one artifact.
pub struct ArtifactReader {
    location: Utf8PathBuf,
    container: Box<dyn Container + Send>,
    descriptor: Descriptor,
    options: ReaderOptions,
    manifest: Option<Manifest>,
    configuration: Option<ApplicationConfiguration>,
    digests: BTreeMap<String, DigestIndex>,
}

impl std::fmt::Debug for ArtifactReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactReader")
            .field("location", &self.location)
            .field("descriptor", &self.descriptor)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ArtifactReader {
    /// Open the artifact at `location` with default options.
    ///
    /// # Errors
    ///
    /// As [`Self::open_with`].
    pub fn open(location: &Utf8Path) -> Result<Self, ReaderError> {
        Self::open_with(location, ReaderOptions::default())
    }

    /// Open the artifact at `location`: a directory is read as an unpacked
    /// tree, anything else as a zip file.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::CorruptArtifact`] if the location cannot be
    /// opened as a container or its descriptor is missing, malformed or
    /// names the other packaging kind.
    pub fn open_with(location: &Utf8Path, options: ReaderOptions) -> Result<Self, ReaderError> {
        let container: Box<dyn Container + Send> = if location.is_dir() {
            Box::new(DirectoryContainer::new(location))
        } else {
            Box::new(
                ZipContainer::open(location).map_err(|e| ReaderError::CorruptArtifact {
                    path: location.to_owned(),
                    reason: e.to_string(),
                })?,
            )
        };
        Self::with_container(location, container, options)
    }

    /// Read an artifact from an already opened container.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::CorruptArtifact`] if the descriptor is missing,
    /// malformed or disagrees with `container`'s packaging kind.
    pub fn with_container(
        location: &Utf8Path,
        mut container: Box<dyn Container + Send>,
        options: ReaderOptions,
    ) -> Result<Self, ReaderError> {
        let corrupt = |reason: String| ReaderError::CorruptArtifact {
            path: location.to_owned(),
            reason,
        };
        let bytes = container
            .read_entry(&layout::descriptor_path())?
            .ok_or_else(|| corrupt("missing descriptor".to_owned()))?;
        let descriptor = Descriptor::read(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if descriptor.kind != container.kind() {
            return Err(corrupt(format!(
                "descriptor names {} but the container is {}",
                descriptor.kind,
                container.kind()
            )));
        }
        debug!("opened {} artifact {location}", descriptor.kind);
        Ok(Self {
            location: location.to_owned(),
            container,
            descriptor,
            options,
            manifest: None,
            configuration: None,
            digests: BTreeMap::new(),
        })
    }

    /// The artifact's location.
    #[must_use]
    pub fn location(&self) -> &Utf8Path {
        &self.location
    }

    /// The decoded descriptor.
    #[must_use]
    pub fn descriptor(&self) -> Descriptor {
        self.descriptor
    }

    /// The manifest, loaded on first call.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::ManifestNotFound`] if absent, or a format
    /// error if it does not decode.
    pub fn manifest(&mut self) -> Result<&Manifest, ReaderError> {
        let manifest = match self.manifest.take() {
            Some(manifest) => manifest,
            None => {
                let text = read_text(self.container.as_mut(), &layout::manifest_path())?
                    .ok_or_else(|| ReaderError::ManifestNotFound {
                        path: self.location.clone(),
                    })?;
                Manifest::from_json(&text)?
            }
        };
        Ok(self.manifest.insert(manifest))
    }

    /// The application configuration, loaded on first call; `None` for
    /// library artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::ConfigurationNotFound`] if an application
    /// artifact lacks one, or a manifest or format error.
    pub fn configuration(&mut self) -> Result<Option<&ApplicationConfiguration>, ReaderError> {
        if self.manifest()?.artifact_type() == ArtifactType::Library {
            return Ok(None);
        }
        let configuration = match self.configuration.take() {
            Some(configuration) => configuration,
            None => {
                let text = read_text(self.container.as_mut(), &layout::configuration_path())?
                    .ok_or_else(|| ReaderError::ConfigurationNotFound {
                        path: self.location.clone(),
                    })?;
                ApplicationConfiguration::from_json(&text)?
            }
        };
        Ok(Some(self.configuration.insert(configuration)))
    }

    /// The digest index of `root`, loaded on first call.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::DigestNotFound`] if the root has no digest
    /// file, or a format error if it does not parse.
    pub fn digests_for_root(&mut self, root: &str) -> Result<&DigestIndex, ReaderError> {
        let index = match self.digests.entry(root.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let text = read_text(self.container.as_mut(), &layout::digests_path(root))?
                    .ok_or_else(|| ReaderError::DigestNotFound {
                        root: root.to_owned(),
                    })?;
                entry.insert(DigestIndex::parse(&text)?)
            }
        };
        Ok(index)
    }

    /// Describe every entry under `root`'s `Sources/` directory, in
    /// container order.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownRoot`] if the manifest does not declare
    /// `root`, [`ReaderError::MissingDigest`] for an undigested file under
    /// [`MissingDigestPolicy::Deny`], or a container, manifest or digest
    /// error.
    pub fn file_metadata_for_root(&mut self, root: &str) -> Result<Vec<FileMetadata>, ReaderError> {
        let root_metadata = self
            .manifest()?
            .root(root)
            .cloned()
            .ok_or_else(|| ReaderError::UnknownRoot {
                root: root.to_owned(),
            })?;
        let prefix = layout::sources_prefix(root);
        let entries = self.container.entries_under(&prefix)?;
        let policy = self.options.missing_digests;
        let digests = self.digests_for_root(root)?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(relative) = entry.name.strip_prefix(&prefix) else {
                continue;
            };
            let mut record = file_metadata::describe(&root_metadata, relative);
            record.size = entry.size;
            record.last_modified_epoch_millis = entry.last_modified_millis;
            if !record.kind.is_directory() {
                record.digest = digests.digest_of(relative).map(<[u8]>::to_vec);
                if record.digest.is_none() {
                    match policy {
                        MissingDigestPolicy::Warn => warn!("no digest recorded for {}", entry.name),
                        MissingDigestPolicy::Deny => {
                            return Err(ReaderError::MissingDigest { path: entry.name });
                        }
                    }
                }
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Recompute every file digest under `root` with the root's declared
    /// algorithm and compare against its digest index.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownRoot`] if the manifest does not declare
    /// `root`, [`ReaderError::Format`] if its declared algorithm is not
    /// supported, or a container, manifest or digest error.
    pub fn verify_root(&mut self, root: &str) -> Result<VerificationReport, ReaderError> {
        let Some(declared) = self.manifest()?.root(root) else {
            return Err(ReaderError::UnknownRoot {
                root: root.to_owned(),
            });
        };
        let algorithm = DigestAlgorithm::try_from(declared.digest_algorithm.as_str())?;
        let index = self.digests_for_root(root)?.clone();
        let prefix = layout::sources_prefix(root);
        let entries = self.container.entries_under(&prefix)?;

        let mut report = VerificationReport::default();
        let mut present = BTreeSet::new();
        for entry in entries.iter().filter(|e| !e.is_dir) {
            let Some(relative) = entry.name.strip_prefix(&prefix) else {
                continue;
            };
            present.insert(relative);
            let Some(expected) = index.digest_of(relative) else {
                report.missing_digest.push(relative.to_owned());
                continue;
            };
            let actual = self.container.digest_entry(&entry.name, algorithm)?;
            if actual.as_deref() != Some(expected) {
                report.mismatched.push(relative.to_owned());
            }
        }
        report.orphaned = index
            .iter()
            .filter(|(path, _)| !present.contains(path))
            .map(|(path, _)| path.to_owned())
            .collect();

        if report.is_clean() {
            info!("root \"{root}\" verified ({} files)", present.len());
        } else {
            warn!(
                "root \"{root}\" failed verification: {} mismatched, {} undigested, {} orphaned",
                report.mismatched.len(),
                report.missing_digest.len(),
                report.orphaned.len()
            );
        }
        Ok(report)
    }

    /// Release the container.
    pub fn close(self) {
        debug!("closed artifact {}", self.location);
    }
}

/// Read a UTF-8 record, or `None` if the entry is absent.
fn read_text(container: &mut dyn Container, name: &str) -> Result<Option<String>, ReaderError> {
    container
        .read_entry(name)?
        .map(|bytes| {
            String::from_utf8(bytes).map_err(|_| ReaderError::NotUtf8 {
                entry: name.to_owned(),
            })
        })
        .transpose()
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
