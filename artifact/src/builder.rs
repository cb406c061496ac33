//! Assemble an artifact container.
//!
//! An [`ArtifactBuilder`] stages a zip container next to the requested
//! output path, merges source roots, nested artifacts and loose files into
//! it, and publishes it with a rename in [`ArtifactBuilder::finish`]. Entry
//! names are write-once: the first writer of a path wins and later writers
//! are skipped with a `debug` log.
//!
//! Nothing exists at the output path until `finish` succeeds, so a container
//! under construction cannot be opened by a reader.

use crate::builder_error::BuilderError;
use crate::config::PackagingConfig;
use crate::configuration::ApplicationConfiguration;
use crate::descriptor::{Descriptor, PackagingKind};
use crate::digest_algorithm::DigestAlgorithm;
use crate::digest_index::DigestIndex;
use crate::layout::{self, NestedPlacement};
use crate::manifest::{ArtifactType, Manifest};
use crate::timestamp::{from_zip_datetime, system_time_millis, to_zip_datetime};
use crate::tree;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::time::SystemTime;
use tempfile::TempPath;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Inputs for [`ArtifactBuilder::open`].
///
/// Groups everything the container needs up front so the constructor stays
/// within Clippy's parameter limit.
#[derive(Debug, Clone)]
pub struct BuilderParams {
    /// `Implementation-Title` attribute.
    pub implementation_title: String,
    /// `Implementation-Version` attribute.
    pub implementation_version: String,
    /// Manifest written at [`ArtifactBuilder::finish`].
    pub manifest: Manifest,
    /// Optional `Main-Class` attribute.
    pub main_entry_point: Option<String>,
    /// Additional attributes, written in order after the standard ones.
    pub extra_metadata: Vec<(String, String)>,
    /// Configuration for application artifacts; must be `None` for libraries.
    pub configuration: Option<ApplicationConfiguration>,
    /// Entry encoding settings.
    pub packaging: PackagingConfig,
}

impl BuilderParams {
    /// Parameters with no entry point, no extra metadata, no configuration
    /// and default packaging.
    #[must_use]
    pub fn new(
        implementation_title: impl Into<String>,
        implementation_version: impl Into<String>,
        manifest: Manifest,
    ) -> Self {
        Self {
            implementation_title: implementation_title.into(),
            implementation_version: implementation_version.into(),
            manifest,
            main_entry_point: None,
            extra_metadata: Vec::new(),
            configuration: None,
            packaging: PackagingConfig::default(),
        }
    }

    /// Set the `Main-Class` attribute.
    #[must_use]
    pub fn with_main_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.main_entry_point = Some(entry_point.into());
        self
    }

    /// Append an extra implementation attribute.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_metadata.push((key.into(), value.into()));
        self
    }

    /// Attach an application configuration.
    #[must_use]
    pub fn with_configuration(mut self, configuration: ApplicationConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Replace the packaging settings.
    #[must_use]
    pub fn with_packaging(mut self, packaging: PackagingConfig) -> Self {
        self.packaging = packaging;
        self
    }
}

type OutputWriter = ZipWriter<BufWriter<File>>;

/// The staged container; dropping it deletes the temporary file.
struct Staged {
    writer: OutputWriter,
    temp_path: TempPath,
}

/// Builds a single-file artifact container.
///
/// Every operation takes `&mut self`. Once [`Self::finish`] has been
/// called, successfully or not, all operations fail with
/// [`BuilderError::BuilderClosed`].
pub struct ArtifactBuilder {
    output: Utf8PathBuf,
    staged: Option<Staged>,
    manifest: Manifest,
    configuration: Option<ApplicationConfiguration>,
    packaging: PackagingConfig,
    written: BTreeSet<String>,
    reserved: BTreeSet<String>,
    roots: BTreeSet<String>,
}

impl std::fmt::Debug for ArtifactBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBuilder")
            .field("output", &self.output)
            .field("closed", &self.staged.is_none())
            .field("written", &self.written.len())
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl ArtifactBuilder {
    /// Stage a new container for `output` and write its structural entries.
    ///
    /// Nothing appears at `output` until [`Self::finish`] succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::UnexpectedConfiguration`] if a configuration
    /// accompanies a library manifest, [`BuilderError::CannotCreateOutput`]
    /// if the staging file cannot be created, and [`BuilderError::Zip`] if
    /// the structural entries cannot be written.
    pub fn open(output: &Utf8Path, params: BuilderParams) -> Result<Self, BuilderError> {
        if params.configuration.is_some()
            && params.manifest.artifact_type() == ArtifactType::Library
        {
            return Err(BuilderError::UnexpectedConfiguration);
        }
        let implementation = implementation_manifest(&params);
        let (file, temp_path) = stage_output(output)?;
        let mut builder = Self {
            output: output.to_owned(),
            staged: Some(Staged {
                writer: ZipWriter::new(BufWriter::new(file)),
                temp_path,
            }),
            reserved: [layout::manifest_path(), layout::configuration_path()]
                .into_iter()
                .collect(),
            manifest: params.manifest,
            configuration: params.configuration,
            packaging: params.packaging,
            written: BTreeSet::new(),
            roots: BTreeSet::new(),
        };

        let descriptor = Descriptor::current(PackagingKind::SingleFile).write();
        let mut sink = builder.sink()?;
        sink.directory(layout::META_INF_DIR, None)?;
        sink.bytes(layout::IMPLEMENTATION_MANIFEST, implementation.as_bytes())?;
        sink.directory(&layout::artifact_root_dir(), None)?;
        sink.bytes(&layout::descriptor_path(), &descriptor)?;
        debug!("staged artifact container for {output}");
        Ok(builder)
    }

    /// Add a source root.
    ///
    /// An archive source (see [`layout::has_archive_suffix`]) is merged with
    /// [`Self::add_nested_archive`]. A directory is copied under the root's
    /// `Sources/` directory and its digest index is written alongside.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::NotADirectory`] for any other source,
    /// [`BuilderError::RootAlreadyPresent`] if the root was already written,
    /// [`BuilderError::AlgorithmMismatch`] if the manifest declares a
    /// different algorithm for the root, or a walk, digest or write error.
    pub fn add_root(
        &mut self,
        root_name: &str,
        source: &Utf8Path,
        algorithm: DigestAlgorithm,
    ) -> Result<(), BuilderError> {
        self.ensure_open()?;
        if layout::has_archive_suffix(source.as_str()) {
            return self.add_nested_archive(source);
        }
        if !source.is_dir() {
            return Err(BuilderError::NotADirectory {
                path: source.to_owned(),
            });
        }
        let digests_path = layout::digests_path(root_name);
        if self.roots.contains(root_name) || self.written.contains(&digests_path) {
            return Err(BuilderError::RootAlreadyPresent {
                root: root_name.to_owned(),
            });
        }
        if let Some(declared) = self.manifest.root(root_name) {
            let declared = DigestAlgorithm::try_from(declared.digest_algorithm.as_str())?;
            if declared != algorithm {
                return Err(BuilderError::AlgorithmMismatch {
                    root: root_name.to_owned(),
                    declared,
                    requested: algorithm,
                });
            }
        } else {
            warn!("root \"{root_name}\" is not declared in the manifest");
        }

        let index = DigestIndex::compute(source, algorithm)?;
        let entries = tree::walk(source)?;
        let mut sink = self.sink()?;
        for entry in &entries {
            let name = layout::source_entry(root_name, &entry.relative, entry.is_dir);
            if entry.is_dir {
                sink.directory(&name, modified_millis(&entry.path))?;
            } else {
                sink.file(&name, &entry.path)?;
            }
        }
        sink.bytes(&digests_path, index.serialize().as_bytes())?;
        self.roots.insert(root_name.to_owned());
        info!(
            "added root \"{root_name}\" from {source} ({} digests, {algorithm})",
            index.len()
        );
        Ok(())
    }

    /// Add a source root using the algorithm its manifest entry declares,
    /// falling back to the configured default for undeclared roots.
    ///
    /// # Errors
    ///
    /// As [`Self::add_root`], plus [`BuilderError::Format`] if the configured
    /// default algorithm is unknown.
    pub fn add_declared_root(
        &mut self,
        root_name: &str,
        source: &Utf8Path,
    ) -> Result<(), BuilderError> {
        let algorithm = self.manifest.root(root_name).map_or_else(
            || self.packaging.default_algorithm(),
            |root| DigestAlgorithm::try_from(root.digest_algorithm.as_str()),
        )?;
        self.add_root(root_name, source, algorithm)
    }

    /// Merge another artifact container, re-rooting its reserved entries
    /// under the archive's file stem.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::InvalidArchive`] if the archive cannot be
    /// read, [`BuilderError::PathTraversal`] if any entry name is absolute or
    /// contains `..`, or a write error.
    pub fn add_nested_archive(&mut self, archive: &Utf8Path) -> Result<(), BuilderError> {
        let simple_name = archive.file_stem().unwrap_or(archive.as_str()).to_owned();
        let copied = self.merge_archive(archive, |entry| {
            match layout::place_nested_entry(&simple_name, entry) {
                NestedPlacement::Drop => None,
                NestedPlacement::Rename(name) => Some(name),
                NestedPlacement::Verbatim => Some(entry.to_owned()),
            }
        })?;
        info!("merged nested artifact {archive} as \"{simple_name}\" ({copied} entries)");
        Ok(())
    }

    /// Copy every entry of an arbitrary zip archive with no renaming.
    ///
    /// # Errors
    ///
    /// As [`Self::add_nested_archive`].
    pub fn add_raw_archive(&mut self, archive: &Utf8Path) -> Result<(), BuilderError> {
        let copied = self.merge_archive(archive, |entry| Some(entry.to_owned()))?;
        info!("merged raw archive {archive} ({copied} entries)");
        Ok(())
    }

    /// Add a single file under `target_directory`; an empty target means the
    /// container root.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::Io`] if the file cannot be read, or a write
    /// error.
    pub fn add_file(&mut self, file: &Utf8Path, target_directory: &str) -> Result<(), BuilderError> {
        self.ensure_open()?;
        let file_name = file.file_name().ok_or_else(|| BuilderError::Io {
            path: file.to_owned(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let name = layout::join_entry(target_directory, file_name, false);
        self.sink()?.file(&name, file)?;
        Ok(())
    }

    /// Add a loose tree under `target_directory`.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::NotADirectory`] if `directory` is not one, or
    /// a walk, read or write error.
    pub fn add_directory(
        &mut self,
        directory: &Utf8Path,
        target_directory: &str,
    ) -> Result<(), BuilderError> {
        self.ensure_open()?;
        if !directory.is_dir() {
            return Err(BuilderError::NotADirectory {
                path: directory.to_owned(),
            });
        }
        let entries = tree::walk(directory)?;
        let mut sink = self.sink()?;
        for entry in &entries {
            let name = layout::join_entry(target_directory, &entry.relative, entry.is_dir);
            if entry.is_dir {
                sink.directory(&name, modified_millis(&entry.path))?;
            } else {
                sink.file(&name, &entry.path)?;
            }
        }
        Ok(())
    }

    /// Write the manifest and configuration, finalise the container and
    /// rename it onto the output path.
    ///
    /// The builder is closed afterwards whatever the outcome; on failure the
    /// staged file is removed.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::BuilderClosed`] if already finished,
    /// [`BuilderError::Format`] if the configuration names undeclared roots,
    /// or a write or [`BuilderError::Persist`] error.
    pub fn finish(&mut self) -> Result<Utf8PathBuf, BuilderError> {
        let Staged {
            mut writer,
            temp_path,
        } = self.staged.take().ok_or(BuilderError::BuilderClosed)?;

        let manifest_json = self.manifest.to_json()?;
        let configuration_json = match self.manifest.artifact_type() {
            ArtifactType::Library => None,
            ArtifactType::Application => {
                let configuration = self.configuration.clone().unwrap_or_default();
                configuration.validate_against(&self.manifest)?;
                Some(configuration.to_json()?)
            }
        };

        let mut sink = EntrySink {
            writer: &mut writer,
            written: &mut self.written,
            reserved: &self.reserved,
            packaging: &self.packaging,
        };
        sink.reserved_bytes(&layout::manifest_path(), manifest_json.as_bytes())?;
        if let Some(json) = configuration_json {
            sink.reserved_bytes(&layout::configuration_path(), json.as_bytes())?;
        }

        let file = writer
            .finish()?
            .into_inner()
            .map_err(|e| BuilderError::Persist {
                path: self.output.clone(),
                source: e.into_error(),
            })?;
        file.sync_all().map_err(|source| BuilderError::Persist {
            path: self.output.clone(),
            source,
        })?;
        drop(file);
        temp_path
            .persist(&self.output)
            .map_err(|e| BuilderError::Persist {
                path: self.output.clone(),
                source: e.error,
            })?;
        info!(
            "published artifact {} ({} entries)",
            self.output,
            self.written.len()
        );
        Ok(self.output.clone())
    }

    /// Paths written so far, in sorted order.
    #[must_use]
    pub fn written_paths(&self) -> &BTreeSet<String> {
        &self.written
    }

    /// The manifest this builder will publish.
    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Whether [`Self::finish`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.staged.is_none()
    }

    fn ensure_open(&self) -> Result<(), BuilderError> {
        if self.staged.is_some() {
            Ok(())
        } else {
            Err(BuilderError::BuilderClosed)
        }
    }

    fn sink(&mut self) -> Result<EntrySink<'_>, BuilderError> {
        let staged = self.staged.as_mut().ok_or(BuilderError::BuilderClosed)?;
        Ok(EntrySink {
            writer: &mut staged.writer,
            written: &mut self.written,
            reserved: &self.reserved,
            packaging: &self.packaging,
        })
    }

    /// Copy entries of `archive`, mapping each name through `place`.
    /// Returns the number of entries written.
    fn merge_archive(
        &mut self,
        archive: &Utf8Path,
        place: impl Fn(&str) -> Option<String>,
    ) -> Result<usize, BuilderError> {
        self.ensure_open()?;
        let invalid = |source| BuilderError::InvalidArchive {
            path: archive.to_owned(),
            source,
        };
        let file = File::open(archive).map_err(|source| BuilderError::Io {
            path: archive.to_owned(),
            source,
        })?;
        let mut input = ZipArchive::new(BufReader::new(file)).map_err(invalid)?;
        if let Some(entry) = input.file_names().find(|name| escapes_root(name)) {
            return Err(BuilderError::PathTraversal {
                archive: archive.to_owned(),
                entry: entry.to_owned(),
            });
        }
        let mut sink = self.sink()?;
        let mut copied = 0;
        for index in 0..input.len() {
            let mut entry = input.by_index(index).map_err(invalid)?;
            let Some(target) = place(entry.name()) else {
                debug!("dropping structural entry {}", entry.name());
                continue;
            };
            let modified = entry.last_modified().map(from_zip_datetime);
            let wrote = if entry.is_dir() {
                sink.directory(&target, modified)?
            } else {
                sink.stream(&target, modified, &mut entry)?
            };
            copied += usize::from(wrote);
        }
        Ok(copied)
    }
}

/// Write access to the staged container plus the write-once bookkeeping.
struct EntrySink<'a> {
    writer: &'a mut OutputWriter,
    written: &'a mut BTreeSet<String>,
    reserved: &'a BTreeSet<String>,
    packaging: &'a PackagingConfig,
}

impl EntrySink<'_> {
    /// Record `name` as written, or return `false` if it is taken.
    fn claim(&mut self, name: &str) -> bool {
        if self.reserved.contains(name) || self.written.contains(name) {
            debug!("skipping {name}: path already written");
            return false;
        }
        self.written.insert(name.to_owned());
        true
    }

    fn options(&self, modified: Option<i64>) -> SimpleFileOptions {
        let stamp = modified
            .filter(|_| self.packaging.preserve_timestamps)
            .and_then(to_zip_datetime)
            .unwrap_or_default();
        self.packaging.entry_options().last_modified_time(stamp)
    }

    fn directory(&mut self, name: &str, modified: Option<i64>) -> Result<bool, BuilderError> {
        if name.is_empty() || !self.claim(name) {
            return Ok(false);
        }
        let options = self.options(modified);
        self.writer.add_directory(name.to_owned(), options)?;
        Ok(true)
    }

    fn stream(
        &mut self,
        name: &str,
        modified: Option<i64>,
        reader: &mut impl Read,
    ) -> Result<bool, BuilderError> {
        if !self.claim(name) {
            return Ok(false);
        }
        let options = self.options(modified);
        self.writer.start_file(name.to_owned(), options)?;
        io::copy(reader, &mut *self.writer).map_err(|source| BuilderError::Copy {
            entry: name.to_owned(),
            source,
        })?;
        Ok(true)
    }

    fn file(&mut self, name: &str, path: &Utf8Path) -> Result<bool, BuilderError> {
        let read_error = |source| BuilderError::Io {
            path: path.to_owned(),
            source,
        };
        let mut file = File::open(path).map_err(read_error)?;
        self.stream(name, modified_millis(path), &mut file)
    }

    fn bytes(&mut self, name: &str, data: &[u8]) -> Result<bool, BuilderError> {
        if !self.claim(name) {
            return Ok(false);
        }
        self.write_entry(name, data)?;
        Ok(true)
    }

    /// Write one of the reserved paths, which only `finish` may do.
    fn reserved_bytes(&mut self, name: &str, data: &[u8]) -> Result<(), BuilderError> {
        self.written.insert(name.to_owned());
        self.write_entry(name, data)
    }

    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<(), BuilderError> {
        let options = self.options(system_time_millis(SystemTime::now()));
        self.writer.start_file(name.to_owned(), options)?;
        self.writer
            .write_all(data)
            .map_err(|source| BuilderError::Copy {
                entry: name.to_owned(),
                source,
            })
    }
}

/// Create the staging file beside `output` so the final rename stays on one
/// filesystem.
fn stage_output(output: &Utf8Path) -> Result<(File, TempPath), BuilderError> {
    let cannot_create = |source| BuilderError::CannotCreateOutput {
        path: output.to_owned(),
        source,
    };
    let file_name = output.file_name().ok_or_else(|| {
        cannot_create(io::Error::new(
            io::ErrorKind::InvalidInput,
            "output path has no file name",
        ))
    })?;
    let parent = output
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    let prefix = format!(".{file_name}.");
    let staged = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".partial")
        .tempfile_in(parent)
        .map_err(cannot_create)?;
    Ok(staged.into_parts())
}

/// Render `META-INF/MANIFEST.MF`.
fn implementation_manifest(params: &BuilderParams) -> String {
    let mut attributes = vec![
        ("Manifest-Version", "1.0"),
        ("Implementation-Title", params.implementation_title.as_str()),
        (
            "Implementation-Version",
            params.implementation_version.as_str(),
        ),
    ];
    if let Some(main) = &params.main_entry_point {
        attributes.push(("Main-Class", main.as_str()));
    }
    attributes.extend(
        params
            .extra_metadata
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );
    let mut text: String = attributes
        .into_iter()
        .map(|(key, value)| format!("{key}: {value}\n"))
        .collect();
    text.push('\n');
    text
}

/// Whether an archive entry name is absolute or steps above the container
/// root through a `..` segment.
fn escapes_root(name: &str) -> bool {
    name.starts_with(['/', '\\'])
        || name.split(['/', '\\']).any(|segment| segment == "..")
}

fn modified_millis(path: &Utf8Path) -> Option<i64> {
    let modified = path.metadata().and_then(|m| m.modified()).ok()?;
    system_time_millis(modified)
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
