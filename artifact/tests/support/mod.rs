//! Shared scratch-space helpers for the behaviour tests.

use avail_artifact::manifest::{ArtifactType, Manifest, ManifestV1};
use avail_artifact::root_metadata::RootMetadata;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// A temporary directory addressed with UTF-8 paths.
pub struct Scratch {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Scratch {
    /// Create an empty scratch directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        Self { _dir: dir, root }
    }

    /// Resolve `relative` inside the scratch directory.
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &[u8]) -> Utf8PathBuf {
        let path = self.path(relative);
        write_file(&path, contents);
        path
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Utf8Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

/// A library manifest declaring the given roots with default metadata.
pub fn library_manifest(roots: &[&str]) -> Manifest {
    let manifest = roots.iter().fold(
        ManifestV1::new(ArtifactType::Library, "behaviour test"),
        |manifest, name| manifest.with_root(RootMetadata::new(*name)),
    );
    Manifest::from(manifest)
}
