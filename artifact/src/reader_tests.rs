//! Tests for artifact reading.

use super::*;
use crate::builder::{ArtifactBuilder, BuilderParams};
use crate::configuration::ConfigurationV1;
use crate::container::MockContainer;
use crate::descriptor::PackagingKind;
use crate::digest_algorithm::DigestAlgorithm;
use crate::error::FormatError;
use crate::file_metadata::{FileKind, MODULE_MIME_TYPE};
use crate::manifest::ManifestV1;
use crate::root_metadata::RootMetadata;
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

struct Scratch {
    _dir: TempDir,
    root: Utf8PathBuf,
}

#[fixture]
fn scratch() -> Scratch {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
    Scratch { _dir: dir, root }
}

fn write(path: &Utf8Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write");
}

fn avail_manifest(artifact_type: ArtifactType) -> Manifest {
    Manifest::from(ManifestV1::new(artifact_type, "sample").with_root(RootMetadata::new("avail")))
}

/// Build a single-file library with `a.avail` and `b.avail` in root "avail".
fn two_module_artifact(scratch: &Scratch) -> Utf8PathBuf {
    write(&scratch.root.join("src/a.avail"), b"Module \"a\"");
    write(&scratch.root.join("src/b.avail"), b"Module \"b\"");
    let output = scratch.root.join("library.jar");
    let params = BuilderParams::new("Sample", "1", avail_manifest(ArtifactType::Library));
    let mut builder = ArtifactBuilder::open(&output, params).expect("open");
    builder
        .add_root("avail", &scratch.root.join("src"), DigestAlgorithm::Sha256)
        .expect("add root");
    builder.finish().expect("finish")
}

/// Lay out an unpacked artifact by hand.
fn unpacked_artifact(scratch: &Scratch, files: &[(&str, &str)], digests: &str) -> Utf8PathBuf {
    let base = scratch.root.join("unpacked");
    write(
        &base.join(layout::descriptor_path()),
        &Descriptor::current(PackagingKind::Directory).write(),
    );
    let manifest = avail_manifest(ArtifactType::Library)
        .to_json()
        .expect("encodes");
    write(&base.join(layout::manifest_path()), manifest.as_bytes());
    let sources = layout::sources_prefix("avail");
    fs::create_dir_all(base.join(&sources)).expect("sources dir");
    for (relative, contents) in files {
        write(&base.join(format!("{sources}{relative}")), contents.as_bytes());
    }
    write(&base.join(layout::digests_path("avail")), digests.as_bytes());
    base
}

fn digest_line(path: &str, contents: &str) -> String {
    format!(
        "{path}:{}\n",
        hex::encode(DigestAlgorithm::Sha256.digest_bytes(contents.as_bytes()))
    )
}

#[rstest]
fn reads_back_two_module_scenario(scratch: Scratch) {
    let output = two_module_artifact(&scratch);
    let mut reader = ArtifactReader::open(&output).expect("opens");
    assert_eq!(reader.descriptor().kind, PackagingKind::SingleFile);

    let root = reader
        .manifest()
        .expect("manifest")
        .root("avail")
        .expect("root declared")
        .clone();
    assert_eq!(root.module_extensions, [".avail"]);

    let digests = reader.digests_for_root("avail").expect("digests").clone();
    assert_eq!(digests.len(), 2);
    assert_eq!(
        digests.digest_of("a.avail"),
        Some(DigestAlgorithm::Sha256.digest_bytes(b"Module \"a\"").as_slice())
    );
    assert_eq!(
        digests.digest_of("b.avail"),
        Some(DigestAlgorithm::Sha256.digest_bytes(b"Module \"b\"").as_slice())
    );

    let records = reader.file_metadata_for_root("avail").expect("metadata");
    let modules: Vec<&FileMetadata> = records
        .iter()
        .filter(|r| r.kind == FileKind::Module)
        .collect();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules.len(), records.len());
    for module in modules {
        assert_eq!(module.mime_type, Some(MODULE_MIME_TYPE));
        assert!(module.digest.is_some());
        assert!(module.qualified_name.starts_with("/avail/"));
        assert_eq!(module.size, 10);
    }
    assert!(reader.verify_root("avail").expect("verifies").is_clean());
    reader.close();
}

#[rstest]
fn library_has_no_configuration(scratch: Scratch) {
    let output = two_module_artifact(&scratch);
    let mut reader = ArtifactReader::open(&output).expect("opens");
    assert_eq!(reader.configuration().expect("reads"), None);
}

#[rstest]
fn application_configuration_is_read(scratch: Scratch) {
    let configuration = ApplicationConfiguration::from(ConfigurationV1 {
        included_roots: vec!["avail".to_owned()],
        root_renames: Vec::new(),
    });
    let output = scratch.root.join("app.jar");
    let params = BuilderParams::new("App", "1", avail_manifest(ArtifactType::Application))
        .with_configuration(configuration.clone());
    let mut builder = ArtifactBuilder::open(&output, params).expect("open");
    builder.finish().expect("finish");

    let mut reader = ArtifactReader::open(&output).expect("opens");
    assert_eq!(reader.configuration().expect("reads"), Some(&configuration));
}

#[rstest]
fn undeclared_root_is_unknown(scratch: Scratch) {
    let output = two_module_artifact(&scratch);
    let mut reader = ArtifactReader::open(&output).expect("opens");
    assert!(matches!(
        reader.file_metadata_for_root("missing"),
        Err(ReaderError::UnknownRoot { root }) if root == "missing"
    ));
    assert!(matches!(
        reader.digests_for_root("missing"),
        Err(ReaderError::DigestNotFound { .. })
    ));
}

#[rstest]
fn unpacked_tree_is_read_as_directory(scratch: Scratch) {
    let digests = digest_line("P.avail/P.avail", "p") + &digest_line("P.avail/Q.avail", "q");
    let base = unpacked_artifact(
        &scratch,
        &[("P.avail/P.avail", "p"), ("P.avail/Q.avail", "q")],
        &digests,
    );
    let mut reader = ArtifactReader::open(&base).expect("opens");
    assert_eq!(reader.descriptor().kind, PackagingKind::Directory);
    let kinds: Vec<(String, FileKind)> = reader
        .file_metadata_for_root("avail")
        .expect("metadata")
        .into_iter()
        .map(|r| (r.qualified_name, r.kind))
        .collect();
    assert_eq!(
        kinds,
        [
            ("/avail/P".to_owned(), FileKind::Package),
            ("/avail/P/P".to_owned(), FileKind::PackageRepresentative),
            ("/avail/P/Q".to_owned(), FileKind::Module),
        ]
    );
}

#[rstest]
fn missing_digest_warns_by_default(scratch: Scratch) {
    let base = unpacked_artifact(
        &scratch,
        &[("a.avail", "a"), ("b.avail", "b")],
        &digest_line("a.avail", "a"),
    );
    let mut reader = ArtifactReader::open(&base).expect("opens");
    let records = reader.file_metadata_for_root("avail").expect("tolerated");
    let b = records
        .iter()
        .find(|r| r.relative_path == "b.avail")
        .expect("b listed");
    assert_eq!(b.digest, None);
}

#[rstest]
fn missing_digest_can_be_denied(scratch: Scratch) {
    let base = unpacked_artifact(
        &scratch,
        &[("a.avail", "a"), ("b.avail", "b")],
        &digest_line("a.avail", "a"),
    );
    let options = ReaderOptions {
        missing_digests: MissingDigestPolicy::Deny,
    };
    let mut reader = ArtifactReader::open_with(&base, options).expect("opens");
    assert!(matches!(
        reader.file_metadata_for_root("avail"),
        Err(ReaderError::MissingDigest { path }) if path.ends_with("Sources/b.avail")
    ));
}

#[rstest]
fn verification_reports_every_discrepancy(scratch: Scratch) {
    let digests = digest_line("a.avail", "original")
        + &digest_line("gone.avail", "gone")
        + &digest_line("ok.avail", "ok");
    let base = unpacked_artifact(
        &scratch,
        &[("a.avail", "tampered"), ("new.avail", "new"), ("ok.avail", "ok")],
        &digests,
    );
    let mut reader = ArtifactReader::open(&base).expect("opens");
    let report = reader.verify_root("avail").expect("verifies");
    assert_eq!(
        report,
        VerificationReport {
            mismatched: vec!["a.avail".to_owned()],
            missing_digest: vec!["new.avail".to_owned()],
            orphaned: vec!["gone.avail".to_owned()],
        }
    );
    assert!(!report.is_clean());
}

#[rstest]
fn unregistered_manifest_version_is_rejected(scratch: Scratch) {
    let base = unpacked_artifact(&scratch, &[], "");
    let manifest_path = base.join(layout::manifest_path());
    let text = fs::read_to_string(&manifest_path).expect("read manifest");
    let mut value: serde_json::Value = serde_json::from_str(&text).expect("json");
    value["artifactVersion"] = serde_json::json!(2);
    fs::write(&manifest_path, value.to_string()).expect("rewrite");

    let mut reader = ArtifactReader::open(&base).expect("opens");
    assert!(matches!(
        reader.manifest(),
        Err(ReaderError::Format(FormatError::UnknownManifestVersion { found: 2, .. }))
    ));
}

#[rstest]
fn verification_rejects_an_unsupported_declared_algorithm(scratch: Scratch) {
    let base = unpacked_artifact(&scratch, &[("a.avail", "a")], &digest_line("a.avail", "a"));
    let mut root = RootMetadata::new("avail");
    root.digest_algorithm = "MD5".to_owned();
    let manifest = Manifest::from(ManifestV1::new(ArtifactType::Library, "md5").with_root(root))
        .to_json()
        .expect("encodes");
    fs::write(base.join(layout::manifest_path()), manifest).expect("rewrite");

    let mut reader = ArtifactReader::open(&base).expect("opens");
    assert!(matches!(
        reader.verify_root("avail"),
        Err(ReaderError::Format(FormatError::UnsupportedAlgorithm { name, .. })) if name == "MD5"
    ));
}

#[rstest]
fn non_archive_is_corrupt(scratch: Scratch) {
    let path = scratch.root.join("plain.jar");
    write(&path, b"not a zip");
    assert!(matches!(
        ArtifactReader::open(&path),
        Err(ReaderError::CorruptArtifact { .. })
    ));
}

#[rstest]
fn descriptor_kind_must_match_container(scratch: Scratch) {
    let base = unpacked_artifact(&scratch, &[], "");
    write(
        &base.join(layout::descriptor_path()),
        &Descriptor::current(PackagingKind::SingleFile).write(),
    );
    let err = ArtifactReader::open(&base).expect_err("must fail closed");
    assert!(matches!(err, ReaderError::CorruptArtifact { reason, .. } if reason.contains("SINGLE_FILE")));
}

fn mock_with_descriptor(kind: PackagingKind) -> MockContainer {
    let mut container = MockContainer::new();
    container.expect_kind().return_const(kind);
    container
        .expect_read_entry()
        .withf(|name| name == layout::descriptor_path())
        .returning(move |_| Ok(Some(Descriptor::current(kind).write().to_vec())));
    container
}

#[test]
fn missing_descriptor_is_corrupt() {
    let mut container = MockContainer::new();
    container.expect_read_entry().returning(|_| Ok(None));
    let result = ArtifactReader::with_container(
        Utf8Path::new("mock.jar"),
        Box::new(container),
        ReaderOptions::default(),
    );
    assert!(matches!(
        result,
        Err(ReaderError::CorruptArtifact { reason, .. }) if reason == "missing descriptor"
    ));
}

#[test]
fn manifest_is_loaded_once() {
    let mut container = mock_with_descriptor(PackagingKind::SingleFile);
    let json = avail_manifest(ArtifactType::Library)
        .to_json()
        .expect("encodes");
    container
        .expect_read_entry()
        .withf(|name| name == layout::manifest_path())
        .times(1)
        .returning(move |_| Ok(Some(json.clone().into_bytes())));
    let mut reader = ArtifactReader::with_container(
        Utf8Path::new("mock.jar"),
        Box::new(container),
        ReaderOptions::default(),
    )
    .expect("opens");
    let first = reader.manifest().expect("loads").clone();
    let second = reader.manifest().expect("memoised").clone();
    assert_eq!(first, second);
}

#[test]
fn absent_manifest_is_reported() {
    let mut container = mock_with_descriptor(PackagingKind::SingleFile);
    container
        .expect_read_entry()
        .withf(|name| name == layout::manifest_path())
        .returning(|_| Ok(None));
    let mut reader = ArtifactReader::with_container(
        Utf8Path::new("mock.jar"),
        Box::new(container),
        ReaderOptions::default(),
    )
    .expect("opens");
    assert!(matches!(
        reader.manifest(),
        Err(ReaderError::ManifestNotFound { .. })
    ));
}
