//! Reserved paths and path rules for the container layout.
//!
//! ```text
//! META-INF/
//! META-INF/MANIFEST.MF
//! avail-artifact-contents/
//! avail-artifact-contents/avail-artifact-descriptor
//! avail-artifact-contents/<root>/Sources/...
//! avail-artifact-contents/<root>/Digests/all_digests.txt
//! avail-artifact-contents/avail-artifact-manifest.json
//! avail-artifact-contents/avail-application-configuration.json
//! ```
//!
//! Entry names always use `/`; directory entries end with `/`.

/// Structural marker directory for single-file containers.
pub const META_INF_DIR: &str = "META-INF/";

/// Implementation metadata entry.
pub const IMPLEMENTATION_MANIFEST: &str = "META-INF/MANIFEST.MF";

/// Directory holding everything artifact-specific.
pub const ARTIFACT_ROOT: &str = "avail-artifact-contents";

/// File name of the descriptor inside [`ARTIFACT_ROOT`].
pub const DESCRIPTOR_FILE_NAME: &str = "avail-artifact-descriptor";

/// File name of the manifest inside [`ARTIFACT_ROOT`].
pub const MANIFEST_FILE_NAME: &str = "avail-artifact-manifest.json";

/// File name of the application configuration inside [`ARTIFACT_ROOT`].
pub const CONFIGURATION_FILE_NAME: &str = "avail-application-configuration.json";

/// Per-root directory holding the source tree.
pub const SOURCES_DIR: &str = "Sources";

/// Per-root digest index location, relative to the root directory.
pub const DIGESTS_FILE: &str = "Digests/all_digests.txt";

/// Name given to a nested artifact's manifest when it is re-rooted.
pub const NESTED_MANIFEST_NAME: &str = "manifest";

/// Name given to a nested artifact's configuration when it is re-rooted.
pub const NESTED_CONFIGURATION_NAME: &str = "configuration";

/// File suffixes that mark a root source as a pre-built archive.
pub const ARCHIVE_SUFFIXES: [&str; 2] = [".jar", ".zip"];

/// Directory entry for [`ARTIFACT_ROOT`].
#[must_use]
pub fn artifact_root_dir() -> String {
    format!("{ARTIFACT_ROOT}/")
}

/// Path of the descriptor.
#[must_use]
pub fn descriptor_path() -> String {
    format!("{ARTIFACT_ROOT}/{DESCRIPTOR_FILE_NAME}")
}

/// Path of the manifest.
#[must_use]
pub fn manifest_path() -> String {
    format!("{ARTIFACT_ROOT}/{MANIFEST_FILE_NAME}")
}

/// Path of the application configuration.
#[must_use]
pub fn configuration_path() -> String {
    format!("{ARTIFACT_ROOT}/{CONFIGURATION_FILE_NAME}")
}

/// Directory prefix under which `root`'s sources live, with trailing `/`.
#[must_use]
pub fn sources_prefix(root: &str) -> String {
    format!("{ARTIFACT_ROOT}/{root}/{SOURCES_DIR}/")
}

/// Path of `root`'s digest index.
#[must_use]
pub fn digests_path(root: &str) -> String {
    format!("{ARTIFACT_ROOT}/{root}/{DIGESTS_FILE}")
}

/// Entry name for a root-relative source path.
///
/// An empty `relative` names the sources directory itself.
#[must_use]
pub fn source_entry(root: &str, relative: &str, is_dir: bool) -> String {
    let mut name = sources_prefix(root);
    if !relative.is_empty() {
        name.push_str(relative);
        if is_dir {
            name.push('/');
        }
    }
    name
}

/// Join a target directory and a relative name into an entry name.
#[must_use]
pub fn join_entry(directory: &str, relative: &str, is_dir: bool) -> String {
    let directory = directory.trim_matches('/');
    let mut name = match (directory.is_empty(), relative.is_empty()) {
        (true, _) => relative.to_owned(),
        (false, true) => directory.to_owned(),
        (false, false) => format!("{directory}/{relative}"),
    };
    if is_dir && !name.is_empty() {
        name.push('/');
    }
    name
}

/// Whether `name` ends in one of the [`ARCHIVE_SUFFIXES`].
#[must_use]
pub fn has_archive_suffix(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ARCHIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// How a nested artifact's entry is placed in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedPlacement {
    /// Structural marker; never copied.
    Drop,
    /// Copied under a new, namespaced name.
    Rename(String),
    /// Copied verbatim.
    Verbatim,
}

/// Decide where an entry of the nested artifact `simple_name` goes.
///
/// # Examples
///
/// ```
/// use avail_artifact::layout::{place_nested_entry, NestedPlacement};
///
/// assert_eq!(place_nested_entry("lib", "META-INF/"), NestedPlacement::Drop);
/// assert_eq!(
///     place_nested_entry("lib", "avail-artifact-contents/avail-artifact-manifest.json"),
///     NestedPlacement::Rename("avail-artifact-contents/lib/manifest".to_owned()),
/// );
/// ```
#[must_use]
pub fn place_nested_entry(simple_name: &str, entry: &str) -> NestedPlacement {
    if entry == META_INF_DIR || entry == artifact_root_dir() {
        NestedPlacement::Drop
    } else if entry == IMPLEMENTATION_MANIFEST {
        NestedPlacement::Rename(format!("META-INF/{simple_name}/MANIFEST.MF"))
    } else if entry == descriptor_path() {
        NestedPlacement::Rename(format!(
            "{ARTIFACT_ROOT}/{simple_name}/{DESCRIPTOR_FILE_NAME}"
        ))
    } else if entry == manifest_path() {
        NestedPlacement::Rename(format!(
            "{ARTIFACT_ROOT}/{simple_name}/{NESTED_MANIFEST_NAME}"
        ))
    } else if entry == configuration_path() {
        NestedPlacement::Rename(format!(
            "{ARTIFACT_ROOT}/{simple_name}/{NESTED_CONFIGURATION_NAME}"
        ))
    } else {
        NestedPlacement::Verbatim
    }
}
