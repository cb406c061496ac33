//! Per-root metadata carried inside an artifact manifest.
//!
//! These records are supplied by the project description that drives a
//! build; the artifact layer only stores and returns them. Optional fields
//! fall back to empty values when a manifest omits them:
//!
//! - `description`: empty string.
//! - `entryPoints`: empty list.
//! - `templates`: empty map.
//! - `stylesheet`: empty map.
//! - `palette`: absent.

use crate::digest_algorithm::DigestAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Module file extension used when a root declares none explicitly.
pub const DEFAULT_MODULE_EXTENSION: &str = ".avail";

/// Metadata describing one root bundled in an artifact.
///
/// # Examples
///
/// ```
/// use avail_artifact::root_metadata::RootMetadata;
///
/// let root = RootMetadata::new("avail").with_entry_point("Hello");
/// assert_eq!(root.module_extensions, vec![".avail".to_owned()]);
/// assert_eq!(root.digest_algorithm, "SHA-256");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootMetadata {
    /// Root name, unique within a manifest.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Identifier of the digest algorithm used for this root's index.
    pub digest_algorithm: String,
    /// File suffixes recognised as source modules, including the dot.
    #[serde(rename = "availModuleExtensions")]
    pub module_extensions: Vec<String>,
    /// Entry points exported by the root, in declaration order.
    #[serde(default)]
    pub entry_points: Vec<String>,
    /// Editor template name to expansion text.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    /// Style rule to rendering attributes.
    #[serde(default)]
    pub stylesheet: BTreeMap<String, StyleAttributes>,
    /// Colour palette referenced by the stylesheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Palette>,
}

impl RootMetadata {
    /// Create metadata for `name` with the default extension and algorithm.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            digest_algorithm: DigestAlgorithm::default().as_str().to_owned(),
            module_extensions: vec![DEFAULT_MODULE_EXTENSION.to_owned()],
            entry_points: Vec::new(),
            templates: BTreeMap::new(),
            stylesheet: BTreeMap::new(),
            palette: None,
        }
    }

    /// Replace the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replace the digest algorithm identifier.
    #[must_use]
    pub fn with_digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm.as_str().to_owned();
        self
    }

    /// Replace the module extensions.
    #[must_use]
    pub fn with_module_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Append an entry point.
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_points.push(entry_point.into());
        self
    }

    /// Add or replace a template expansion.
    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>, expansion: impl Into<String>) -> Self {
        self.templates.insert(name.into(), expansion.into());
        self
    }

    /// Return the module extension `name` ends with, if any.
    #[must_use]
    pub fn matching_extension(&self, name: &str) -> Option<&str> {
        self.module_extensions
            .iter()
            .map(String::as_str)
            .find(|ext| !ext.is_empty() && name.len() > ext.len() && name.ends_with(ext))
    }
}

/// Rendering attributes for one style rule.
///
/// Every attribute is optional; absent attributes inherit from the
/// surrounding style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleAttributes {
    /// Foreground colour or palette key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    /// Background colour or palette key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Font family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Bold weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Italic slant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// Underline decoration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// Superscript placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superscript: Option<bool>,
    /// Subscript placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscript: Option<bool>,
    /// Strikethrough decoration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
}

/// Named colours for light and dark editor themes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    /// Colour key to `#rrggbb` value in light mode.
    #[serde(default)]
    pub light_mode_colors: BTreeMap<String, String>,
    /// Colour key to `#rrggbb` value in dark mode.
    #[serde(default)]
    pub dark_mode_colors: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn optional_fields_default_when_absent() {
        let value = json!({
            "name": "avail",
            "digestAlgorithm": "SHA-256",
            "availModuleExtensions": [".avail"],
        });
        let root: RootMetadata = serde_json::from_value(value).expect("decodes");
        assert_eq!(root, RootMetadata::new("avail"));
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let root = RootMetadata::new("avail")
            .with_entry_point("Hello")
            .with_template("fn", "[ … ]");
        let value = serde_json::to_value(&root).expect("encodes");
        let obj = value.as_object().expect("object");
        for key in [
            "name",
            "description",
            "digestAlgorithm",
            "availModuleExtensions",
            "entryPoints",
            "templates",
            "stylesheet",
        ] {
            assert!(obj.contains_key(key), "missing key: {key}");
        }
        assert!(!obj.contains_key("palette"), "absent palette is omitted");
    }

    #[test]
    fn style_attributes_round_trip_sparse_fields() {
        let value = json!({ "foreground": "code", "bold": true });
        let attrs: StyleAttributes = serde_json::from_value(value.clone()).expect("decodes");
        assert_eq!(attrs.bold, Some(true));
        assert_eq!(attrs.italic, None);
        assert_eq!(serde_json::to_value(&attrs).expect("encodes"), value);
    }

    #[rstest]
    #[case::module("Foo.avail", Some(".avail"))]
    #[case::other_extension("Foo.txt", None)]
    #[case::bare_extension(".avail", None)]
    fn matching_extension_requires_a_base_name(#[case] name: &str, #[case] expected: Option<&str>) {
        let root = RootMetadata::new("r");
        assert_eq!(root.matching_extension(name), expected);
    }

    #[test]
    fn multiple_extensions_are_honoured() {
        let root = RootMetadata::new("r").with_module_extensions([".avail", ".av"]);
        assert_eq!(root.matching_extension("x.av"), Some(".av"));
    }
}
