//! Registered schema version ranges for every versioned artifact record.
//!
//! Each record type keeps its own closed range. Adding a new version means
//! raising `max` here *and* adding a decoder arm to the record's dispatch
//! `match`; the range is never widened on its own.

use std::fmt;

/// An inclusive range of schema versions with registered decoders.
///
/// # Examples
///
/// ```
/// use avail_artifact::schema_version::MANIFEST_VERSIONS;
///
/// assert!(MANIFEST_VERSIONS.contains(1));
/// assert!(!MANIFEST_VERSIONS.contains(0));
/// assert!(!MANIFEST_VERSIONS.contains(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    min: u32,
    max: u32,
}

impl VersionRange {
    /// Build a range from its inclusive bounds.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Return the oldest readable version.
    #[must_use]
    pub const fn min(self) -> u32 {
        self.min
    }

    /// Return the current version; writers always emit this one.
    #[must_use]
    pub const fn current(self) -> u32 {
        self.max
    }

    /// Return whether `version` has a registered decoder.
    #[must_use]
    pub fn contains(self, version: i64) -> bool {
        i64::from(self.min) <= version && version <= i64::from(self.max)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}..={}", self.min, self.max)
        }
    }
}

/// Versions of the artifact manifest (`artifactVersion`).
pub const MANIFEST_VERSIONS: VersionRange = VersionRange::new(1, 1);

/// Versions of the application configuration (`configurationVersion`).
pub const CONFIGURATION_VERSIONS: VersionRange = VersionRange::new(1, 1);

/// Versions of the binary descriptor record.
pub const DESCRIPTOR_VERSIONS: VersionRange = VersionRange::new(1, 1);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, false)]
    #[case::one(1, true)]
    #[case::two(2, false)]
    #[case::negative(-1, false)]
    fn manifest_range_is_closed(#[case] version: i64, #[case] expected: bool) {
        assert_eq!(MANIFEST_VERSIONS.contains(version), expected);
    }

    #[test]
    fn current_is_upper_bound() {
        let range = VersionRange::new(1, 3);
        assert_eq!(range.current(), 3);
        assert_eq!(range.min(), 1);
    }

    #[rstest]
    #[case::single(VersionRange::new(1, 1), "1")]
    #[case::span(VersionRange::new(1, 3), "1..=3")]
    fn display_formats_range(#[case] range: VersionRange, #[case] expected: &str) {
        assert_eq!(range.to_string(), expected);
    }
}
