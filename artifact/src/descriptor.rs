//! The descriptor record that identifies a container's packaging kind.
//!
//! Readers load the descriptor before anything else and refuse to continue
//! if it names a kind or version they do not understand. The record is a
//! fixed eight bytes: the schema version, then the packaging kind ordinal,
//! each a big-endian `u32`.

use crate::error::{FormatError, Result};
use crate::schema_version::DESCRIPTOR_VERSIONS;
use std::fmt;

/// Length of a serialised descriptor in bytes.
pub const DESCRIPTOR_LEN: usize = 8;

/// How an artifact's contents are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackagingKind {
    /// An unpacked directory tree with the container layout.
    Directory,
    /// A single zip archive.
    SingleFile,
}

impl PackagingKind {
    const fn ordinal(self) -> u32 {
        match self {
            Self::Directory => 0,
            Self::SingleFile => 1,
        }
    }

    const fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Directory),
            1 => Some(Self::SingleFile),
            _ => None,
        }
    }
}

impl fmt::Display for PackagingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => f.write_str("DIRECTORY"),
            Self::SingleFile => f.write_str("SINGLE_FILE"),
        }
    }
}

/// The decoded descriptor record.
///
/// # Examples
///
/// ```
/// use avail_artifact::descriptor::{Descriptor, PackagingKind};
///
/// let descriptor = Descriptor::current(PackagingKind::SingleFile);
/// let decoded = Descriptor::read(&descriptor.write()).expect("valid record");
/// assert_eq!(decoded, descriptor);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    /// The packaging kind.
    pub kind: PackagingKind,
    /// The descriptor schema version.
    pub schema_version: u32,
}

impl Descriptor {
    /// Build a descriptor for `kind` at the current schema version.
    #[must_use]
    pub const fn current(kind: PackagingKind) -> Self {
        Self {
            kind,
            schema_version: DESCRIPTOR_VERSIONS.current(),
        }
    }

    /// Serialise the record.
    #[must_use]
    pub fn write(&self) -> [u8; DESCRIPTOR_LEN] {
        let mut bytes = [0u8; DESCRIPTOR_LEN];
        let (version, kind) = bytes.split_at_mut(4);
        version.copy_from_slice(&self.schema_version.to_be_bytes());
        kind.copy_from_slice(&self.kind.ordinal().to_be_bytes());
        bytes
    }

    /// Decode a record, failing closed on anything unexpected.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MalformedDescriptor`] for the wrong length,
    /// [`FormatError::UnsupportedDescriptorVersion`] for an unregistered
    /// version, and [`FormatError::UnsupportedPackagingKind`] for an unknown
    /// kind ordinal.
    pub fn read(bytes: &[u8]) -> Result<Self> {
        let fixed: [u8; DESCRIPTOR_LEN] =
            bytes
                .try_into()
                .map_err(|_| FormatError::MalformedDescriptor {
                    expected: DESCRIPTOR_LEN,
                    actual: bytes.len(),
                })?;
        let [v0, v1, v2, v3, k0, k1, k2, k3] = fixed;
        let schema_version = u32::from_be_bytes([v0, v1, v2, v3]);
        let ordinal = u32::from_be_bytes([k0, k1, k2, k3]);

        if !DESCRIPTOR_VERSIONS.contains(i64::from(schema_version)) {
            return Err(FormatError::UnsupportedDescriptorVersion {
                found: schema_version,
                supported: DESCRIPTOR_VERSIONS,
            });
        }
        let kind = PackagingKind::from_ordinal(ordinal)
            .ok_or(FormatError::UnsupportedPackagingKind { ordinal })?;
        Ok(Self {
            kind,
            schema_version,
        })
    }
}
