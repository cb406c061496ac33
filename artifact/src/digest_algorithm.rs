//! Digest algorithms available for per-root digest indices.
//!
//! Roots name their algorithm with a string identifier in the manifest
//! (`"SHA-256"` by default). Only the SHA-2 family is supported; anything
//! else is rejected rather than guessed.

use crate::error::{FormatError, Result};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::io::{self, Read};

/// Read buffer size used while hashing.
const CHUNK_SIZE: usize = 8192;

/// A digest algorithm that can be applied to root files.
///
/// # Examples
///
/// ```
/// use avail_artifact::digest_algorithm::DigestAlgorithm;
///
/// let algorithm = DigestAlgorithm::try_from("sha-256").expect("known algorithm");
/// assert_eq!(algorithm, DigestAlgorithm::Sha256);
/// assert_eq!(algorithm.as_str(), "SHA-256");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// SHA-224.
    Sha224,
    /// SHA-256, the default.
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl DigestAlgorithm {
    /// Every supported algorithm, in identifier order.
    pub const ALL: [Self; 4] = [Self::Sha224, Self::Sha256, Self::Sha384, Self::Sha512];

    /// Return the canonical identifier written into manifests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Return the digest length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Digest everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Propagates any read failure.
    pub fn digest_reader(self, reader: &mut impl Read) -> io::Result<Vec<u8>> {
        match self {
            Self::Sha224 => stream_into::<Sha224>(reader),
            Self::Sha256 => stream_into::<Sha256>(reader),
            Self::Sha384 => stream_into::<Sha384>(reader),
            Self::Sha512 => stream_into::<Sha512>(reader),
        }
    }

    /// Digest an in-memory buffer.
    #[must_use]
    pub fn digest_bytes(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha224 => Sha224::digest(bytes).to_vec(),
            Self::Sha256 => Sha256::digest(bytes).to_vec(),
            Self::Sha384 => Sha384::digest(bytes).to_vec(),
            Self::Sha512 => Sha512::digest(bytes).to_vec(),
        }
    }
}

fn stream_into<D: Digest>(reader: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(hasher.finalize().to_vec())
}

impl TryFrom<&str> for DigestAlgorithm {
    type Error = FormatError;

    fn try_from(value: &str) -> Result<Self> {
        let normalised = value.trim().to_ascii_uppercase().replace('-', "");
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str().replace('-', "") == normalised)
            .ok_or_else(|| FormatError::UnsupportedAlgorithm {
                name: value.to_owned(),
                expected: Self::ALL
                    .iter()
                    .map(|a| a.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
