//! The opaque payload carried by an installer.
//!
//! A payload is read into memory in full and never interpreted. Its identity is
//! the SHA-256 digest of its exact bytes.
//!
//! # Sub-modules
//!
//! - [`encoding`]: wrapped base64 block (`EncodedPayload`).
//! - [`error`]: payload error type (`PayloadError`).
//! - [`sha256_digest`]: validated digest newtype (`Sha256Digest`).

pub mod encoding;
pub mod error;
pub mod sha256_digest;

pub use encoding::{EncodedPayload, LINE_WIDTH, decode_lines};
pub use error::PayloadError;
pub use sha256_digest::Sha256Digest;

use camino::Utf8Path;
use log::debug;
use std::fs;
use std::io;

/// Payload bytes paired with their digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
    digest: Sha256Digest,
}

impl Payload {
    /// Wrap `bytes`, computing their digest.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        let digest = Sha256Digest::of(&bytes);
        Self { bytes, digest }
    }

    /// Read the whole file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::NotFound`] when the file is absent and
    /// [`PayloadError::Read`] for any other I/O failure.
    pub fn read(path: &Utf8Path) -> error::Result<Self> {
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => PayloadError::NotFound {
                path: path.to_owned(),
            },
            _ => PayloadError::Read {
                path: path.to_owned(),
                source,
            },
        })?;
        debug!("read {} payload bytes from {path}", bytes.len());
        Ok(Self::new(bytes))
    }

    /// Return the raw payload bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Return the digest of the payload bytes.
    #[must_use]
    pub fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    /// Encode the payload into wrapped base64 lines.
    #[must_use]
    pub fn encode(&self) -> EncodedPayload {
        EncodedPayload::encode(&self.bytes)
    }
}
