//! Error types for payload reading, encoding, and digest validation.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising while reading or decoding a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The payload file does not exist.
    #[error("payload file not found: {path}")]
    NotFound {
        /// The missing payload path.
        path: Utf8PathBuf,
    },

    /// The payload file exists but could not be read.
    #[error("failed to read payload {path}: {source}")]
    Read {
        /// The unreadable payload path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The encoded block is not valid base64.
    #[error("encoded payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// A digest string is not 64 lowercase hexadecimal characters.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidDigest {
        /// Description of the validation failure.
        reason: String,
    },
}

/// Result type alias using [`PayloadError`].
pub type Result<T> = std::result::Result<T, PayloadError>;
