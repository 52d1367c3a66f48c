//! Error types for embedding payloads into carriers and extracting them again.

use crate::payload::PayloadError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising while building or writing a carrier script.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The prelude template does not exist.
    #[error("installer template not found: {path}")]
    TemplateNotFound {
        /// The missing template path.
        path: Utf8PathBuf,
    },

    /// The prelude template could not be read.
    #[error("failed to read installer template {path}: {source}")]
    TemplateRead {
        /// The unreadable template path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A region line would be executed by the host interpreter.
    #[error("embedded region line {line} is executable: {content:?}")]
    ExecutableLine {
        /// One-based line number within the region.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// The region has no exit guard ahead of the encoded block.
    #[error("embedded region has no exit guard before the encoded block")]
    MissingExitGuard,

    /// The rendered carrier did not extract back to its own payload.
    #[error("rendered carrier failed verification: {0}")]
    SelfCheck(#[from] ExtractionError),

    /// The carrier could not be written.
    #[error("failed to write carrier {path}: {source}")]
    Write {
        /// The destination path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors arising while extracting and verifying an embedded payload.
///
/// Invalid base64 and malformed digest annotations surface through
/// [`ExtractionError::Payload`] as [`PayloadError::Decode`] and
/// [`PayloadError::InvalidDigest`] respectively.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The carrier is not valid UTF-8 text.
    #[error("carrier is not valid UTF-8 text")]
    NotText,

    /// No digest annotation line was found.
    #[error("carrier has no SHA256_HASH annotation")]
    MissingAnnotation,

    /// A begin or end marker line was not found.
    #[error("carrier has no {marker} line")]
    MissingMarker {
        /// The missing marker text, including its comment prefix.
        marker: String,
    },

    /// A line of the encoded block lacks the comment prefix.
    #[error("line {line} of the encoded block does not start with {prefix:?}")]
    MalformedLine {
        /// One-based line number within the carrier.
        line: usize,
        /// The expected comment prefix.
        prefix: &'static str,
    },

    /// The digest annotation or the encoded block is invalid.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The extracted bytes do not hash to the annotated digest.
    #[error("SHA-256 mismatch: expected {expected}, got {actual}")]
    DigestMismatch {
        /// The annotated digest.
        expected: String,
        /// The digest of the extracted bytes.
        actual: String,
    },
}
