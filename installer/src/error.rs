//! Error types for the release builder.
//!
//! Each concern keeps its own error enum; [`ReleaseError`] wraps them so the
//! pipeline and binary can propagate with `?` and report one message.

use crate::carrier::{EmbedError, ExtractionError};
use crate::packager::PackagingError;
use crate::payload::PayloadError;
use camino::Utf8PathBuf;
use erasmus::ConfigError;
use thiserror::Error;

/// Errors that can occur while building or verifying a release.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The version descriptor could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The payload could not be packaged.
    #[error("failed to package payload: {0}")]
    Packaging(#[from] PackagingError),

    /// The payload could not be read or decoded.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// A carrier could not be assembled or written.
    #[error(transparent)]
    Embed(#[from] EmbedError),

    /// A carrier did not extract to a verified payload.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// An artifact expected from an earlier stage is missing.
    #[error("{path} not found")]
    ArtifactMissing {
        /// The missing artifact.
        path: Utf8PathBuf,
    },

    /// The version directory could not be created.
    #[error("failed to create release directory {path}: {source}")]
    VersionDirMissing {
        /// The directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The extracted payload does not match a published digest file.
    #[error("digest file {path} lists {expected}, but the carrier holds {actual}")]
    DigestFileMismatch {
        /// The digest file that was compared against.
        path: Utf8PathBuf,
        /// Digest listed in the file.
        expected: String,
        /// Digest of the extracted payload.
        actual: String,
    },

    /// A file could not be written.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        /// The destination path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        /// The unreadable path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ReleaseError {
    /// Return remediation guidance for errors the user can fix directly.
    #[must_use]
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.remediation(),
            Self::ArtifactMissing { .. } => {
                Some("Run the build again; an earlier stage did not produce its output.".to_owned())
            }
            Self::Embed(EmbedError::TemplateNotFound { path }) => Some(format!(
                "Create {path}, or omit --template to render the installer from the built-in plan."
            )),
            _ => None,
        }
    }
}

/// Result type alias using [`ReleaseError`].
pub type Result<T> = std::result::Result<T, ReleaseError>;
