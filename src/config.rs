//! Version descriptor loading.
//!
//! Releases are keyed by the `version` field of `version.json` at the project
//! root. The descriptor may carry other metadata, which is ignored. A missing
//! file, malformed JSON, or a missing or unusable `version` value aborts the
//! build before any part of the release tree is created.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// File name of the version descriptor, relative to the project root.
pub const VERSION_FILE: &str = "version.json";

/// Errors raised while loading the version descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The descriptor does not exist at the expected location.
    #[error("{path} not found")]
    NotFound {
        /// Where the descriptor was expected.
        path: Utf8PathBuf,
    },

    /// The descriptor exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path to the unreadable descriptor.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        /// Path to the malformed descriptor.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The descriptor has no `version` field, or it is blank.
    #[error("{path} does not define a 'version' field")]
    MissingVersion {
        /// Path to the incomplete descriptor.
        path: Utf8PathBuf,
    },

    /// The version cannot be used to name release files.
    #[error("invalid version \"{version}\": {reason}")]
    InvalidVersion {
        /// The rejected version string.
        version: String,
        /// Why the version was rejected.
        reason: &'static str,
    },
}

impl ConfigError {
    /// Returns guidance for fixing the error, when there is any to give.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use erasmus::ConfigError;
    ///
    /// let err = ConfigError::NotFound {
    ///     path: Utf8PathBuf::from("/project/version.json"),
    /// };
    /// let hint = err.remediation().unwrap_or_default();
    /// assert!(hint.contains("\"version\""));
    /// ```
    #[must_use]
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } | Self::MissingVersion { .. } => Some(
                concat!(
                    "To fix this error:\n",
                    "1. Make sure --root points at the project root directory\n",
                    "2. Create a version.json file with a 'version' field\n",
                    "   Example: {\"version\": \"0.1.0\"}"
                )
                .to_owned(),
            ),
            Self::Read { .. } | Self::Parse { .. } | Self::InvalidVersion { .. } => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct VersionDescriptor {
    #[serde(default)]
    version: Option<String>,
}

/// Release configuration read from `version.json`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReleaseConfig {
    version: String,
}

impl ReleaseConfig {
    /// Loads the descriptor from `<root>/version.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when the file is absent,
    /// [`ConfigError::Read`] or [`ConfigError::Parse`] when it cannot be read
    /// or parsed, and [`ConfigError::MissingVersion`] or
    /// [`ConfigError::InvalidVersion`] when the version is unusable.
    pub fn load(root: &Utf8Path) -> Result<Self, ConfigError> {
        let path = root.join(VERSION_FILE);
        if !path.is_file() {
            return Err(ConfigError::NotFound { path });
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&path, &contents)?;
        debug!("loaded version {} from {path}", config.version);
        Ok(config)
    }

    /// Parses descriptor contents; `path` is used for error reporting only.
    ///
    /// # Errors
    ///
    /// See [`ReleaseConfig::load`].
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use erasmus::ReleaseConfig;
    ///
    /// let path = Utf8Path::new("version.json");
    /// let config = ReleaseConfig::parse(path, r#"{"version": "1.2.3", "name": "erasmus"}"#)?;
    /// assert_eq!(config.version(), "1.2.3");
    /// # Ok::<(), erasmus::ConfigError>(())
    /// ```
    pub fn parse(path: &Utf8Path, contents: &str) -> Result<Self, ConfigError> {
        let descriptor: VersionDescriptor =
            serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            })?;

        let version = descriptor
            .version
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVersion {
                path: path.to_owned(),
            })?;
        validate_version(&version)?;

        Ok(Self { version })
    }

    /// Returns the release version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Versions become part of directory and file names in the release tree.
fn validate_version(version: &str) -> Result<(), ConfigError> {
    let reason = if version.chars().any(char::is_whitespace) {
        Some("must not contain whitespace")
    } else if version.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if version.contains("..") {
        Some("must not contain '..'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidVersion {
            version: version.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}
