//! Payload packaging.
//!
//! The packaging step turns the project's source scripts into the single
//! payload file that carriers embed. The pipeline only depends on the
//! [`Packager`] trait, so tests can substitute a mock.

use crate::atomic::write_atomic;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use thiserror::Error;

/// Errors arising from payload packaging.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// No source files were provided for packaging.
    #[error("no source files provided for packaging")]
    NoSources,

    /// A source file does not exist.
    #[error("source file not found: {path}")]
    SourceNotFound {
        /// The missing source path.
        path: Utf8PathBuf,
    },

    /// An I/O operation failed while reading sources or writing the output.
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces the payload file at a given output path.
#[cfg_attr(test, mockall::automock)]
pub trait Packager {
    /// Write the packaged payload to `output`.
    ///
    /// The parent directory of `output` already exists when this is called.
    ///
    /// # Errors
    ///
    /// Returns a [`PackagingError`] when the payload cannot be produced.
    fn package(&self, output: &Utf8Path) -> Result<(), PackagingError>;
}

/// Concatenates source files, in order, into one payload file.
///
/// A newline is inserted between two sources when the earlier one does not
/// already end with one. The bytes are otherwise copied unchanged.
///
/// # Examples
///
/// ```no_run
/// use camino::{Utf8Path, Utf8PathBuf};
/// use erasmus_installer::packager::{FilePackager, Packager};
///
/// let packager = FilePackager::new(vec![Utf8PathBuf::from("erasmus.py")]);
/// packager.package(Utf8Path::new("release/v0.1.0/erasmus_v0.1.0.py"))?;
/// # Ok::<(), erasmus_installer::packager::PackagingError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePackager {
    sources: Vec<Utf8PathBuf>,
}

impl FilePackager {
    /// Create a packager for the given source files.
    #[must_use]
    pub fn new(sources: Vec<Utf8PathBuf>) -> Self {
        Self { sources }
    }

    /// Return the configured source files.
    #[must_use]
    pub fn sources(&self) -> &[Utf8PathBuf] {
        &self.sources
    }
}

impl Packager for FilePackager {
    fn package(&self, output: &Utf8Path) -> Result<(), PackagingError> {
        if self.sources.is_empty() {
            return Err(PackagingError::NoSources);
        }
        if let Some(missing) = self.sources.iter().find(|source| !source.is_file()) {
            return Err(PackagingError::SourceNotFound {
                path: missing.clone(),
            });
        }

        let mut contents = Vec::new();
        for source in &self.sources {
            if contents.last().is_some_and(|byte| *byte != b'\n') {
                contents.push(b'\n');
            }
            contents.extend(fs::read(source)?);
            debug!("packaged {source}");
        }

        write_atomic(output, &contents, false)?;
        debug!("wrote {} payload bytes to {output}", contents.len());
        Ok(())
    }
}
