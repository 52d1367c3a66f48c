//! Native verification of a built carrier.
//!
//! Performs the same checks a generated installer performs on the target
//! machine, without running the installer: locate the annotation and the
//! encoded block, decode it, and compare digests. Optionally cross-checks a
//! published `.sha256` file and writes the payload out.

use crate::atomic::write_atomic;
use crate::carrier::{ExtractedPayload, extract_verified_bytes};
use crate::error::{ReleaseError, Result};
use crate::output::write_stderr_line;
use crate::payload::Sha256Digest;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::fs;
use std::io::{self, Write};

/// Options for verifying one carrier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// The carrier script to verify.
    pub installer: Utf8PathBuf,
    /// Where to write the verified payload, if anywhere.
    pub output: Option<Utf8PathBuf>,
    /// A digest file (`<hex>  <name>`) the payload must also match.
    pub digest_file: Option<Utf8PathBuf>,
}

/// Verify `options.installer` and report the digest on `stderr`.
///
/// # Errors
///
/// Returns [`ReleaseError::ArtifactMissing`] when a named file is absent,
/// [`ReleaseError::Extraction`] when the carrier does not verify, and
/// [`ReleaseError::DigestFileMismatch`] when the digest file disagrees.
pub fn verify_installer(
    options: &VerifyOptions,
    stderr: &mut dyn Write,
) -> Result<ExtractedPayload> {
    let bytes = read_artifact(&options.installer)?;
    let extracted = extract_verified_bytes(&bytes)?;
    info!(
        "{} verified as {} carrier",
        options.installer,
        extracted.syntax()
    );

    if let Some(digest_file) = &options.digest_file {
        let published = read_published_digest(digest_file)?;
        if &published != extracted.digest() {
            return Err(ReleaseError::DigestFileMismatch {
                path: digest_file.clone(),
                expected: published.into_inner(),
                actual: extracted.digest().to_string(),
            });
        }
    }

    write_stderr_line(
        stderr,
        format!("SHA256 hash verified: {}", extracted.digest()),
    );

    if let Some(output) = &options.output {
        write_atomic(output, extracted.bytes(), false).map_err(|source| {
            ReleaseError::WriteFailed {
                path: output.clone(),
                source,
            }
        })?;
        write_stderr_line(stderr, format!("Extracted payload to: {output}"));
    }

    Ok(extracted)
}

/// Read the digest from the first field of a `.sha256` file.
fn read_published_digest(path: &Utf8Path) -> Result<Sha256Digest> {
    let bytes = read_artifact(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let field = text.split_whitespace().next().unwrap_or_default();
    Ok(Sha256Digest::try_from(field)?)
}

fn read_artifact(path: &Utf8Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ReleaseError::ArtifactMissing {
            path: path.to_owned(),
        },
        _ => ReleaseError::ReadFailed {
            path: path.to_owned(),
            source,
        },
    })
}
