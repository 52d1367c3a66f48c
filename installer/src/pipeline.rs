//! Release pipeline orchestration.
//!
//! [`build_release`] runs the stages in order: load the version descriptor,
//! package the payload, embed it into the shell carrier, derive the batch
//! carrier from what the shell carrier verifiably holds, and publish the
//! digest file last. Each stage returns early on failure, so a digest file is
//! never left next to a carrier it does not describe.

use crate::atomic::write_atomic;
use crate::carrier::{CarrierScript, EmbeddedRegion, HostSyntax, PreludeSource, extract_verified};
use crate::error::{ReleaseError, Result};
use crate::output::write_stderr_line;
use crate::packager::Packager;
use crate::payload::{Payload, Sha256Digest};
use crate::plan::InstallPlan;
use crate::render::render_prelude;
use camino::{Utf8Path, Utf8PathBuf};
use erasmus::{ReleaseConfig, ReleaseLayout};
use log::{debug, info};
use std::fs;
use std::io::Write;

/// Options for one release build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Project root holding `version.json`; `release/` is created beneath it.
    pub root: Utf8PathBuf,
    /// Where the shell carrier's installer logic comes from.
    pub prelude: PreludeSource,
    /// Suppress progress output.
    pub quiet: bool,
}

/// Paths and digest of a finished release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifacts {
    /// The version the release was built for.
    pub version: String,
    /// The packaged payload.
    pub payload_path: Utf8PathBuf,
    /// The POSIX shell carrier.
    pub shell_installer: Utf8PathBuf,
    /// The Windows batch carrier.
    pub batch_installer: Utf8PathBuf,
    /// The standalone digest file.
    pub digest_file: Utf8PathBuf,
    /// SHA-256 digest of the payload.
    pub digest: Sha256Digest,
}

/// Build a complete release under `options.root`.
///
/// Nothing is created under `release/` when the version descriptor or the
/// configured template is unusable.
///
/// # Errors
///
/// Returns the first stage failure: configuration, packaging, a missing
/// payload, carrier assembly, or a carrier that fails to verify.
pub fn build_release(
    options: &BuildOptions,
    packager: &dyn Packager,
    stderr: &mut dyn Write,
) -> Result<ReleaseArtifacts> {
    let config = ReleaseConfig::load(&options.root)?;
    let layout = ReleaseLayout::new(&options.root, &config);
    options.prelude.ensure_available()?;

    layout
        .create_version_dir()
        .map_err(|source| ReleaseError::VersionDirMissing {
            path: layout.version_dir().to_owned(),
            source,
        })?;
    debug!("release directory ready: {}", layout.version_dir());

    let payload = package_payload(options, &layout, packager, stderr)?;
    let shell_installer = write_shell_carrier(options, &layout, &payload, stderr)?;
    let batch_installer = write_batch_carrier(options, &layout, &shell_installer, stderr)?;
    let digest_file = write_digest_file(options, &layout, payload.digest(), stderr)?;

    Ok(ReleaseArtifacts {
        version: layout.version().to_owned(),
        payload_path: layout.payload_path(),
        shell_installer,
        batch_installer,
        digest_file,
        digest: payload.digest().clone(),
    })
}

fn progress(options: &BuildOptions, stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if !options.quiet {
        write_stderr_line(stderr, message);
    }
}

fn package_payload(
    options: &BuildOptions,
    layout: &ReleaseLayout,
    packager: &dyn Packager,
    stderr: &mut dyn Write,
) -> Result<Payload> {
    progress(
        options,
        stderr,
        format!(
            "Building single-file executable for version {}",
            layout.version()
        ),
    );

    let payload_path = layout.payload_path();
    packager.package(&payload_path)?;
    if !payload_path.is_file() {
        return Err(ReleaseError::ArtifactMissing { path: payload_path });
    }

    let payload = Payload::read(&payload_path)?;
    progress(
        options,
        stderr,
        format!("Successfully created single-file executable: {payload_path}"),
    );
    Ok(payload)
}

fn write_digest_file(
    options: &BuildOptions,
    layout: &ReleaseLayout,
    digest: &Sha256Digest,
    stderr: &mut dyn Write,
) -> Result<Utf8PathBuf> {
    let path = layout.digest_path();
    let line = format!("{digest}  {}\n", layout.shell_installer_name());
    write_atomic(&path, line.as_bytes(), false).map_err(|source| ReleaseError::WriteFailed {
        path: path.clone(),
        source,
    })?;
    info!("payload digest {digest}");

    progress(options, stderr, format!("Generated SHA-256 hash: {digest}"));
    progress(options, stderr, format!("Saved hash to: {path}"));
    Ok(path)
}

fn write_shell_carrier(
    options: &BuildOptions,
    layout: &ReleaseLayout,
    payload: &Payload,
    stderr: &mut dyn Write,
) -> Result<Utf8PathBuf> {
    let prelude = match options.prelude.template() {
        Some(template) => PreludeSource::read_template(template)?,
        None => render_prelude(HostSyntax::Posix, &InstallPlan::erasmus(), layout.version()),
    };
    let region = EmbeddedRegion::from_payload(HostSyntax::Posix, payload);
    let path = layout.shell_installer_path();
    CarrierScript::new(prelude, region).write_to(&path)?;

    progress(
        options,
        stderr,
        format!("Successfully created installer: {path}"),
    );
    Ok(path)
}

/// Write the batch carrier from the payload the shell carrier holds.
///
/// Reading the shell carrier back from disk makes both carriers agree on
/// the bytes that were actually shipped, not on an in-memory copy. The
/// batch carrier's own round trip is checked by [`CarrierScript::write_to`].
fn write_batch_carrier(
    options: &BuildOptions,
    layout: &ReleaseLayout,
    shell_installer: &Utf8Path,
    stderr: &mut dyn Write,
) -> Result<Utf8PathBuf> {
    let shell = extract_verified(&read_text(shell_installer)?)?;
    let payload = Payload::new(shell.into_bytes());
    let prelude = render_prelude(HostSyntax::Batch, &InstallPlan::erasmus(), layout.version());
    let region = EmbeddedRegion::from_payload(HostSyntax::Batch, &payload);
    let path = layout.batch_installer_path();
    CarrierScript::new(prelude, region).write_to(&path)?;

    progress(
        options,
        stderr,
        format!("Successfully created batch installer: {path}"),
    );
    Ok(path)
}

fn read_text(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ReleaseError::ReadFailed {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
