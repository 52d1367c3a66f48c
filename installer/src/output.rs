//! Output formatting for the release CLI.
//!
//! Progress lines go to an injected writer so tests can capture them; the
//! final summary lists every artifact the build produced.

use crate::pipeline::ReleaseArtifacts;
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format the summary printed after a successful build.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use erasmus_installer::output::release_summary;
/// use erasmus_installer::payload::Sha256Digest;
/// use erasmus_installer::pipeline::ReleaseArtifacts;
///
/// let dir = Utf8PathBuf::from("release/v1.2.3");
/// let artifacts = ReleaseArtifacts {
///     version: "1.2.3".to_owned(),
///     payload_path: dir.join("erasmus_v1.2.3.py"),
///     shell_installer: dir.join("erasmus_v1.2.3.sh"),
///     batch_installer: dir.join("erasmus_v1.2.3.bat"),
///     digest_file: dir.join("erasmus_v1.2.3.sha256"),
///     digest: Sha256Digest::of(b"print('hi')"),
/// };
///
/// let summary = release_summary(&artifacts);
/// assert!(summary.starts_with("Release package built successfully"));
/// assert!(summary.contains("erasmus_v1.2.3.bat"));
/// ```
#[must_use]
pub fn release_summary(artifacts: &ReleaseArtifacts) -> String {
    let rows = [
        ("Single-file executable", artifacts.payload_path.as_str()),
        ("Shell installer", artifacts.shell_installer.as_str()),
        ("Windows installer", artifacts.batch_installer.as_str()),
        ("SHA256 hash file", artifacts.digest_file.as_str()),
    ];

    let mut lines = vec![format!(
        "Release package built successfully for version {}.",
        artifacts.version
    )];
    lines.extend(
        rows.iter()
            .map(|(label, path)| format!("  {label}: {path}")),
    );
    lines.push(format!("  SHA256: {}", artifacts.digest));
    lines.join("\n")
}
