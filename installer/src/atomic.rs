//! Atomic file replacement for release artifacts.
//!
//! Contents are written to a temporary file beside the destination and then
//! renamed over it, so a reader never observes a partially written artifact.

use camino::Utf8Path;
use std::io::{self, Write};
use tempfile::NamedTempFile;

/// File mode applied to artifacts that must be runnable (rwxr-xr-x).
#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// File mode applied to plain artifacts (rw-r--r--).
#[cfg(unix)]
const REGULAR_MODE: u32 = 0o644;

/// Write `contents` to `path` atomically.
///
/// The parent directory must already exist. When `executable` is set the file
/// is made executable on Unix; elsewhere the flag has no effect.
pub(crate) fn write_atomic(path: &Utf8Path, contents: &[u8], executable: bool) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    set_mode(&file, executable)?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(file: &NamedTempFile, executable: bool) -> io::Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    let mode = if executable {
        EXECUTABLE_MODE
    } else {
        REGULAR_MODE
    };
    file.as_file().set_permissions(Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &NamedTempFile, _executable: bool) -> io::Result<()> {
    Ok(())
}
