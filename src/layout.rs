//! Release tree layout.
//!
//! Every artifact of a release lives under `release/v<version>/` below the
//! project root and shares the `erasmus_v<version>` file stem.

use crate::config::ReleaseConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// Directory below the project root that holds all releases.
pub const RELEASE_DIR: &str = "release";

/// Paths of a single release, derived from the project root and version.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use erasmus::{ReleaseConfig, ReleaseLayout};
///
/// let config = ReleaseConfig::parse(Utf8Path::new("version.json"), r#"{"version": "1.2.3"}"#)?;
/// let layout = ReleaseLayout::new(Utf8Path::new("/project"), &config);
/// assert_eq!(layout.version_dir(), Utf8Path::new("/project/release/v1.2.3"));
/// assert_eq!(layout.shell_installer_name(), "erasmus_v1.2.3.sh");
/// # Ok::<(), erasmus::ConfigError>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReleaseLayout {
    version: String,
    version_dir: Utf8PathBuf,
    stem: String,
}

impl ReleaseLayout {
    /// Derives the layout for `config` under `root`.
    #[must_use]
    pub fn new(root: &Utf8Path, config: &ReleaseConfig) -> Self {
        let version = config.version().to_owned();
        let version_dir = root.join(RELEASE_DIR).join(format!("v{version}"));
        let stem = format!("erasmus_v{version}");
        Self {
            version,
            version_dir,
            stem,
        }
    }

    /// Returns the release version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns `<root>/release/v<version>`.
    #[must_use]
    pub fn version_dir(&self) -> &Utf8Path {
        &self.version_dir
    }

    /// Returns the path of the packaged payload.
    #[must_use]
    pub fn payload_path(&self) -> Utf8PathBuf {
        self.artifact("py")
    }

    /// Returns the path of the digest file.
    #[must_use]
    pub fn digest_path(&self) -> Utf8PathBuf {
        self.artifact("sha256")
    }

    /// Returns the path of the shell installer.
    #[must_use]
    pub fn shell_installer_path(&self) -> Utf8PathBuf {
        self.artifact("sh")
    }

    /// Returns the path of the batch installer.
    #[must_use]
    pub fn batch_installer_path(&self) -> Utf8PathBuf {
        self.artifact("bat")
    }

    /// Returns the shell installer's file name, as recorded in the digest file.
    #[must_use]
    pub fn shell_installer_name(&self) -> String {
        format!("{}.sh", self.stem)
    }

    /// Creates the version directory and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the directory cannot be created.
    pub fn create_version_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.version_dir)
    }

    fn artifact(&self, extension: &str) -> Utf8PathBuf {
        self.version_dir.join(format!("{}.{extension}", self.stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn layout() -> ReleaseLayout {
        let config = ReleaseConfig::parse(Utf8Path::new("version.json"), r#"{"version": "0.4.1"}"#)
            .expect("valid descriptor");
        ReleaseLayout::new(Utf8Path::new("/work"), &config)
    }

    #[rstest]
    fn derives_version_directory(layout: ReleaseLayout) {
        assert_eq!(layout.version(), "0.4.1");
        assert_eq!(layout.version_dir(), Utf8Path::new("/work/release/v0.4.1"));
        assert_eq!(layout.shell_installer_name(), "erasmus_v0.4.1.sh");
    }

    #[rstest]
    #[case::payload(ReleaseLayout::payload_path, "erasmus_v0.4.1.py")]
    #[case::digest(ReleaseLayout::digest_path, "erasmus_v0.4.1.sha256")]
    #[case::shell(ReleaseLayout::shell_installer_path, "erasmus_v0.4.1.sh")]
    #[case::batch(ReleaseLayout::batch_installer_path, "erasmus_v0.4.1.bat")]
    fn artifacts_share_the_version_directory(
        layout: ReleaseLayout,
        #[case] path_of: fn(&ReleaseLayout) -> Utf8PathBuf,
        #[case] file_name: &str,
    ) {
        let path = path_of(&layout);
        assert_eq!(path.parent(), Some(layout.version_dir()));
        assert_eq!(path.file_name(), Some(file_name));
    }

    #[test]
    fn create_version_dir_is_repeatable() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let root = Utf8Path::from_path(temp.path()).expect("utf-8 temp path");
        let config = ReleaseConfig::parse(Utf8Path::new("version.json"), r#"{"version": "1.0.0"}"#)
            .expect("valid descriptor");
        let layout = ReleaseLayout::new(root, &config);

        layout.create_version_dir().expect("first creation");
        layout.create_version_dir().expect("second creation");
        assert!(layout.version_dir().is_dir());
    }
}
