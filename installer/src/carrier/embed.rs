//! Carrier assembly: prelude plus embedded region, checked and written once.

use super::error::{EmbedError, ExtractionError};
use super::extract::extract_verified;
use super::region::{EmbeddedRegion, check_inert};
use super::syntax::HostSyntax;
use crate::atomic::write_atomic;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs;
use std::io;

/// Where the installer logic ahead of the embedded region comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PreludeSource {
    /// Render the prelude from the shared install plan.
    #[default]
    Rendered,
    /// Use a hand-authored POSIX shell script.
    Template(Utf8PathBuf),
}

impl PreludeSource {
    /// Return the template path, if any.
    #[must_use]
    pub fn template(&self) -> Option<&Utf8Path> {
        match self {
            Self::Rendered => None,
            Self::Template(path) => Some(path),
        }
    }

    /// Confirm that a configured template exists.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::TemplateNotFound`] when the template is absent.
    pub fn ensure_available(&self) -> Result<(), EmbedError> {
        match self.template() {
            Some(path) if !path.is_file() => Err(EmbedError::TemplateNotFound {
                path: path.to_owned(),
            }),
            _ => Ok(()),
        }
    }

    /// Read a template's contents verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::TemplateNotFound`] or [`EmbedError::TemplateRead`]
    /// when the template cannot be read.
    pub fn read_template(path: &Utf8Path) -> Result<String, EmbedError> {
        fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => EmbedError::TemplateNotFound {
                path: path.to_owned(),
            },
            _ => EmbedError::TemplateRead {
                path: path.to_owned(),
                source,
            },
        })
    }
}

/// A complete carrier script: installer prelude followed by the region.
///
/// # Examples
///
/// ```
/// use erasmus_installer::carrier::{CarrierScript, EmbeddedRegion, HostSyntax};
/// use erasmus_installer::payload::Payload;
///
/// let payload = Payload::new(b"print('hi')".to_vec());
/// let region = EmbeddedRegion::from_payload(HostSyntax::Posix, &payload);
/// let script = CarrierScript::new("#!/bin/sh\necho installing".to_owned(), region);
///
/// let text = script.render()?;
/// assert!(text.starts_with("#!/bin/sh\necho installing\n\n# __ERASMUS_EMBEDDED_BELOW__"));
/// # Ok::<(), erasmus_installer::carrier::EmbedError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierScript {
    prelude: String,
    region: EmbeddedRegion,
}

impl CarrierScript {
    /// Pair `prelude` with `region`.
    #[must_use]
    pub fn new(prelude: String, region: EmbeddedRegion) -> Self {
        Self { prelude, region }
    }

    /// Return the host syntax of the region.
    #[must_use]
    pub fn syntax(&self) -> HostSyntax {
        self.region.syntax()
    }

    /// Return the embedded region.
    #[must_use]
    pub fn region(&self) -> &EmbeddedRegion {
        &self.region
    }

    /// Render the full carrier text.
    ///
    /// The region is checked for inertness and the rendered text must extract
    /// back to the region's digest before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::ExecutableLine`] or [`EmbedError::MissingExitGuard`]
    /// when the region could execute, and [`EmbedError::SelfCheck`] when the
    /// text does not verify.
    pub fn render(&self) -> Result<String, EmbedError> {
        let syntax = self.syntax();
        let region = self.region.render();
        check_inert(&region, syntax)?;

        let text = format!("{}{region}", self.prelude);
        let extracted = extract_verified(&text)?;
        if extracted.digest() != self.region.digest() || extracted.syntax() != syntax {
            return Err(EmbedError::SelfCheck(ExtractionError::DigestMismatch {
                expected: self.region.digest().to_string(),
                actual: extracted.digest().to_string(),
            }));
        }

        debug!(
            "rendered {syntax} carrier: {} encoded lines",
            self.region.encoded().line_count()
        );
        Ok(text)
    }

    /// Render the carrier and write it atomically to `dest`.
    ///
    /// POSIX carriers are made executable on Unix. Returns the written text.
    ///
    /// # Errors
    ///
    /// Returns any error from [`CarrierScript::render`], and
    /// [`EmbedError::Write`] when the file cannot be written.
    pub fn write_to(&self, dest: &Utf8Path) -> Result<String, EmbedError> {
        let text = self.render()?;
        let executable = self.syntax() == HostSyntax::Posix;
        write_atomic(dest, text.as_bytes(), executable).map_err(|source| EmbedError::Write {
            path: dest.to_owned(),
            source,
        })?;
        info!("wrote {} carrier {dest}", self.syntax());
        Ok(text)
    }
}

/// Append `region` to `prelude`, check the result, and write it to `dest`.
///
/// # Errors
///
/// See [`CarrierScript::write_to`].
pub fn embed_carrier(
    prelude: &str,
    region: &EmbeddedRegion,
    dest: &Utf8Path,
) -> Result<String, EmbedError> {
    CarrierScript::new(prelude.to_owned(), region.clone()).write_to(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Dest {
        _temp: TempDir,
        dir: Utf8PathBuf,
    }

    #[fixture]
    fn dest() -> Dest {
        let temp = TempDir::new().expect("temp dir");
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp path");
        Dest { _temp: temp, dir }
    }

    fn region(syntax: HostSyntax) -> EmbeddedRegion {
        EmbeddedRegion::from_payload(syntax, &Payload::new(b"print('hi')".to_vec()))
    }

    #[rstest]
    fn written_text_is_prelude_then_region(dest: Dest) {
        let path = dest.dir.join("erasmus.sh");
        let region = region(HostSyntax::Posix);
        let text = embed_carrier("#!/bin/sh\n", &region, &path).expect("embed");

        assert_eq!(text, format!("#!/bin/sh\n{}", region.render()));
        assert_eq!(fs::read_to_string(&path).expect("read back"), text);
    }

    #[cfg(unix)]
    #[rstest]
    #[case::posix(HostSyntax::Posix, 0o755)]
    #[case::batch(HostSyntax::Batch, 0o644)]
    fn posix_carriers_are_executable(dest: Dest, #[case] syntax: HostSyntax, #[case] mode: u32) {
        use std::os::unix::fs::PermissionsExt;

        let path = dest.dir.join(format!("erasmus.{}", syntax.extension()));
        embed_carrier("", &region(syntax), &path).expect("embed");
        let actual = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(actual & 0o777, mode);
    }

    #[test]
    fn nested_carrier_verifies_against_the_outer_region() {
        let inner = CarrierScript::new(String::new(), region(HostSyntax::Posix))
            .render()
            .expect("inner render");
        let outer_payload = Payload::new(b"print('outer')".to_vec());
        let outer = EmbeddedRegion::from_payload(HostSyntax::Batch, &outer_payload);

        let text = CarrierScript::new(format!("{inner}\r\n"), outer)
            .render()
            .expect("outer render");
        let extracted = extract_verified(&text).expect("verifies");
        assert_eq!(extracted.syntax(), HostSyntax::Batch);
        assert_eq!(extracted.bytes(), b"print('outer')");
    }

    #[rstest]
    fn missing_template_is_reported(dest: Dest) {
        let source = PreludeSource::Template(dest.dir.join("scripts/install.sh"));
        let err = source.ensure_available().expect_err("absent template");
        assert!(matches!(err, EmbedError::TemplateNotFound { .. }));
        assert!(PreludeSource::Rendered.ensure_available().is_ok());
    }

    #[rstest]
    fn read_template_returns_contents(dest: Dest) {
        let path = dest.dir.join("install.sh");
        fs::write(&path, "#!/bin/sh\necho hi\n").expect("write template");
        let contents = PreludeSource::read_template(&path).expect("read template");
        assert_eq!(contents, "#!/bin/sh\necho hi\n");
    }
}
