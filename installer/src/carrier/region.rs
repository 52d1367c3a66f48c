//! The embedded region appended to every carrier script.
//!
//! The region is modelled as typed lines so that each line's role is explicit
//! before anything is rendered. Rendering joins the lines with the host
//! newline and emits no terminator after the end marker.

use super::error::EmbedError;
use super::syntax::{BEGIN_MARKER, DIGEST_KEY, EMBEDDED_MARKER, EMBEDDED_NOTE, END_MARKER, HostSyntax};
use crate::payload::{EncodedPayload, Payload, Sha256Digest};

/// One line of an embedded region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionLine {
    /// An empty line.
    Blank,
    /// A comment; the text excludes the comment prefix.
    Comment(String),
    /// The statement that stops the interpreter before the encoded block.
    ExitGuard,
}

impl RegionLine {
    /// Render the line for `syntax`, without a terminator.
    #[must_use]
    pub fn render(&self, syntax: HostSyntax) -> String {
        match self {
            Self::Blank => String::new(),
            Self::Comment(text) => syntax.comment(text),
            Self::ExitGuard => syntax.exit_guard().to_owned(),
        }
    }
}

/// The marker, digest annotation, exit guard, and encoded block of a carrier.
///
/// # Examples
///
/// ```
/// use erasmus_installer::carrier::{EmbeddedRegion, HostSyntax};
/// use erasmus_installer::payload::Payload;
///
/// let payload = Payload::new(b"print('hi')".to_vec());
/// let region = EmbeddedRegion::from_payload(HostSyntax::Posix, &payload);
/// let text = region.render();
///
/// assert!(text.starts_with("\n\n# __ERASMUS_EMBEDDED_BELOW__\n"));
/// assert!(text.ends_with("# cHJpbnQoJ2hpJyk=\n# END_BASE64_CONTENT"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedRegion {
    syntax: HostSyntax,
    digest: Sha256Digest,
    encoded: EncodedPayload,
}

impl EmbeddedRegion {
    /// Assemble a region from an existing digest and encoded block.
    #[must_use]
    pub fn new(syntax: HostSyntax, digest: Sha256Digest, encoded: EncodedPayload) -> Self {
        Self {
            syntax,
            digest,
            encoded,
        }
    }

    /// Encode `payload` into a region for `syntax`.
    #[must_use]
    pub fn from_payload(syntax: HostSyntax, payload: &Payload) -> Self {
        Self::new(syntax, payload.digest().clone(), payload.encode())
    }

    /// Return the host syntax.
    #[must_use]
    pub fn syntax(&self) -> HostSyntax {
        self.syntax
    }

    /// Return the annotated digest.
    #[must_use]
    pub fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    /// Return the encoded block.
    #[must_use]
    pub fn encoded(&self) -> &EncodedPayload {
        &self.encoded
    }

    /// Return the region's lines in order.
    #[must_use]
    pub fn lines(&self) -> Vec<RegionLine> {
        let mut lines = vec![
            RegionLine::Blank,
            RegionLine::Blank,
            RegionLine::Comment(EMBEDDED_MARKER.to_owned()),
            RegionLine::Comment(EMBEDDED_NOTE.to_owned()),
            RegionLine::Comment(format!("{DIGEST_KEY}{}", self.digest)),
            RegionLine::ExitGuard,
            RegionLine::Blank,
            RegionLine::Comment(BEGIN_MARKER.to_owned()),
        ];
        lines.extend(
            self.encoded
                .lines()
                .iter()
                .map(|line| RegionLine::Comment(line.clone())),
        );
        lines.push(RegionLine::Comment(END_MARKER.to_owned()));
        lines
    }

    /// Render the region as text to append directly after a prelude.
    #[must_use]
    pub fn render(&self) -> String {
        let rendered: Vec<String> = self
            .lines()
            .iter()
            .map(|line| line.render(self.syntax))
            .collect();
        rendered.join(self.syntax.newline())
    }
}

/// Check that rendered region `text` cannot execute under `syntax`.
///
/// Every line must be blank, a comment, or the single exit guard, and the
/// exit guard must precede the begin marker.
///
/// # Errors
///
/// Returns [`EmbedError::ExecutableLine`] for the first offending line and
/// [`EmbedError::MissingExitGuard`] when no guard precedes the encoded block.
pub fn check_inert(text: &str, syntax: HostSyntax) -> Result<(), EmbedError> {
    let begin = syntax.comment(BEGIN_MARKER);
    let mut guarded = false;

    for (index, line) in text.split(syntax.newline()).enumerate() {
        let executable = || EmbedError::ExecutableLine {
            line: index + 1,
            content: line.to_owned(),
        };

        if line.contains(['\r', '\n']) {
            return Err(executable());
        }
        if line == syntax.exit_guard() {
            if guarded {
                return Err(executable());
            }
            guarded = true;
            continue;
        }
        if line == begin && !guarded {
            return Err(EmbedError::MissingExitGuard);
        }
        if !line.is_empty() && !line.starts_with(syntax.comment_prefix()) {
            return Err(executable());
        }
    }

    if guarded {
        Ok(())
    } else {
        Err(EmbedError::MissingExitGuard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn region(syntax: HostSyntax, bytes: &[u8]) -> EmbeddedRegion {
        EmbeddedRegion::from_payload(syntax, &Payload::new(bytes.to_vec()))
    }

    #[test]
    fn posix_region_matches_published_layout() {
        let payload = Payload::new(b"print('hi')".to_vec());
        let expected = format!(
            concat!(
                "\n\n# __ERASMUS_EMBEDDED_BELOW__\n",
                "# The content below this line is the base64-encoded erasmus.py file\n",
                "# SHA256_HASH={}\n",
                "exit 0\n\n",
                "# BEGIN_BASE64_CONTENT\n",
                "# cHJpbnQoJ2hpJyk=\n",
                "# END_BASE64_CONTENT"
            ),
            payload.digest()
        );
        let text = EmbeddedRegion::from_payload(HostSyntax::Posix, &payload).render();
        assert_eq!(text, expected);
    }

    #[test]
    fn batch_region_uses_crlf_and_colon_comments() {
        let text = region(HostSyntax::Batch, b"print('hi')").render();
        assert!(text.starts_with("\r\n\r\n:: __ERASMUS_EMBEDDED_BELOW__\r\n"));
        assert!(text.contains("\r\nexit /b 0\r\n\r\n:: BEGIN_BASE64_CONTENT\r\n"));
        assert!(text.ends_with(":: END_BASE64_CONTENT"));
        assert!(!text.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn empty_payload_places_end_after_begin() {
        let text = region(HostSyntax::Posix, b"").render();
        assert!(text.ends_with("# BEGIN_BASE64_CONTENT\n# END_BASE64_CONTENT"));
    }

    #[test]
    fn one_comment_line_per_encoded_line() {
        let region = region(HostSyntax::Posix, &[7; 1_000]);
        let lines = region.lines();
        assert_eq!(lines.len(), 9 + region.encoded().line_count());
        assert_eq!(lines.iter().filter(|l| **l == RegionLine::ExitGuard).count(), 1);
    }

    #[rstest]
    #[case::posix(HostSyntax::Posix)]
    #[case::batch(HostSyntax::Batch)]
    fn rendered_regions_are_inert(#[case] syntax: HostSyntax) {
        let text = region(syntax, &[0xab; 500]).render();
        assert!(check_inert(&text, syntax).is_ok());
    }

    #[test]
    fn executable_line_is_reported_with_its_number() {
        let text = "\n# marker\nexit 0\nrm -rf /\n# BEGIN_BASE64_CONTENT";
        let err = check_inert(text, HostSyntax::Posix).expect_err("executable line");
        match err {
            EmbedError::ExecutableLine { line, content } => {
                assert_eq!(line, 4);
                assert_eq!(content, "rm -rf /");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case::no_guard("# marker\n# BEGIN_BASE64_CONTENT\n# END_BASE64_CONTENT")]
    #[case::guard_after_block("# BEGIN_BASE64_CONTENT\nexit 0\n# END_BASE64_CONTENT")]
    fn guard_must_precede_block(#[case] text: &str) {
        let err = check_inert(text, HostSyntax::Posix).expect_err("missing guard");
        assert!(matches!(err, EmbedError::MissingExitGuard));
    }

    #[test]
    fn second_exit_guard_is_rejected() {
        let text = "exit 0\n# BEGIN_BASE64_CONTENT\nexit 0";
        let err = check_inert(text, HostSyntax::Posix).expect_err("duplicate guard");
        assert!(matches!(err, EmbedError::ExecutableLine { line: 3, .. }));
    }

    #[test]
    fn stray_line_feed_in_batch_region_is_executable() {
        let text = "exit /b 0\r\n:: ok\nrem oops";
        let err = check_inert(text, HostSyntax::Batch).expect_err("bare LF");
        assert!(matches!(err, EmbedError::ExecutableLine { line: 2, .. }));
    }
}
