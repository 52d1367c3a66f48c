//! Native extraction and verification of an embedded payload.
//!
//! This mirrors the procedure the generated installers run on the target
//! host: locate the digest annotation by text, take the lines strictly between
//! the exact begin and end marker lines, strip the comment prefix, decode, and
//! compare digests with exact string equality. When a carrier contains more
//! than one annotation or begin marker, the last one wins, matching the
//! generated scripts.

use super::error::ExtractionError;
use super::syntax::{BEGIN_MARKER, END_MARKER, HostSyntax};
use crate::payload::{Sha256Digest, decode_lines};
use log::debug;

/// A payload recovered from a carrier whose digest has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPayload {
    syntax: HostSyntax,
    bytes: Vec<u8>,
    digest: Sha256Digest,
}

impl ExtractedPayload {
    /// Return the host syntax the carrier was written in.
    #[must_use]
    pub fn syntax(&self) -> HostSyntax {
        self.syntax
    }

    /// Return the verified payload bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Return the verified digest.
    #[must_use]
    pub fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    /// Consume the payload and return its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Extract and verify the payload embedded in raw carrier bytes.
///
/// # Errors
///
/// Returns [`ExtractionError::NotText`] when `bytes` are not UTF-8, and
/// otherwise the errors documented on [`extract_verified`].
pub fn extract_verified_bytes(bytes: &[u8]) -> Result<ExtractedPayload, ExtractionError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ExtractionError::NotText)?;
    extract_verified(text)
}

/// Extract and verify the payload embedded in carrier `text`.
///
/// # Errors
///
/// Returns [`ExtractionError::MissingAnnotation`] or
/// [`ExtractionError::MissingMarker`] when the region cannot be located,
/// [`ExtractionError::MalformedLine`] when a block line lacks the comment
/// prefix, [`ExtractionError::Payload`] when the annotation or the block is
/// invalid, and [`ExtractionError::DigestMismatch`] when the decoded bytes do
/// not match the annotation.
///
/// # Examples
///
/// ```
/// use erasmus_installer::carrier::{EmbeddedRegion, HostSyntax, extract_verified};
/// use erasmus_installer::payload::Payload;
///
/// let payload = Payload::new(b"print('hi')".to_vec());
/// let carrier = format!(
///     "#!/bin/sh\necho installing{}",
///     EmbeddedRegion::from_payload(HostSyntax::Posix, &payload).render()
/// );
///
/// let extracted = extract_verified(&carrier)?;
/// assert_eq!(extracted.bytes(), b"print('hi')");
/// assert_eq!(extracted.digest(), payload.digest());
/// # Ok::<(), erasmus_installer::carrier::ExtractionError>(())
/// ```
pub fn extract_verified(text: &str) -> Result<ExtractedPayload, ExtractionError> {
    let lines: Vec<&str> = text.lines().collect();
    let (syntax, annotation) = find_annotation(&lines)?;
    let expected = Sha256Digest::try_from(annotation)?;

    let block = find_block(&lines, syntax)?;
    let bytes = decode_lines(block)?;
    let actual = Sha256Digest::of(&bytes);
    if actual != expected {
        return Err(ExtractionError::DigestMismatch {
            expected: expected.into_inner(),
            actual: actual.into_inner(),
        });
    }

    debug!("verified {} byte {syntax} payload {actual}", bytes.len());
    Ok(ExtractedPayload {
        syntax,
        bytes,
        digest: actual,
    })
}

/// Find the last digest annotation and the syntax it is written in.
fn find_annotation<'a>(lines: &[&'a str]) -> Result<(HostSyntax, &'a str), ExtractionError> {
    let prefixes = HostSyntax::ALL.map(|syntax| (syntax, syntax.annotation_prefix()));
    lines
        .iter()
        .rev()
        .find_map(|line| {
            prefixes.iter().find_map(|(syntax, prefix)| {
                line.strip_prefix(prefix.as_str()).map(|hex| (*syntax, hex))
            })
        })
        .ok_or(ExtractionError::MissingAnnotation)
}

/// Return the block lines with their comment prefix removed.
fn find_block<'a>(lines: &[&'a str], syntax: HostSyntax) -> Result<Vec<&'a str>, ExtractionError> {
    let begin_marker = syntax.comment(BEGIN_MARKER);
    let end_marker = syntax.comment(END_MARKER);

    let begin = lines
        .iter()
        .rposition(|line| *line == begin_marker)
        .ok_or(ExtractionError::MissingMarker {
            marker: begin_marker,
        })?;
    let block: Vec<&str> = lines
        .iter()
        .skip(begin + 1)
        .take_while(|line| **line != end_marker)
        .copied()
        .collect();
    if begin + 1 + block.len() >= lines.len() {
        return Err(ExtractionError::MissingMarker { marker: end_marker });
    }

    let prefix = syntax.comment_prefix();
    block
        .into_iter()
        .enumerate()
        .map(|(offset, line)| {
            line.strip_prefix(prefix)
                .ok_or(ExtractionError::MalformedLine {
                    line: begin + offset + 2,
                    prefix,
                })
        })
        .collect()
}
