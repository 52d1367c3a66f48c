//! Base64 block encoding for embedded payloads.
//!
//! Payload bytes are encoded with the standard padded alphabet and wrapped at
//! [`LINE_WIDTH`] characters. The alphabet never produces `#`, `:`, spaces, or
//! line breaks, so an encoded line can never be mistaken for a marker line.

use super::error::Result;
use base64::{Engine, engine::general_purpose::STANDARD};

/// Maximum number of characters on one encoded line.
pub const LINE_WIDTH: usize = 76;

/// A payload encoded as wrapped base64 lines.
///
/// Every line except the last is exactly [`LINE_WIDTH`] characters long. An
/// empty payload encodes to zero lines.
///
/// # Examples
///
/// ```
/// use erasmus_installer::payload::EncodedPayload;
///
/// let encoded = EncodedPayload::encode(b"print('hi')");
/// assert_eq!(encoded.lines(), ["cHJpbnQoJ2hpJyk="]);
/// assert_eq!(encoded.decode()?, b"print('hi')");
/// # Ok::<(), erasmus_installer::payload::PayloadError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    lines: Vec<String>,
}

impl EncodedPayload {
    /// Encode `bytes` and wrap the result into lines.
    #[must_use]
    pub fn encode(bytes: &[u8]) -> Self {
        let encoded: Vec<char> = STANDARD.encode(bytes).chars().collect();
        let lines = encoded
            .chunks(LINE_WIDTH)
            .map(|chunk| chunk.iter().collect())
            .collect();
        Self { lines }
    }

    /// Return the wrapped lines in order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Return the number of wrapped lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Decode the block back to the original bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Decode`](super::PayloadError::Decode) when the
    /// joined text is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        decode_lines(&self.lines)
    }
}

/// Join `lines` in order and decode them as one base64 block.
///
/// # Errors
///
/// Returns [`PayloadError::Decode`](super::PayloadError::Decode) when the
/// joined text is not valid padded base64.
pub fn decode_lines<I, S>(lines: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined: String = lines.into_iter().fold(String::new(), |mut acc, line| {
        acc.push_str(line.as_ref());
        acc
    });
    Ok(STANDARD.decode(joined)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadError;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn empty_payload_has_no_lines() {
        let encoded = EncodedPayload::encode(b"");
        assert_eq!(encoded.line_count(), 0);
        assert_eq!(encoded.decode().expect("decodes"), Vec::<u8>::new());
    }

    #[rstest]
    #[case::one_short_line(10)]
    #[case::exactly_one_line(57)]
    #[case::spills_over(58)]
    #[case::many_lines(4_000)]
    fn wraps_at_line_width(#[case] size: usize) {
        let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let encoded = EncodedPayload::encode(&payload);
        let (last, full) = encoded.lines().split_last().expect("non-empty payload");

        assert!(full.iter().all(|line| line.len() == LINE_WIDTH));
        assert!(!last.is_empty() && last.len() <= LINE_WIDTH);
        assert_eq!(encoded.decode().expect("decodes"), payload);
    }

    #[test]
    fn lines_concatenate_to_plain_base64() {
        let encoded = EncodedPayload::encode(&[0xff; 200]);
        assert_eq!(encoded.lines().concat(), STANDARD.encode([0xff; 200]));
    }

    proptest! {
        #[test]
        fn decode_lines_reverses_encode(payload in prop::collection::vec(any::<u8>(), 0..=4096)) {
            let encoded = EncodedPayload::encode(&payload);
            let decoded = decode_lines(encoded.lines()).expect("encoded payload decodes");
            prop_assert_eq!(decoded, payload);
        }

        #[test]
        fn only_the_last_line_is_short(payload in prop::collection::vec(any::<u8>(), 1..=4096)) {
            let encoded = EncodedPayload::encode(&payload);
            let (last, full) = encoded.lines().split_last().expect("non-empty payload");
            prop_assert!(full.iter().all(|line| line.len() == LINE_WIDTH));
            prop_assert!(!last.is_empty() && last.len() <= LINE_WIDTH);
        }
    }

    #[test]
    fn encoded_lines_avoid_marker_characters() {
        let payload: Vec<u8> = (0..=255).collect();
        let encoded = EncodedPayload::encode(&payload);
        for line in encoded.lines() {
            assert!(!line.contains(['#', ':', ' ', '\n', '\r']), "line {line}");
        }
    }

    #[test]
    fn decode_lines_rejects_invalid_text() {
        let err = decode_lines(["not*base64"]).expect_err("invalid base64");
        assert!(matches!(err, PayloadError::Decode(_)));
    }
}
