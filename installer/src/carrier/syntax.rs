//! Host syntax of carrier scripts and the fixed marker vocabulary.

use crate::payload::Sha256Digest;
use std::fmt;

/// Marker announcing the start of the embedded region.
pub const EMBEDDED_MARKER: &str = "__ERASMUS_EMBEDDED_BELOW__";

/// Human-readable note that follows the embedded marker.
pub const EMBEDDED_NOTE: &str = "The content below this line is the base64-encoded erasmus.py file";

/// Key of the digest annotation line.
pub const DIGEST_KEY: &str = "SHA256_HASH=";

/// Marker line preceding the encoded block.
pub const BEGIN_MARKER: &str = "BEGIN_BASE64_CONTENT";

/// Marker line following the encoded block.
pub const END_MARKER: &str = "END_BASE64_CONTENT";

/// The interpreter family a carrier script is written for.
///
/// # Examples
///
/// ```
/// use erasmus_installer::carrier::HostSyntax;
///
/// assert_eq!(HostSyntax::Posix.comment("BEGIN_BASE64_CONTENT"), "# BEGIN_BASE64_CONTENT");
/// assert_eq!(HostSyntax::Batch.comment("BEGIN_BASE64_CONTENT"), ":: BEGIN_BASE64_CONTENT");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSyntax {
    /// POSIX `sh`.
    Posix,
    /// Windows `cmd.exe` batch.
    Batch,
}

impl HostSyntax {
    /// Every supported syntax.
    pub const ALL: [Self; 2] = [Self::Posix, Self::Batch];

    /// Prefix that turns a line into a comment.
    #[must_use]
    pub const fn comment_prefix(self) -> &'static str {
        match self {
            Self::Posix => "# ",
            Self::Batch => ":: ",
        }
    }

    /// Statement that ends the script successfully.
    #[must_use]
    pub const fn exit_guard(self) -> &'static str {
        match self {
            Self::Posix => "exit 0",
            Self::Batch => "exit /b 0",
        }
    }

    /// Line terminator.
    ///
    /// `cmd.exe` mis-resolves `goto` labels in files with bare LF endings.
    #[must_use]
    pub const fn newline(self) -> &'static str {
        match self {
            Self::Posix => "\n",
            Self::Batch => "\r\n",
        }
    }

    /// File extension of carriers in this syntax.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Posix => "sh",
            Self::Batch => "bat",
        }
    }

    /// Prefix `text` with the comment marker.
    #[must_use]
    pub fn comment(self, text: &str) -> String {
        format!("{}{text}", self.comment_prefix())
    }

    /// Leading text of the digest annotation line.
    #[must_use]
    pub fn annotation_prefix(self) -> String {
        self.comment(DIGEST_KEY)
    }

    /// Full digest annotation line for `digest`.
    #[must_use]
    pub fn digest_annotation(self, digest: &Sha256Digest) -> String {
        format!("{}{digest}", self.annotation_prefix())
    }
}

impl fmt::Display for HostSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix => f.write_str("POSIX shell"),
            Self::Batch => f.write_str("Windows batch"),
        }
    }
}
