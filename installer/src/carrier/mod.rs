//! Carrier scripts: installers that embed a verifiable payload.
//!
//! A carrier is an installer prelude followed by an embedded region. The
//! region holds a marker, the payload digest, an exit guard that stops the
//! interpreter, and the base64 block, every line of it inert for the host.
//!
//! # Sub-modules
//!
//! - [`embed`]: carrier assembly and atomic writing (`CarrierScript`).
//! - [`error`]: embedding and extraction errors.
//! - [`extract`]: native extraction and verification.
//! - [`region`]: the embedded region and its inertness check.
//! - [`syntax`]: host syntax and marker vocabulary (`HostSyntax`).

pub mod embed;
pub mod error;
pub mod extract;
pub mod region;
pub mod syntax;

pub use embed::{CarrierScript, PreludeSource, embed_carrier};
pub use error::{EmbedError, ExtractionError};
pub use extract::{ExtractedPayload, extract_verified, extract_verified_bytes};
pub use region::{EmbeddedRegion, RegionLine, check_inert};
pub use syntax::HostSyntax;
