//! Release configuration shared by the Erasmus release tooling.
//!
//! The release builder keys every artifact it produces on the version string
//! stored in the project's `version.json`. This crate owns the loader for that
//! descriptor ([`config`]) and the derivation of every path in the release
//! tree ([`layout`]). The project root is always passed in explicitly; nothing
//! here consults the process working directory.

pub mod config;
pub mod layout;

pub use config::{ConfigError, ReleaseConfig, VERSION_FILE};
pub use layout::ReleaseLayout;
