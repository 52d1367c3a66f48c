//! Erasmus release builder library.
//!
//! This crate packages the Erasmus payload, embeds it verifiably into
//! self-extracting installers for POSIX shells and Windows batch, and checks
//! built installers natively. It is used by the `erasmus-release` CLI binary
//! and can be consumed programmatically for testing or custom release
//! workflows.
//!
//! # Modules
//!
//! - [`carrier`] - Embedded regions, carrier assembly, and native extraction
//! - [`cli`] - Command-line argument definitions
//! - [`error`] - Release error types with remediation hints
//! - [`output`] - Progress lines and the release summary
//! - [`packager`] - Payload packaging behind the `Packager` seam
//! - [`payload`] - Payload bytes, base64 encoding, and SHA-256 digests
//! - [`pipeline`] - Release build orchestration
//! - [`plan`] - The shared seven-step install plan
//! - [`render`] - Plan renderers for POSIX `sh` and `cmd.exe`
//! - [`verify`] - Verification of built installers

mod atomic;

pub mod carrier;
pub mod cli;
pub mod error;
pub mod output;
pub mod packager;
pub mod payload;
pub mod pipeline;
pub mod plan;
pub mod render;
pub mod verify;
