//! CLI argument definitions for the Erasmus release builder.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::carrier::PreludeSource;
use crate::packager::FilePackager;
use crate::pipeline::BuildOptions;
use crate::verify::VerifyOptions;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};

/// Payload source used when no `--source` is given.
pub const DEFAULT_SOURCE: &str = "erasmus.py";

/// Build self-extracting Erasmus installers.
#[derive(Parser, Debug)]
#[command(name = "erasmus-release")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build self-extracting Erasmus installers.\n\n",
    "Reads the version from version.json under the project root, packages the ",
    "payload, and writes release/v<VERSION>/ containing the payload, its SHA-256 ",
    "digest file, a POSIX shell installer, and a Windows batch installer. Both ",
    "installers embed the payload as base64 and verify it before running it.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build a release from the current directory:\n",
    "    $ erasmus-release\n\n",
    "  Package two scripts and use a hand-written shell prelude:\n",
    "    $ erasmus-release build -s erasmus.py -s helpers.py --template scripts/install.sh\n\n",
    "  Check a built installer and extract its payload:\n",
    "    $ erasmus-release verify release/v0.1.0/erasmus_v0.1.0.sh --output erasmus.py",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Build arguments (used when no subcommand is given).
    #[command(flatten)]
    pub build: BuildArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build a release (default when no subcommand given).
    Build(BuildArgs),

    /// Verify a built installer's embedded payload.
    Verify(VerifyArgs),
}

/// Arguments for the build command.
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Project root containing version.json.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub root: Utf8PathBuf,

    /// Payload source file, relative to the root (can be repeated).
    #[arg(short, long = "source", value_name = "FILE")]
    pub sources: Vec<Utf8PathBuf>,

    /// Hand-written POSIX shell prelude, relative to the root.
    #[arg(long, value_name = "FILE")]
    pub template: Option<Utf8PathBuf>,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

impl BuildArgs {
    /// Return the payload sources resolved against the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use erasmus_installer::cli::BuildArgs;
    ///
    /// let args = BuildArgs {
    ///     root: Utf8PathBuf::from("/work/erasmus"),
    ///     ..BuildArgs::default()
    /// };
    /// assert_eq!(
    ///     args.resolved_sources(),
    ///     vec![Utf8PathBuf::from("/work/erasmus/erasmus.py")]
    /// );
    /// ```
    #[must_use]
    pub fn resolved_sources(&self) -> Vec<Utf8PathBuf> {
        if self.sources.is_empty() {
            return vec![self.root.join(DEFAULT_SOURCE)];
        }
        self.sources.iter().map(|source| self.resolve(source)).collect()
    }

    /// Build pipeline options from these arguments.
    #[must_use]
    pub fn build_options(&self) -> BuildOptions {
        let prelude = self
            .template
            .as_deref()
            .map_or(PreludeSource::Rendered, |template| {
                PreludeSource::Template(self.resolve(template))
            });
        BuildOptions {
            root: self.root.clone(),
            prelude,
            quiet: self.quiet,
        }
    }

    /// Build the packager for the resolved sources.
    #[must_use]
    pub fn packager(&self) -> FilePackager {
        FilePackager::new(self.resolved_sources())
    }

    fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.root.join(path)
    }
}

impl Default for BuildArgs {
    /// Creates `BuildArgs` rooted at the current directory with no overrides.
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            sources: Vec::new(),
            template: None,
            quiet: false,
        }
    }
}

/// Arguments for the verify command.
#[derive(Parser, Debug, Clone)]
pub struct VerifyArgs {
    /// Installer to verify (.sh or .bat).
    #[arg(value_name = "INSTALLER")]
    pub installer: Utf8PathBuf,

    /// Write the verified payload to this file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,

    /// Digest file the payload must also match.
    #[arg(long, value_name = "FILE")]
    pub sha256: Option<Utf8PathBuf>,
}

impl VerifyArgs {
    /// Build verification options from these arguments.
    #[must_use]
    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            installer: self.installer.clone(),
            output: self.output.clone(),
            digest_file: self.sha256.clone(),
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
