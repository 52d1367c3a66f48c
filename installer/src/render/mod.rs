//! Installer prelude renderers.
//!
//! Each renderer turns the shared [`InstallPlan`] into installer logic for one
//! host syntax. The rendered prelude ends with a newline and is followed
//! directly by the embedded region.
//!
//! - [`posix`]: POSIX `sh` functions called from `main`.
//! - [`batch`]: `cmd.exe` labelled subroutines called from `:main`.

pub mod batch;
pub mod posix;

use crate::carrier::HostSyntax;
use crate::plan::InstallPlan;

/// Render the prelude for `syntax`.
///
/// # Examples
///
/// ```
/// use erasmus_installer::carrier::HostSyntax;
/// use erasmus_installer::plan::InstallPlan;
/// use erasmus_installer::render::render_prelude;
///
/// let prelude = render_prelude(HostSyntax::Posix, &InstallPlan::erasmus(), "1.2.3");
/// assert!(prelude.starts_with("#!/bin/sh\n"));
/// ```
#[must_use]
pub fn render_prelude(syntax: HostSyntax, plan: &InstallPlan, version: &str) -> String {
    match syntax {
        HostSyntax::Posix => posix::render(plan, version),
        HostSyntax::Batch => batch::render(plan, version),
    }
}

/// Accumulates script lines and joins them with the host newline.
#[derive(Debug)]
struct ScriptBuilder {
    lines: Vec<String>,
    indent: &'static str,
}

impl ScriptBuilder {
    fn new(indent: &'static str) -> Self {
        Self {
            lines: Vec::new(),
            indent,
        }
    }

    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        self.lines
            .push(format!("{}{}", self.indent.repeat(depth), text.as_ref()));
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn finish(self, syntax: HostSyntax) -> String {
        let newline = syntax.newline();
        let mut text = self.lines.join(newline);
        text.push_str(newline);
        text
    }
}
