//! POSIX `sh` prelude renderer.
//!
//! Every plan step becomes a shell function and `main` calls them in order.
//! Fatal branches call `fail`, which exits the whole script with status 1.

use super::ScriptBuilder;
use crate::carrier::HostSyntax;
use crate::carrier::syntax::{BEGIN_MARKER, END_MARKER};
use crate::plan::{InstallPlan, InstallStep, OsFamily, OsPrerequisite};

/// Render the POSIX installer prelude.
#[must_use]
pub fn render(plan: &InstallPlan, version: &str) -> String {
    let mut script = ScriptBuilder::new("    ");
    header(&mut script, version);
    helpers(&mut script, plan);

    for step in plan.steps() {
        script.blank();
        script.line(0, HostSyntax::Posix.comment(step.summary()));
        match step {
            InstallStep::DetectEnvironment => detect_environment(&mut script, plan),
            InstallStep::CheckRuntimePrerequisite => check_runtime(&mut script, plan),
            InstallStep::CheckOsPrerequisites => check_os_prerequisites(&mut script, plan),
            InstallStep::InstallDependencyManager => install_dependency_manager(&mut script, plan),
            InstallStep::SetupEnvironmentFiles => setup_environment_files(&mut script, plan),
            InstallStep::ExtractAndVerifyPayload => extract_and_verify(&mut script, plan),
            InstallStep::RunPayload => run_payload(&mut script, plan),
        }
    }

    script.blank();
    script.line(0, "main() {");
    script.line(1, "require_saved_installer");
    for step in plan.steps() {
        script.line(1, step.label());
    }
    script.line(
        1,
        format!(
            "echo {}\" ${}\"",
            quote(plan.completion_message),
            plan.environment.variable
        ),
    );
    script.line(0, "}");
    script.blank();
    script.line(0, "main \"$@\"");
    script.finish(HostSyntax::Posix)
}

/// Quote `text` as a single shell word.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

fn header(script: &mut ScriptBuilder, version: &str) {
    script.line(0, "#!/bin/sh");
    script.line(0, format!("# Erasmus installer v{version}"));
    script.line(
        0,
        "# Generated by erasmus-release. The encoded payload follows main.",
    );
    script.blank();
    script.line(0, "INSTALLER_PATH=\"$0\"");
    script.line(0, "OS=\"Unknown\"");
    script.line(0, "PYTHON_CMD=\"\"");
    script.line(0, "IDE_ENV=\"\"");
}

fn helpers(script: &mut ScriptBuilder, plan: &InstallPlan) {
    script.blank();
    script.line(0, "fail() {");
    script.line(1, "echo \"$1\" >&2");
    script.line(1, "exit 1");
    script.line(0, "}");
    script.blank();
    script.line(0, "command_exists() {");
    script.line(1, "command -v \"$1\" >/dev/null 2>&1");
    script.line(0, "}");
    script.blank();
    script.line(0, "compute_sha256() {");
    script.line(1, "if command_exists sha256sum; then");
    script.line(2, "sha256sum \"$1\" | cut -d ' ' -f 1");
    script.line(1, "else");
    script.line(2, "shasum -a 256 \"$1\" | cut -d ' ' -f 1");
    script.line(1, "fi");
    script.line(0, "}");
    script.blank();
    // `curl ... | sh` leaves `$0` naming the shell, not a file holding the region.
    script.line(0, "require_saved_installer() {");
    script.line(
        1,
        format!(
            "if [ ! -f \"$INSTALLER_PATH\" ] || ! grep -q '^{}' \"$INSTALLER_PATH\"; then",
            HostSyntax::Posix.annotation_prefix()
        ),
    );
    script.line(2, format!("fail {}", quote(plan.payload.unsaved_message)));
    script.line(1, "fi");
    script.line(0, "}");
    script.blank();
    script.line(0, "decode_base64() {");
    script.line(1, "if printf 'QQ==' | base64 -d >/dev/null 2>&1; then");
    script.line(2, "base64 -d");
    script.line(1, "else");
    script.line(2, "base64 -D");
    script.line(1, "fi");
    script.line(0, "}");
}

fn detect_environment(script: &mut ScriptBuilder, plan: &InstallPlan) {
    script.line(0, "detect_environment() {");
    script.line(1, "UNAME_OUT=$(uname -s 2>/dev/null || echo unknown)");
    script.line(1, "case \"$UNAME_OUT\" in");
    for family in OsFamily::SUPPORTED {
        let patterns: Vec<String> = family
            .detection_patterns()
            .iter()
            .map(|pattern| format!("*{pattern}*"))
            .collect();
        script.line(
            2,
            format!("{}) OS=\"{}\" ;;", patterns.join("|"), family.name()),
        );
    }
    script.line(2, format!("*) OS=\"{}\" ;;", OsFamily::Unknown.name()));
    script.line(1, "esac");
    script.line(1, format!("echo {}\" $OS\"", quote(plan.detected_message)));
    script.line(0, "}");
}

fn check_runtime(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let runtime = &plan.runtime;
    script.line(0, "check_runtime_prerequisite() {");
    script.line(1, format!("for candidate in {}; do", runtime.candidates.join(" ")));
    script.line(
        2,
        format!(
            "if command_exists \"$candidate\" && \"$candidate\" -c {} >/dev/null 2>&1; then",
            quote(&runtime.check_expression())
        ),
    );
    script.line(3, "PYTHON_CMD=\"$candidate\"");
    script.line(3, "return 0");
    script.line(2, "fi");
    script.line(1, "done");
    script.line(1, format!("echo {} >&2", quote(runtime.failure_message)));
    script.line(1, format!("fail {}", quote(runtime.remediation)));
    script.line(0, "}");
}

/// Emit a `case` over `$OS` that calls `<label>_<slug>` for each family.
fn dispatch_by_family(script: &mut ScriptBuilder, plan: &InstallPlan, label: &str) {
    script.line(1, "case \"$OS\" in");
    for family in OsFamily::SUPPORTED {
        script.line(
            2,
            format!("{}) {label}_{} ;;", family.name(), family.slug()),
        );
    }
    script.line(
        2,
        format!("*) fail {}\" $OS\" ;;", quote(plan.unsupported_message)),
    );
    script.line(1, "esac");
}

fn check_os_prerequisites(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let label = InstallStep::CheckOsPrerequisites.label();
    script.line(0, format!("{label}() {{"));
    dispatch_by_family(script, plan, label);
    script.line(0, "}");

    for prerequisite in &plan.prerequisites {
        script.blank();
        prerequisite_function(script, label, prerequisite);
    }
}

fn prerequisite_function(script: &mut ScriptBuilder, label: &str, prerequisite: &OsPrerequisite) {
    let tool = prerequisite.tool;
    script.line(0, format!("{label}_{}() {{", prerequisite.family.slug()));
    script.line(1, format!("echo {}", quote(prerequisite.checking_message)));
    script.line(1, format!("if command_exists {tool}; then"));
    script.line(2, "return 0");
    script.line(1, "fi");
    if let Some(message) = prerequisite.installing_message {
        script.line(1, format!("echo {}", quote(message)));
    }
    for bootstrap in &prerequisite.bootstraps {
        let depth = match bootstrap.guard {
            Some(guard) => {
                script.line(1, format!("if command_exists {guard}; then"));
                2
            }
            None => 1,
        };
        script.line(depth, bootstrap.command);
        script.line(depth, format!("if command_exists {tool}; then"));
        script.line(depth + 1, "return 0");
        script.line(depth, "fi");
        if bootstrap.guard.is_some() {
            script.line(1, "fi");
        }
    }
    script.line(1, format!("fail {}", quote(prerequisite.failure_message)));
    script.line(0, "}");
}

fn install_dependency_manager(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let manager = &plan.dependency_manager;
    script.line(0, "install_dependency_manager() {");
    script.line(1, format!("echo {}", quote(manager.installing_message)));
    script.line(1, "case \"$OS\" in");
    for family in OsFamily::SUPPORTED {
        if let Some(command) = manager.install_command(family) {
            script.line(2, format!("{}) {command} ;;", family.name()));
        }
    }
    script.line(
        2,
        format!("*) fail {}\" $OS\" ;;", quote(plan.unsupported_message)),
    );
    script.line(1, "esac");
    script.line(
        1,
        format!("PATH=\"{}:$PATH\"", manager.search_paths.join(":")),
    );
    script.line(1, "export PATH");
    script.line(1, format!("if ! command_exists {}; then", manager.tool));
    script.line(2, format!("fail {}", quote(manager.failure_message)));
    script.line(1, "fi");
    script.line(1, format!("echo {}", quote(manager.success_message)));
    script.line(0, "}");
}

fn setup_environment_files(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let env = &plan.environment;
    script.line(0, "setup_environment_files() {");
    script.line(1, format!("echo {}", quote(env.announcement)));
    script.line(1, "{");
    for key in &env.keys {
        script.line(2, format!("printf '%s\\n' '{key}='"));
    }
    script.line(1, format!("}} > {}", quote(env.example_file)));
    script.line(1, format!("echo {}", quote(env.prompt)));
    script.line(
        1,
        format!("read -r {var} || {var}=\"\"", var = env.variable),
    );
    script.line(1, "{");
    for key in &env.keys {
        if *key == env.variable {
            script.line(2, format!("printf '%s\\n' \"{key}=${}\"", env.variable));
        } else {
            script.line(2, format!("printf '%s\\n' '{key}='"));
        }
    }
    script.line(1, format!("}} > {}", quote(env.live_file)));
    script.line(1, format!("echo {}", quote(env.success_message)));
    script.line(0, "}");
}

fn extract_and_verify(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let payload = &plan.payload;
    let syntax = HostSyntax::Posix;
    let prefix = syntax.comment_prefix();
    let file = quote(payload.file_name);

    script.line(0, "extract_and_verify_payload() {");
    script.line(1, format!("echo {}", quote(payload.announcement)));
    script.line(1, format!("echo {}", quote(payload.extracting_message)));
    script.line(
        1,
        format!(
            "EXPECTED_HASH=$(sed -n 's/^{}//p' \"$INSTALLER_PATH\" | tail -n 1)",
            syntax.annotation_prefix()
        ),
    );
    script.line(1, "if [ -z \"$EXPECTED_HASH\" ]; then");
    script.line(2, format!("fail {}", quote(payload.mismatch_message)));
    script.line(1, "fi");
    script.line(1, "ENCODED=$(awk '");
    script.line(
        2,
        format!(
            "$0 == \"{}\" {{ count = 0; inside = 1; found = 1; bad = 0; next }}",
            syntax.comment(BEGIN_MARKER)
        ),
    );
    script.line(
        2,
        format!("$0 == \"{}\" {{ inside = 0; next }}", syntax.comment(END_MARKER)),
    );
    script.line(
        2,
        format!(
            "inside && substr($0, 1, {len}) != \"{prefix}\" {{ bad = 1 }}",
            len = prefix.len()
        ),
    );
    script.line(
        2,
        format!("inside {{ lines[++count] = substr($0, {}) }}", prefix.len() + 1),
    );
    script.line(
        2,
        "END { if (!found || inside || bad) exit 1; for (i = 1; i <= count; i++) print lines[i] }",
    );
    script.line(1, "' \"$INSTALLER_PATH\") || fail 'Error: embedded payload is malformed.'");
    script.line(
        1,
        format!("if ! printf '%s\\n' \"$ENCODED\" | decode_base64 > {file}; then"),
    );
    script.line(2, format!("rm -f {file}"));
    script.line(2, "fail 'Error: embedded payload is not valid base64.'");
    script.line(1, "fi");
    script.line(1, format!("ACTUAL_HASH=$(compute_sha256 {file})"));
    script.line(1, "if [ \"$ACTUAL_HASH\" != \"$EXPECTED_HASH\" ]; then");
    script.line(2, format!("echo {} >&2", quote(payload.mismatch_message)));
    script.line(2, "echo \"Expected: $EXPECTED_HASH\" >&2");
    script.line(2, "echo \"Actual: $ACTUAL_HASH\" >&2");
    script.line(2, format!("rm -f {file}"));
    script.line(2, "exit 1");
    script.line(1, "fi");
    script.line(
        1,
        format!("echo {}\" $ACTUAL_HASH\"", quote(payload.verified_message)),
    );
    script.line(0, "}");
}

fn run_payload(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let payload = &plan.payload;
    let argument = format!("\"${}\"", plan.environment.variable);
    script.line(0, "run_payload() {");
    script.line(1, format!("echo {}", quote(payload.running_message)));
    script.line(1, format!("if ! {}; then", payload.command(&argument)));
    script.line(2, format!("fail {}", quote(payload.failure_message)));
    script.line(1, "fi");
    script.line(1, format!("echo {}", quote(payload.success_message)));
    script.line(0, "}");
}
