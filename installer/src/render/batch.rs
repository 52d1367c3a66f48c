//! Windows batch prelude renderer.
//!
//! Every plan step becomes a labelled subroutine ending in `exit /b`. Family
//! branches jump to `:<step>_<family>` labels rather than using parenthesised
//! blocks, and `:main` stops at the first subroutine that sets `ERRORLEVEL`.
//! Payload extraction is delegated to a single PowerShell command.

use super::ScriptBuilder;
use crate::carrier::HostSyntax;
use crate::carrier::syntax::{BEGIN_MARKER, END_MARKER};
use crate::plan::{InstallPlan, InstallStep, OsFamily, OsPrerequisite};

/// Variable holding the installer's own path, captured before any `call`.
const INSTALLER_VAR: &str = "ERASMUS_INSTALLER";

/// Render the batch installer prelude.
#[must_use]
pub fn render(plan: &InstallPlan, version: &str) -> String {
    let mut script = ScriptBuilder::new("    ");
    header(&mut script, plan, version);

    for step in plan.steps() {
        script.blank();
        script.line(0, HostSyntax::Batch.comment(step.summary()));
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
    script.line(0, ":main");
    for step in plan.steps() {
        script.line(0, format!("call :{}", step.label()));
        script.line(0, "if errorlevel 1 exit /b 1");
    }
    script.line(
        0,
        format!(
            "echo {} !{}!",
            escape(plan.completion_message),
            plan.environment.variable
        ),
    );
    script.line(0, "exit /b 0");
    script.finish(HostSyntax::Batch)
}

/// Escape `cmd.exe` metacharacters in echoed text.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' | '|' | '<' | '>' | '(' | ')' => {
                escaped.push('^');
                escaped.push(ch);
            }
            '%' => escaped.push_str("%%"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn echo(text: &str) -> String {
    format!("echo {}", escape(text))
}

fn echo_err(text: &str) -> String {
    format!(">&2 echo {}", escape(text))
}

fn header(script: &mut ScriptBuilder, plan: &InstallPlan, version: &str) {
    script.line(0, "@echo off");
    script.line(0, HostSyntax::Batch.comment(&format!("Erasmus installer v{version}")));
    script.line(
        0,
        HostSyntax::Batch.comment("Generated by erasmus-release. The encoded payload follows :main."),
    );
    script.line(0, "setlocal enabledelayedexpansion");
    script.line(0, format!("set \"{INSTALLER_VAR}=%~f0\""));
    script.line(0, format!("set \"OS={}\"", OsFamily::Unknown.name()));
    script.line(0, "set \"PYTHON_CMD=\"");
    script.line(0, format!("set \"{}=\"", plan.environment.variable));
    script.line(0, "call :main");
    script.line(0, "exit /b %ERRORLEVEL%");
}

fn unsupported(script: &mut ScriptBuilder, plan: &InstallPlan) {
    script.line(
        0,
        format!(">&2 echo {} !OS!", escape(plan.unsupported_message)),
    );
    script.line(0, "exit /b 1");
}

/// Jump to `:<label>_<slug>` for the detected family, failing otherwise.
fn dispatch_by_family(script: &mut ScriptBuilder, plan: &InstallPlan, label: &str) {
    for family in OsFamily::SUPPORTED {
        script.line(
            0,
            format!(
                "if \"!OS!\"==\"{}\" goto :{label}_{}",
                family.name(),
                family.slug()
            ),
        );
    }
    unsupported(script, plan);
}

fn detect_environment(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let label = InstallStep::DetectEnvironment.label();
    script.line(0, format!(":{label}"));
    script.line(0, format!("set \"OS={}\"", OsFamily::Unknown.name()));
    script.line(0, "set \"VER_OUT=unknown\"");
    script.line(
        0,
        "for /f \"tokens=* usebackq\" %%i in (`ver`) do set \"VER_OUT=%%i\"",
    );
    for family in OsFamily::SUPPORTED {
        for pattern in family.detection_patterns() {
            script.line(
                0,
                format!(
                    "if not \"!VER_OUT:{pattern}=!\"==\"!VER_OUT!\" goto :{label}_{}",
                    family.slug()
                ),
            );
        }
    }
    script.line(0, format!("goto :{label}_done"));
    for family in OsFamily::SUPPORTED {
        script.line(0, format!(":{label}_{}", family.slug()));
        script.line(0, format!("set \"OS={}\"", family.name()));
        script.line(0, format!("goto :{label}_done"));
    }
    script.line(0, format!(":{label}_done"));
    script.line(0, format!("echo {} !OS!", escape(plan.detected_message)));
    script.line(0, "exit /b 0");
}

fn check_runtime(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let runtime = &plan.runtime;
    script.line(0, format!(":{}", InstallStep::CheckRuntimePrerequisite.label()));
    script.line(0, "set \"PYTHON_CMD=\"");
    for candidate in &runtime.candidates {
        script.line(
            0,
            format!(
                "where {candidate} >nul 2>&1 && {candidate} -c \"{}\" >nul 2>&1 && set \"PYTHON_CMD={candidate}\"",
                runtime.check_expression()
            ),
        );
        script.line(0, "if defined PYTHON_CMD exit /b 0");
    }
    script.line(0, echo_err(runtime.failure_message));
    script.line(0, echo_err(runtime.remediation));
    script.line(0, "exit /b 1");
}

fn check_os_prerequisites(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let label = InstallStep::CheckOsPrerequisites.label();
    script.line(0, format!(":{label}"));
    dispatch_by_family(script, plan, label);
    for prerequisite in &plan.prerequisites {
        prerequisite_subroutine(script, label, prerequisite);
    }
}

fn prerequisite_subroutine(script: &mut ScriptBuilder, label: &str, prerequisite: &OsPrerequisite) {
    let tool = prerequisite.tool;
    let found = format!("where {tool} >nul 2>&1 && exit /b 0");
    script.line(0, format!(":{label}_{}", prerequisite.family.slug()));
    script.line(0, echo(prerequisite.checking_message));
    script.line(0, &found);
    if let Some(message) = prerequisite.installing_message {
        script.line(0, echo(message));
    }
    for bootstrap in &prerequisite.bootstraps {
        match bootstrap.guard {
            Some(guard) => script.line(
                0,
                format!("where {guard} >nul 2>&1 && {}", bootstrap.command),
            ),
            None => script.line(0, bootstrap.command),
        }
        script.line(0, &found);
    }
    script.line(0, echo_err(prerequisite.failure_message));
    script.line(0, "exit /b 1");
}

fn install_dependency_manager(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let label = InstallStep::InstallDependencyManager.label();
    let manager = &plan.dependency_manager;
    script.line(0, format!(":{label}"));
    script.line(0, echo(manager.installing_message));
    dispatch_by_family(script, plan, label);
    for family in OsFamily::SUPPORTED {
        if let Some(command) = manager.install_command(family) {
            script.line(0, format!(":{label}_{}", family.slug()));
            script.line(0, command);
            script.line(0, format!("goto :{label}_verify"));
        }
    }

    let search_paths: Vec<String> = manager
        .search_paths
        .iter()
        .map(|path| path.replace("$HOME", "%USERPROFILE%").replace('/', "\\"))
        .collect();
    script.line(0, format!(":{label}_verify"));
    script.line(0, format!("set \"PATH={};%PATH%\"", search_paths.join(";")));
    script.line(0, format!("where {} >nul 2>&1 || goto :{label}_missing", manager.tool));
    script.line(0, echo(manager.success_message));
    script.line(0, "exit /b 0");
    script.line(0, format!(":{label}_missing"));
    script.line(0, echo_err(manager.failure_message));
    script.line(0, "exit /b 1");
}

fn setup_environment_files(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let env = &plan.environment;
    script.line(0, format!(":{}", InstallStep::SetupEnvironmentFiles.label()));
    script.line(0, echo(env.announcement));
    script.line(0, format!("type nul > \"{}\"", env.example_file));
    for key in &env.keys {
        script.line(0, format!(">>\"{}\" echo {key}=", env.example_file));
    }
    script.line(0, echo(env.prompt));
    script.line(0, format!("set \"{}=\"", env.variable));
    script.line(0, format!("set /p \"{}=\"", env.variable));
    script.line(0, format!("type nul > \"{}\"", env.live_file));
    for key in &env.keys {
        if *key == env.variable {
            script.line(
                0,
                format!(">>\"{}\" echo {key}=!{}!", env.live_file, env.variable),
            );
        } else {
            script.line(0, format!(">>\"{}\" echo {key}=", env.live_file));
        }
    }
    script.line(0, echo(env.success_message));
    script.line(0, "exit /b 0");
}

/// PowerShell statements that extract and verify the payload.
///
/// The command is passed inside double quotes on one line, so it must not
/// contain `"`, `%`, `!`, or `^`.
fn extraction_command(plan: &InstallPlan) -> String {
    let syntax = HostSyntax::Batch;
    let payload = &plan.payload;
    let annotation = syntax.annotation_prefix();
    let prefix = syntax.comment_prefix();
    let fail = |message: &str| format!("[Console]::Error.WriteLine('{message}'); exit 1");

    let statements = [
        "$ErrorActionPreference = 'Stop'".to_owned(),
        format!("$lines = [IO.File]::ReadAllLines($env:{INSTALLER_VAR})"),
        format!(
            "$annotation = $lines | Where-Object {{ $_.StartsWith('{annotation}') }} | Select-Object -Last 1"
        ),
        format!(
            "if ($null -eq $annotation) {{ {} }}",
            fail(payload.mismatch_message)
        ),
        format!("$expected = $annotation.Substring({})", annotation.len()),
        format!(
            "$begin = [Array]::LastIndexOf($lines, '{}')",
            syntax.comment(BEGIN_MARKER)
        ),
        format!(
            "$end = if ($begin -ge 0) {{ [Array]::IndexOf($lines, '{}', $begin) }} else {{ -1 }}",
            syntax.comment(END_MARKER)
        ),
        format!(
            "if ($end -lt 0) {{ {} }}",
            fail("Error: embedded payload is malformed.")
        ),
        "$encoded = New-Object System.Collections.Generic.List[string]".to_owned(),
        format!(
            "for ($i = $begin + 1; $i -lt $end; $i++) {{ if (-not $lines[$i].StartsWith('{prefix}')) {{ {} }}; $encoded.Add($lines[$i].Substring({})) }}",
            fail("Error: embedded payload is malformed."),
            prefix.len()
        ),
        "$block = $encoded -join ''".to_owned(),
        format!(
            "$target = Join-Path (Get-Location) '{}'",
            payload.file_name
        ),
        "[IO.File]::WriteAllBytes($target, [Convert]::FromBase64String($block))".to_owned(),
        "$actual = (Get-FileHash -Algorithm SHA256 -LiteralPath $target).Hash.ToLowerInvariant()"
            .to_owned(),
        format!(
            "if ($actual -cne $expected) {{ [Console]::Error.WriteLine('{}'); [Console]::Error.WriteLine('Expected: ' + $expected); [Console]::Error.WriteLine('Actual: ' + $actual); Remove-Item -LiteralPath $target -Force; exit 1 }}",
            payload.mismatch_message
        ),
        format!("Write-Output ('{} ' + $actual)", payload.verified_message),
    ];
    statements.join("; ")
}

fn extract_and_verify(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let payload = &plan.payload;
    script.line(0, format!(":{}", InstallStep::ExtractAndVerifyPayload.label()));
    script.line(0, echo(payload.announcement));
    script.line(0, echo(payload.extracting_message));
    script.line(
        0,
        format!(
            "powershell -NoProfile -ExecutionPolicy Bypass -Command \"{}\"",
            extraction_command(plan)
        ),
    );
    script.line(0, "if errorlevel 1 exit /b 1");
    script.line(0, "exit /b 0");
}

fn run_payload(script: &mut ScriptBuilder, plan: &InstallPlan) {
    let label = InstallStep::RunPayload.label();
    let payload = &plan.payload;
    let argument = format!("\"!{}!\"", plan.environment.variable);
    script.line(0, format!(":{label}"));
    script.line(0, echo(payload.running_message));
    script.line(0, payload.command(&argument));
    script.line(0, format!("if errorlevel 1 goto :{label}_failed"));
    script.line(0, echo(payload.success_message));
    script.line(0, "exit /b 0");
    script.line(0, format!(":{label}_failed"));
    script.line(0, echo_err(payload.failure_message));
    script.line(0, "exit /b 1");
}
