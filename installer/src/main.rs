//! Erasmus release builder CLI entrypoint.
//!
//! This binary packages the Erasmus payload and writes the self-extracting
//! shell and batch installers for the version named in `version.json`. The
//! `verify` subcommand checks an installer's embedded payload natively.

use clap::Parser;
use erasmus_installer::cli::{BuildArgs, Cli, Command, VerifyArgs};
use erasmus_installer::error::{ReleaseError, Result};
use erasmus_installer::output::{release_summary, write_stderr_line};
use erasmus_installer::pipeline::build_release;
use erasmus_installer::verify::verify_installer;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Some(Command::Build(args)) => run_build(args, stderr),
        Some(Command::Verify(args)) => run_verify(args, stderr),
        None => run_build(&cli.build, stderr),
    }
}

fn run_build(args: &BuildArgs, stderr: &mut dyn Write) -> Result<()> {
    let options = args.build_options();
    let artifacts = build_release(&options, &args.packager(), stderr)?;
    if !options.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, release_summary(&artifacts));
    }
    Ok(())
}

fn run_verify(args: &VerifyArgs, stderr: &mut dyn Write) -> Result<()> {
    verify_installer(&args.verify_options(), stderr)?;
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err, stderr);
            1
        }
    }
}

fn report_error(err: &ReleaseError, stderr: &mut dyn Write) {
    write_stderr_line(stderr, format!("Error: {err}"));
    if let Some(remediation) = err.remediation() {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, remediation);
    }
}
