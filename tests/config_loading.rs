//! Behaviour-driven tests for release configuration loading.

use camino::Utf8Path;
use erasmus::{ConfigError, ReleaseConfig, ReleaseLayout, VERSION_FILE};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use tempfile::TempDir;

#[derive(Default)]
struct ConfigWorld {
    temp_dir: Option<TempDir>,
    outcome: Option<Result<ReleaseConfig, ConfigError>>,
}

#[fixture]
fn world() -> ConfigWorld {
    ConfigWorld {
        temp_dir: Some(TempDir::new().expect("temp dir")),
        ..ConfigWorld::default()
    }
}

fn root(world: &ConfigWorld) -> &Utf8Path {
    let temp = world.temp_dir.as_ref().expect("temp_dir set");
    Utf8Path::from_path(temp.path()).expect("utf-8 temp path")
}

fn write_descriptor(world: &ConfigWorld, contents: &str) {
    fs::write(root(world).join(VERSION_FILE), contents).expect("write descriptor");
}

fn loaded(world: &ConfigWorld) -> &ReleaseConfig {
    match world.outcome.as_ref() {
        Some(Ok(config)) => config,
        Some(Err(err)) => panic!("expected configuration to load: {err}"),
        None => panic!("configuration should be loaded"),
    }
}

fn failure(world: &ConfigWorld) -> &ConfigError {
    match world.outcome.as_ref() {
        Some(Err(err)) => err,
        Some(Ok(config)) => panic!("expected loading to fail but got {config:?}"),
        None => panic!("configuration should be loaded"),
    }
}

#[given("a project root with version \"{version}\"")]
fn given_version(world: &mut ConfigWorld, version: String) {
    let contents = serde_json::json!({ "version": version }).to_string();
    write_descriptor(world, &contents);
}

#[given("a project root whose descriptor is '{contents}'")]
fn given_descriptor(world: &mut ConfigWorld, contents: String) {
    write_descriptor(world, &contents);
}

#[given("a project root without a version descriptor")]
#[expect(unused_variables, reason = "rstest-bdd requires the world parameter")]
fn given_no_descriptor(world: &mut ConfigWorld) {
    // The fixture's temp directory starts empty.
}

#[when("the release configuration is loaded")]
fn when_loaded(world: &mut ConfigWorld) {
    let outcome = ReleaseConfig::load(root(world));
    world.outcome = Some(outcome);
}

#[then("the release version is \"{version}\"")]
fn then_version(world: &mut ConfigWorld, version: String) {
    assert_eq!(loaded(world).version(), version);
}

#[then("the shell installer path ends with \"{suffix}\"")]
fn then_shell_path(world: &mut ConfigWorld, suffix: String) {
    let layout = ReleaseLayout::new(root(world), loaded(world));
    let path = layout.shell_installer_path();
    assert!(
        path.as_str().ends_with(&suffix),
        "expected {path} to end with {suffix}"
    );
}

#[then("a configuration error mentioning \"{snippet}\" is reported")]
fn then_error_mentions(world: &mut ConfigWorld, snippet: String) {
    let message = failure(world).to_string();
    assert!(
        message.contains(&snippet),
        "expected error '{message}' to mention '{snippet}'"
    );
}

#[then("remediation guidance is offered")]
fn then_remediation(world: &mut ConfigWorld) {
    let hint = failure(world).remediation().expect("remediation text");
    assert!(hint.contains("version.json"), "unexpected hint: {hint}");
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "A version descriptor yields the release layout"
)]
fn scenario_layout(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "Extra descriptor fields are ignored"
)]
fn scenario_extra_fields(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "A descriptor without a version is rejected"
)]
fn scenario_missing_version(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "A missing descriptor is rejected"
)]
fn scenario_missing_descriptor(world: ConfigWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_loading.feature",
    name = "A version that escapes the release directory is rejected"
)]
fn scenario_unsafe_version(world: ConfigWorld) {
    let _ = world;
}
