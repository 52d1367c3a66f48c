//! Behaviour-driven tests for the release build.
//!
//! These scenarios run the full pipeline against a temporary project root
//! and inspect the artifacts it leaves behind.

use camino::{Utf8Path, Utf8PathBuf};
use erasmus_installer::carrier::{PreludeSource, extract_verified};
use erasmus_installer::error::ReleaseError;
use erasmus_installer::packager::FilePackager;
use erasmus_installer::payload::Sha256Digest;
use erasmus_installer::pipeline::{BuildOptions, ReleaseArtifacts, build_release};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use tempfile::TempDir;

#[derive(Default)]
struct ReleaseWorld {
    temp_dir: Option<TempDir>,
    payload: Vec<u8>,
    outcome: Option<Result<ReleaseArtifacts, ReleaseError>>,
    first_build: Option<(Vec<u8>, Vec<u8>)>,
}

#[fixture]
fn world() -> ReleaseWorld {
    ReleaseWorld {
        temp_dir: Some(TempDir::new().expect("temp dir")),
        ..ReleaseWorld::default()
    }
}

fn root(world: &ReleaseWorld) -> Utf8PathBuf {
    let temp = world.temp_dir.as_ref().expect("temp_dir set");
    Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp path")
}

fn write_descriptor(world: &ReleaseWorld, contents: &str) {
    fs::write(root(world).join("version.json"), contents).expect("write descriptor");
}

fn build(world: &ReleaseWorld) -> Result<ReleaseArtifacts, ReleaseError> {
    let root = root(world);
    let options = BuildOptions {
        root: root.clone(),
        prelude: PreludeSource::Rendered,
        quiet: true,
    };
    let packager = FilePackager::new(vec![root.join("erasmus.py")]);
    let mut stderr = Vec::new();
    build_release(&options, &packager, &mut stderr)
}

fn artifacts(world: &ReleaseWorld) -> &ReleaseArtifacts {
    match world.outcome.as_ref() {
        Some(Ok(artifacts)) => artifacts,
        Some(Err(err)) => panic!("expected the build to succeed: {err}"),
        None => panic!("the release should be built"),
    }
}

fn failure(world: &ReleaseWorld) -> &ReleaseError {
    match world.outcome.as_ref() {
        Some(Err(err)) => err,
        Some(Ok(artifacts)) => panic!("expected the build to fail, got {artifacts:?}"),
        None => panic!("the release should be built"),
    }
}

fn assert_extracts_payload(world: &ReleaseWorld, installer: &Utf8Path) {
    let text = fs::read_to_string(installer).expect("read installer");
    let extracted = extract_verified(&text).expect("installer verifies");
    assert_eq!(extracted.bytes(), world.payload.as_slice(), "{installer}");
}

fn installer_bytes(artifacts: &ReleaseArtifacts) -> (Vec<u8>, Vec<u8>) {
    (
        fs::read(&artifacts.shell_installer).expect("read shell installer"),
        fs::read(&artifacts.batch_installer).expect("read batch installer"),
    )
}

// ---------------------------------------------------------------------------
// Given
// ---------------------------------------------------------------------------

#[given("a project at version \"{version}\" with payload \"{payload}\"")]
fn given_project(world: &mut ReleaseWorld, version: String, payload: String) {
    write_descriptor(world, &format!(r#"{{"version": "{version}"}}"#));
    fs::write(root(world).join("erasmus.py"), &payload).expect("write payload source");
    world.payload = payload.into_bytes();
}

#[given("a project at version \"{version}\" without a payload source")]
fn given_project_without_source(world: &mut ReleaseWorld, version: String) {
    write_descriptor(world, &format!(r#"{{"version": "{version}"}}"#));
}

#[given("a project whose descriptor has no version")]
fn given_no_version(world: &mut ReleaseWorld) {
    write_descriptor(world, r#"{"name": "erasmus"}"#);
    fs::write(root(world).join("erasmus.py"), "print('hi')").expect("write payload source");
}

// ---------------------------------------------------------------------------
// When
// ---------------------------------------------------------------------------

#[when("the release is built")]
fn when_built(world: &mut ReleaseWorld) {
    let outcome = build(world);
    world.outcome = Some(outcome);
}

#[when("the release is built twice")]
fn when_built_twice(world: &mut ReleaseWorld) {
    let first = build(world).expect("first build");
    world.first_build = Some(installer_bytes(&first));
    let outcome = build(world);
    world.outcome = Some(outcome);
}

// ---------------------------------------------------------------------------
// Then
// ---------------------------------------------------------------------------

#[then("the digest file lists the payload digest for \"{name}\"")]
fn then_digest_file(world: &mut ReleaseWorld, name: String) {
    let artifacts = artifacts(world);
    let contents = fs::read_to_string(&artifacts.digest_file).expect("read digest file");
    let digest = Sha256Digest::of(&world.payload);
    assert_eq!(contents, format!("{digest}  {name}\n"));
    assert_eq!(artifacts.digest, digest);
}

#[then("the shell installer extracts to the payload")]
fn then_shell_extracts(world: &mut ReleaseWorld) {
    assert_extracts_payload(world, &artifacts(world).shell_installer);
}

#[then("the batch installer extracts to the payload")]
fn then_batch_extracts(world: &mut ReleaseWorld) {
    assert_extracts_payload(world, &artifacts(world).batch_installer);
}

#[then("the build fails mentioning \"{snippet}\"")]
fn then_build_fails(world: &mut ReleaseWorld, snippet: String) {
    let message = failure(world).to_string();
    assert!(
        message.contains(&snippet),
        "expected error '{message}' to mention '{snippet}'"
    );
}

#[then("no release directory exists")]
fn then_no_release_dir(world: &mut ReleaseWorld) {
    assert!(!root(world).join("release").exists());
}

#[then("no shell installer exists for version \"{version}\"")]
fn then_no_shell_installer(world: &mut ReleaseWorld, version: String) {
    let installer = root(world)
        .join("release")
        .join(format!("v{version}"))
        .join(format!("erasmus_v{version}.sh"));
    assert!(!installer.exists(), "{installer} should not exist");
}

#[then("both builds produce identical installers")]
fn then_identical(world: &mut ReleaseWorld) {
    let first = world.first_build.as_ref().expect("first build recorded");
    let second = installer_bytes(artifacts(world));
    assert_eq!(first.0, second.0, "shell installers differ");
    assert_eq!(first.1, second.1, "batch installers differ");
}

#[then("every batch installer line ends with CRLF")]
fn then_crlf(world: &mut ReleaseWorld) {
    let text = fs::read_to_string(&artifacts(world).batch_installer).expect("read batch");
    let bare_lf = text
        .match_indices('\n')
        .filter(|(index, _)| !text[..*index].ends_with('\r'))
        .count();
    assert_eq!(bare_lf, 0, "batch installer contains bare LF line endings");
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/release_build.feature",
    name = "A small payload is released for version 1.2.3"
)]
fn scenario_small_payload(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_build.feature",
    name = "A descriptor without a version aborts the build"
)]
fn scenario_missing_version(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_build.feature",
    name = "A missing payload source aborts before any installer is written"
)]
fn scenario_missing_source(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_build.feature",
    name = "Rebuilding an unchanged release is byte-identical"
)]
fn scenario_idempotent(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_build.feature",
    name = "The batch installer uses Windows line endings"
)]
fn scenario_crlf(world: ReleaseWorld) {
    let _ = world;
}
