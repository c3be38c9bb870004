//! End-to-end tests for the release pipeline.
//!
//! Each test drives the real `runway` binary inside a scratch git
//! repository wired to a local bare "origin", with uploads going to a
//! mock index server. No external network is involved.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

struct Scratch {
    /// Keeps the temp dir alive for the test's duration.
    _dir: tempfile::TempDir,
    root: PathBuf,
    remote: PathBuf,
    credentials: PathBuf,
}

fn git(root: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(root)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// A repository with VERSION 1.0.0, a README marker, a build command
/// producing a fake wheel, and a bare origin to push to.
fn scratch(server_url: &str) -> Scratch {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("repo");
    let remote = dir.path().join("origin.git");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::create_dir_all(&remote).unwrap();

    git(&remote, &["init", "--bare", "--initial-branch=main"]);

    git(&root, &["init", "--initial-branch=main"]);
    git(&root, &["config", "user.email", "test@example.org"]);
    git(&root, &["config", "user.name", "Test"]);
    git(&root, &["remote", "add", "origin", remote.to_str().unwrap()]);

    std::fs::write(root.join("VERSION"), "1.0.0\n").unwrap();
    std::fs::write(root.join("README.md"), "install demo-1.0.0 today\n").unwrap();
    std::fs::write(root.join(".gitignore"), "dist/\n").unwrap();
    std::fs::write(
        root.join("runway.toml"),
        r#"[package]
name = "demo"

[version]
file = "VERSION"

[[version.marker]]
file = "README.md"
pattern = 'demo-([0-9]+\.[0-9]+\.[0-9]+)'

[build]
command = "mkdir -p dist && printf wheel > dist/demo-$(cat VERSION).whl"
artifacts = ["dist/*.whl"]
"#,
    )
    .unwrap();
    git(&root, &["add", "."]);
    git(&root, &["commit", "-m", "initial"]);

    let credentials = dir.path().join("credentials.toml");
    std::fs::write(
        &credentials,
        format!(
            r#"index-servers = ["test", "production"]

[index.test]
repository = "{server_url}/upload/"
username = "alice"
token = "s3cret"

[index.production]
repository = "{server_url}/prod-upload/"
username = "alice"
token = "s3cret"
"#
        ),
    )
    .unwrap();

    Scratch {
        _dir: dir,
        root,
        remote,
        credentials,
    }
}

fn runway(scratch: &Scratch, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_runway"))
        .args(args)
        .current_dir(&scratch.root)
        .env("RUNWAY_CREDENTIALS", &scratch.credentials)
        .output()
        .unwrap()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn remote_has_tag(scratch: &Scratch, tag: &str) -> bool {
    let output = Command::new("git")
        .args(["tag", "-l", tag])
        .current_dir(&scratch.remote)
        .output()
        .unwrap();
    !output.stdout.is_empty()
}

#[test]
fn init_creates_manifest_version_and_credentials_skeleton() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("repo");
    std::fs::create_dir_all(&root).unwrap();
    git(&root, &["init", "--initial-branch=main"]);
    let credentials = dir.path().join("config/credentials.toml");

    let output = Command::new(env!("CARGO_BIN_EXE_runway"))
        .arg("init")
        .current_dir(&root)
        .env("RUNWAY_CREDENTIALS", &credentials)
        .output()
        .unwrap();
    assert_success(&output);

    assert!(root.join("runway.toml").is_file());
    assert_eq!(
        std::fs::read_to_string(root.join("VERSION")).unwrap(),
        "0.1.0\n"
    );
    assert!(credentials.is_file());

    // The generated manifest parses and points at the created VERSION.
    let output = Command::new(env!("CARGO_BIN_EXE_runway"))
        .args(["version", "show"])
        .current_dir(&root)
        .env("RUNWAY_CREDENTIALS", &credentials)
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0.1.0");
}

#[test]
fn version_show_prints_the_recorded_version() {
    let server = mockito::Server::new();
    let scratch = scratch(&server.url());

    let output = runway(&scratch, &["version", "show"]);
    assert_success(&output);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "1.0.0");
}

#[test]
fn version_bump_rewrites_file_and_markers() {
    let server = mockito::Server::new();
    let scratch = scratch(&server.url());

    let output = runway(&scratch, &["version", "bump", "minor"]);
    assert_success(&output);

    let version = std::fs::read_to_string(scratch.root.join("VERSION")).unwrap();
    assert_eq!(version, "1.1.0\n");
    let readme = std::fs::read_to_string(scratch.root.join("README.md")).unwrap();
    assert_eq!(readme, "install demo-1.1.0 today\n");
}

#[test]
fn release_runs_the_whole_checklist() {
    let mut server = mockito::Server::new();
    let scratch = scratch(&server.url());

    // sdist + wheel
    let uploads = server
        .mock("POST", "/upload/")
        .with_status(200)
        .expect(2)
        .create();
    let verify = server
        .mock("GET", "/upload/demo/1.1.0/")
        .with_status(200)
        .expect(1)
        .create();

    let output = runway(&scratch, &["release", "--bump", "minor", "--yes"]);
    assert_success(&output);

    uploads.assert();
    verify.assert();

    // Version committed, marker rewritten, tag created and pushed.
    let version = std::fs::read_to_string(scratch.root.join("VERSION")).unwrap();
    assert_eq!(version, "1.1.0\n");
    assert!(remote_has_tag(&scratch, "v1.1.0"));

    // Artifacts and checksum sidecars exist.
    assert!(scratch.root.join("dist/demo-1.1.0.tar.gz").is_file());
    assert!(scratch.root.join("dist/demo-1.1.0.whl").is_file());
    assert!(scratch.root.join("dist/demo-1.1.0.tar.gz.sha256").is_file());
}

#[test]
fn release_refuses_a_dirty_worktree() {
    let server = mockito::Server::new();
    let scratch = scratch(&server.url());
    std::fs::write(scratch.root.join("scratch.txt"), "wip\n").unwrap();

    let output = runway(&scratch, &["release", "--bump", "patch", "--yes"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("uncommitted"), "stderr: {stderr}");
}

#[test]
fn release_refuses_an_existing_tag() {
    let server = mockito::Server::new();
    let scratch = scratch(&server.url());
    git(&scratch.root, &["tag", "-a", "v1.0.0", "-m", "already there"]);

    // Keep the recorded version, so the target tag is the existing one.
    let output = runway(&scratch, &["release", "--yes"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("v1.0.0"), "stderr: {stderr}");
}

#[test]
fn dry_run_changes_nothing() {
    let server = mockito::Server::new();
    let scratch = scratch(&server.url());

    let output = runway(&scratch, &["release", "--set", "2.0.0", "--dry-run"]);
    assert_success(&output);

    let version = std::fs::read_to_string(scratch.root.join("VERSION")).unwrap();
    assert_eq!(version, "1.0.0\n");
    assert!(!remote_has_tag(&scratch, "v2.0.0"));
    assert!(!scratch.root.join("dist").exists());
}

#[test]
fn publish_requires_a_prior_build() {
    let server = mockito::Server::new();
    let scratch = scratch(&server.url());

    let output = runway(&scratch, &["publish"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("runway build"), "stderr: {stderr}");
}

#[test]
fn build_then_publish_to_a_named_index() {
    let mut server = mockito::Server::new();
    let scratch = scratch(&server.url());

    let output = runway(&scratch, &["build"]);
    assert_success(&output);
    assert!(scratch.root.join("dist/demo-1.0.0.tar.gz").is_file());

    let uploads = server
        .mock("POST", "/prod-upload/")
        .with_status(200)
        .expect(2)
        .create();
    let verify = server
        .mock("GET", "/prod-upload/demo/1.0.0/")
        .with_status(200)
        .expect(1)
        .create();

    let output = runway(&scratch, &["publish", "--index", "production"]);
    assert_success(&output);
    uploads.assert();
    verify.assert();
}

#[test]
fn status_reports_preflight_failures() {
    let server = mockito::Server::new();
    let scratch = scratch(&server.url());

    // Fully configured repository passes.
    let output = runway(&scratch, &["status"]);
    assert_success(&output);

    // A missing credentials file is a failed check.
    let output = Command::new(env!("CARGO_BIN_EXE_runway"))
        .arg("status")
        .current_dir(&scratch.root)
        .env("RUNWAY_CREDENTIALS", "/nonexistent/credentials.toml")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
