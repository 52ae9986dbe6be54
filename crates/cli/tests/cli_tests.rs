//! Integration tests for the pkgscope binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_project(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = tempfile::Builder::new()
        .prefix("pkgscope_cli_")
        .tempdir()
        .expect("Failed to create temp directory");
    for (name, content) in files {
        let path = temp_dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    temp_dir
}

fn pkgscope(root: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("pkgscope").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("PKGSCOPE_CWD")
        .env_remove("PKGSCOPE_LOG_FORMAT")
        .env_remove("PKGSCOPE_PROBE_TIMEOUT")
        .arg("--cwd")
        .arg(root);
    cmd
}

#[test]
fn test_detect_declared_manager() {
    let project = create_project(&[("package.json", r#"{"packageManager": "pnpm@7.1.0"}"#)]);

    pkgscope(project.path())
        .arg("detect")
        .assert()
        .success()
        .stdout("nodejs-pnpm (pnpm) 7.1.0\n");
}

#[test]
fn test_detect_json() {
    let project = create_project(&[("package.json", r#"{"packageManager": "yarn@3.2.0"}"#)]);

    let output = pkgscope(project.path())
        .args(["detect", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["slug"], "berry");
    assert_eq!(json["command"], "yarn");
    assert_eq!(json["version"], "3.2.0");
}

#[test]
fn test_detect_from_lockfile() {
    let project = create_project(&[
        ("package.json", r#"{"name": "root"}"#),
        ("yarn.lock", "# yarn lockfile v1\n\n"),
    ]);

    pkgscope(project.path())
        .arg("detect")
        .assert()
        .success()
        .stdout("nodejs-yarn (yarn)\n");
}

#[test]
fn test_workspaces_listing() {
    let project = create_project(&[
        ("package.json", r#"{"packageManager": "npm@9.8.1", "workspaces": ["packages/*"]}"#),
        ("packages/a/package.json", r#"{"name": "a"}"#),
        ("packages/b/package.json", r#"{"name": "b"}"#),
        ("packages/b/node_modules/dep/package.json", r#"{"name": "dep"}"#),
    ]);
    let root = project.path();

    pkgscope(root)
        .arg("workspaces")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            root.join("packages/a/package.json").display().to_string(),
        ))
        .stdout(predicate::str::contains(
            root.join("packages/b/package.json").display().to_string(),
        ))
        .stdout(predicate::str::contains("node_modules").not());
}

#[test]
fn test_workspaces_default_root_is_absolute() {
    let project = create_project(&[
        ("package.json", r#"{"packageManager": "npm@9.8.1", "workspaces": ["packages/*"]}"#),
        ("packages/a/package.json", r#"{"name": "a"}"#),
    ]);
    let root = project.path().canonicalize().unwrap();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("pkgscope").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("PKGSCOPE_CWD")
        .current_dir(project.path())
        .arg("workspaces")
        .assert()
        .success()
        .stdout(format!("{}\n", root.join("packages/a/package.json").display()));
}

#[test]
fn test_args_separator() {
    let project = create_project(&[("package.json", r#"{"packageManager": "npm@9.8.1"}"#)]);

    pkgscope(project.path())
        .arg("args")
        .assert()
        .success()
        .stdout("--\n");
}

#[test]
fn test_version_from_declaration() {
    let project = create_project(&[("package.json", r#"{"packageManager": "pnpm@8.15.4"}"#)]);

    pkgscope(project.path())
        .arg("version")
        .assert()
        .success()
        .stdout("8.15.4\n");
}

#[test]
fn test_undetectable_project_fails() {
    let project = create_project(&[("package.json", r#"{"name": "root"}"#)]);

    pkgscope(project.path())
        .arg("detect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not detect an in-use package manager"));
}

#[test]
fn test_malformed_declaration_fails() {
    let project = create_project(&[
        ("package.json", r#"{"packageManager": "pnpm@next"}"#),
        ("pnpm-lock.yaml", "lockfileVersion: '6.0'\n"),
    ]);

    pkgscope(project.path())
        .arg("detect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pnpm@next"));
}

#[test]
fn test_debug_logs_go_to_stderr() {
    let project = create_project(&[("package-lock.json", "{}")]);

    pkgscope(project.path())
        .args(["--log-level", "debug", "--log-format", "json", "detect"])
        .assert()
        .success()
        .stdout("nodejs-npm (npm)\n")
        .stderr(predicate::str::contains("Detected nodejs-npm"));
}
