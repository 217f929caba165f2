//! Integration tests for the kiln binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn kiln(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kiln").unwrap();
    cmd.env("HOME", home)
        .env_remove("KILN_LOG")
        .env_remove("KILN_TARGET")
        .env_remove("KILN_TOOLCHAIN")
        .env_remove("KILN_JSON");
    cmd
}

fn write_manifest(dir: &Path, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("kiln.toml"), content).unwrap();
}

// ============================================================================
// Help and platforms
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    kiln(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("targets"))
        .stdout(predicate::str::contains("platform"));
}

#[test]
fn test_targets_marks_default() {
    let home = TempDir::new().unwrap();
    kiln(home.path())
        .current_dir(home.path())
        .arg("targets")
        .assert()
        .success()
        .stdout(predicate::str::contains("(default)"));
}

#[test]
fn test_targets_json() {
    let home = TempDir::new().unwrap();
    let output = kiln(home.path())
        .current_dir(home.path())
        .args(["targets", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let host = report["host"].as_str().unwrap();
    assert_eq!(report["targets"][0].as_str(), Some(host));
}

#[test]
fn test_platform_by_alias() {
    let home = TempDir::new().unwrap();
    kiln(home.path())
        .args(["platform", "pnacl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pnacl-nacl-newlib"))
        .stdout(predicate::str::contains("SDK: $NACL_SDK_ROOT"));
}

#[test]
fn test_invalid_platform() {
    let home = TempDir::new().unwrap();
    kiln(home.path())
        .args(["platform", "vax-vms"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Fatal error: "))
        .stderr(predicate::str::contains("vax-vms"));
}

// ============================================================================
// Setup
// ============================================================================

#[test]
fn test_setup_requires_manifest() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    kiln(home.path())
        .current_dir(project.path())
        .arg("setup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Fatal error: "));
}

#[test]
fn test_setup_links_override_then_reuses() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let checkout = TempDir::new().unwrap();
    write_manifest(project.path(), "name = \"app\"\nlicense = \"MIT\"\n\n[[deps]]\nname = \"fp16\"\n");
    write_manifest(checkout.path(), "name = \"fp16\"\nlicense = \"MIT\"\n");
    let with = format!("--with-fp16={}", checkout.path().display());

    kiln(home.path())
        .current_dir(project.path())
        .args(["setup", &with])
        .assert()
        .success()
        .stderr(predicate::str::contains("Link dependency fp16 from"));
    let link = project.path().join("deps/fp16");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert!(link.join("kiln.toml").exists());

    kiln(home.path())
        .current_dir(project.path())
        .arg("setup")
        .assert()
        .success()
        .stderr(predicate::str::contains("Reuse dependency fp16"));
}

#[test]
fn test_setup_from_subdirectory() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), "name = \"app\"\nlicense = \"MIT\"\n\n[[deps]]\nname = \"fp16\"\n");
    fs::create_dir_all(project.path().join("deps/fp16")).unwrap();
    fs::create_dir_all(project.path().join("src")).unwrap();

    kiln(home.path())
        .current_dir(project.path().join("src"))
        .arg("setup")
        .assert()
        .success()
        .stderr(predicate::str::contains("Reuse dependency fp16"));
}

#[test]
fn test_setup_without_source() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), "name = \"app\"\nlicense = \"MIT\"\n\n[[deps]]\nname = \"fp16\"\n");

    kiln(home.path())
        .current_dir(project.path())
        .arg("setup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: no source provided for dependency fp16"));
}

#[test]
fn test_setup_rejects_malformed_override() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    write_manifest(project.path(), "name = \"app\"\nlicense = \"MIT\"\n");

    kiln(home.path())
        .current_dir(project.path())
        .args(["setup", "--with-fp16"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing path for --with-fp16"));
}
