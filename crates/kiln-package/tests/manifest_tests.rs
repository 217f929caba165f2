//! Manifest loading tests

use kiln_package::{PackageError, Project, ValidationError, MANIFEST_FILE_NAME};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn project_dir(manifest: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(MANIFEST_FILE_NAME), manifest).unwrap();
    dir
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_from_root() {
    let dir = project_dir(
        r#"
name = "nnpack"
license = "BSD"

[[deps]]
name = "pthreadpool"
url = "https://github.com/Maratyszcza/pthreadpool.git"
"#,
    );

    let project = Project::from_root(dir.path()).unwrap();
    assert_eq!(project.name, "nnpack");
    assert_eq!(project.license, "BSD");
    assert_eq!(
        project.dependency("pthreadpool").and_then(|d| d.url.clone()),
        Some("https://github.com/Maratyszcza/pthreadpool.git".to_string())
    );
}

#[test]
fn test_from_root_missing_manifest() {
    let dir = TempDir::new().unwrap();
    let err = Project::from_root(dir.path()).unwrap_err();
    assert!(matches!(err, PackageError::IoError { .. }));
    assert!(err.to_string().contains(MANIFEST_FILE_NAME));
}

#[test]
fn test_load_optional_manifest() {
    let dir = TempDir::new().unwrap();
    assert_eq!(Project::load(dir.path()).unwrap(), None);

    let dir = project_dir("name = \"fxdiv\"\nlicense = \"MIT\"\n");
    assert_eq!(Project::load(dir.path()).unwrap().map(|p| p.name), Some("fxdiv".to_string()));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_malformed_manifest() {
    let dir = project_dir("name = \n");
    let err = Project::from_root(dir.path()).unwrap_err();
    assert!(matches!(err, PackageError::ParseError { .. }));
}

#[test]
fn test_invalid_dependency_name() {
    let dir = project_dir(
        r#"
name = "demo"
license = "MIT"

[[deps]]
name = "google-test"
"#,
    );
    let err = Project::from_root(dir.path()).unwrap_err();
    match err {
        PackageError::Invalid { error, .. } => {
            assert_eq!(error, ValidationError::InvalidPackageName("google-test".to_string()))
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Writing
// ============================================================================

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let project = Project {
        name: "googletest".to_string(),
        title: Some("Google Test framework".to_string()),
        license: "New BSD".to_string(),
        deps: Vec::new(),
    };
    project.save(dir.path()).unwrap();

    assert_eq!(Project::load(dir.path()).unwrap(), Some(project));
}

#[test]
fn test_save_into_missing_directory() {
    let dir = TempDir::new().unwrap();
    let err = Project::anonymous("demo")
        .save(&dir.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, PackageError::WriteError { .. }));
}
