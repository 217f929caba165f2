//! Path validation
//!
//! Paths are normalized lexically (`.` and `..` components are folded
//! without touching the filesystem) before they are checked against the
//! directory they must stay inside.

use crate::error::{BuildError, BuildResult};
use std::path::{Component, Path, PathBuf};

/// Fold `.` and `..` components without resolving symbolic links
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(normalized.components().next_back(), Some(Component::Normal(_)))
                    && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn anchored(path: &Path, base: &Path) -> PathBuf {
    normalize(&base.join(path))
}

/// Include directory: relative paths are taken from the root; must exist
pub fn validate_include_dir(include_dir: &Path, root_dir: &Path) -> BuildResult<PathBuf> {
    let include_dir = anchored(include_dir, root_dir);
    if !include_dir.is_dir() {
        return Err(BuildError::invalid_path(include_dir, "include directory does not exist"));
    }
    Ok(include_dir)
}

/// Source directory: must be inside the root and exist
pub fn validate_source_dir(source_dir: &Path, root_dir: &Path) -> BuildResult<PathBuf> {
    let source_dir = anchored(source_dir, root_dir);
    if !source_dir.starts_with(normalize(root_dir)) {
        return Err(BuildError::invalid_path(
            source_dir,
            format!("source directory is outside of root directory {}", root_dir.display()),
        ));
    }
    if !source_dir.is_dir() {
        return Err(BuildError::invalid_path(source_dir, "source directory does not exist"));
    }
    Ok(source_dir)
}

/// Source file: must be inside the source directory and exist
pub fn validate_source_path(source_path: &Path, source_dir: &Path) -> BuildResult<PathBuf> {
    let source_path = anchored(source_path, source_dir);
    if !source_path.starts_with(normalize(source_dir)) {
        return Err(BuildError::invalid_path(
            source_path,
            format!("source path is outside of source directory {}", source_dir.display()),
        ));
    }
    if !source_path.is_file() {
        return Err(BuildError::invalid_path(source_path, "source file does not exist"));
    }
    Ok(source_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_include_dir() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("include")).unwrap();

        let dir = validate_include_dir(Path::new("include"), temp.path()).unwrap();
        assert_eq!(dir, temp.path().join("include"));
        assert!(validate_include_dir(Path::new("missing"), temp.path()).is_err());
    }

    #[test]
    fn test_source_dir_must_stay_inside_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(temp.path().join("outside")).unwrap();

        assert_eq!(validate_source_dir(Path::new("src"), &root).unwrap(), root.join("src"));
        let err = validate_source_dir(Path::new("../outside"), &root).unwrap_err();
        assert!(err.to_string().contains("outside of root directory"));
    }

    #[test]
    fn test_source_path() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.c"), "int a;\n").unwrap();

        assert_eq!(validate_source_path(Path::new("a.c"), &src).unwrap(), src.join("a.c"));
        assert!(validate_source_path(Path::new("b.c"), &src).is_err());
        assert!(validate_source_path(Path::new("../src/../a.c"), &src).is_err());
        assert!(validate_source_path(&src, &src).is_err());
    }
}
