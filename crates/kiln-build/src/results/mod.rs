//! Build artifact graph
//!
//! Nodes of the graph are compilations (one source file to one object file)
//! and collections (objects and libraries linked or archived into one
//! artifact). Generation writes each node's build edge at most once and
//! always returns the same output path, so a node may be shared by any
//! number of consumers.

mod collection;
mod compilation;

pub use collection::CollectionResult;
pub use compilation::CompilationResult;

use crate::error::{BuildError, BuildResult};
use crate::ninja::NinjaWriter;
use kiln_package::Validator;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

/// Build file every edge has an order-only dependency on
pub const BUILD_NINJA: &str = "build.ninja";

/// Output subdirectory of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subdir {
    /// Executables
    Bin,
    /// Static and shared libraries
    Lib,
    /// Plugins and other loadable outputs
    Out,
    /// Intermediate artifacts
    Build,
}

impl Subdir {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subdir::Bin => "bin",
            Subdir::Lib => "lib",
            Subdir::Out => "out",
            Subdir::Build => "build",
        }
    }
}

impl fmt::Display for Subdir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subdir {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bin" => Ok(Subdir::Bin),
            "lib" => Ok(Subdir::Lib),
            "out" => Ok(Subdir::Out),
            "build" => Ok(Subdir::Build),
            other => Err(BuildError::InvalidArgument(format!(
                "unsupported subdir {}: 'bin', 'lib', 'out', or 'build' expected",
                other
            ))),
        }
    }
}

/// Input of a collection
#[derive(Debug, Clone)]
pub enum BuildNode {
    Compilation(Rc<CompilationResult>),
    Collection(Rc<CollectionResult>),
}

impl BuildNode {
    /// Generate the node (once) and return its output path
    pub fn generate(&self, ninja: &mut NinjaWriter, root: &Path) -> PathBuf {
        match self {
            BuildNode::Compilation(object) => object.generate(ninja, root),
            BuildNode::Collection(collection) => collection.generate(ninja, root),
        }
    }

    pub fn is_generated(&self) -> bool {
        match self {
            BuildNode::Compilation(object) => object.is_generated(),
            BuildNode::Collection(collection) => collection.is_generated(),
        }
    }
}

impl From<Rc<CompilationResult>> for BuildNode {
    fn from(object: Rc<CompilationResult>) -> Self {
        BuildNode::Compilation(object)
    }
}

impl From<Rc<CollectionResult>> for BuildNode {
    fn from(collection: Rc<CollectionResult>) -> Self {
        BuildNode::Collection(collection)
    }
}

/// Library linked into a collection
#[derive(Debug, Clone)]
pub enum LinkLibrary {
    /// System library passed to the linker as `-l<name>`
    System(String),
    /// Library built in this configuration run
    Artifact(Rc<CollectionResult>),
}

impl LinkLibrary {
    /// System library with a validated name
    pub fn system(name: impl Into<String>) -> BuildResult<Self> {
        let name = name.into();
        Validator::validate_system_library(&name)?;
        Ok(LinkLibrary::System(name))
    }
}

impl From<Rc<CollectionResult>> for LinkLibrary {
    fn from(library: Rc<CollectionResult>) -> Self {
        LinkLibrary::Artifact(library)
    }
}

/// Path of `path` relative to `root`
///
/// Paths outside the root keep their components below the filesystem root.
pub(crate) fn relative_to(path: &Path, root: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdir_parse() {
        assert_eq!("out".parse::<Subdir>().unwrap(), Subdir::Out);
        let err = "share".parse::<Subdir>().unwrap_err();
        assert!(err.to_string().contains("'bin', 'lib', 'out', or 'build' expected"));
    }

    #[test]
    fn test_system_library_validation() {
        assert!(matches!(LinkLibrary::system("m"), Ok(LinkLibrary::System(ref n)) if n == "m"));
        assert!(LinkLibrary::system("m; rm -rf").is_err());
    }

    #[test]
    fn test_relative_to() {
        let root = Path::new("/work/proj");
        assert_eq!(relative_to(Path::new("/work/proj/src/a.c"), root), PathBuf::from("src/a.c"));
        assert_eq!(relative_to(Path::new("/opt/x/b.c"), root), PathBuf::from("opt/x/b.c"));
    }
}
