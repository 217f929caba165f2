//! Modules
//!
//! A module groups the artifacts of a configuration run: exported include
//! directories, libraries, plugins, executables, tests and benchmarks. It is
//! the unit a dependent project imports. Every collection has a `default`
//! module; others are created on first use until the collection is sealed.

use crate::error::{BuildError, BuildResult};
use crate::ninja::{Edge, NinjaWriter};
use crate::results::CollectionResult;
use kiln_package::Validator;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;

/// Name of the module every collection starts with
pub const DEFAULT_MODULE: &str = "default";

/// Artifacts of one module
#[derive(Debug)]
pub struct Module {
    name: String,
    pub cpath: Vec<PathBuf>,
    pub libraries: Vec<Rc<CollectionResult>>,
    pub plugins: Vec<Rc<CollectionResult>>,
    pub executables: Vec<Rc<CollectionResult>>,
    pub unittests: Vec<Rc<CollectionResult>>,
    pub smoketests: Vec<Rc<CollectionResult>>,
    pub benchmarks: Vec<Rc<CollectionResult>>,
}

impl Module {
    /// Create an empty module; the name is validated and lowercased
    pub fn new(name: &str) -> BuildResult<Self> {
        Ok(Self {
            name: Validator::validate_module_name(name)?,
            cpath: Vec::new(),
            libraries: Vec::new(),
            plugins: Vec::new(),
            executables: Vec::new(),
            unittests: Vec::new(),
            smoketests: Vec::new(),
            benchmarks: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Library with the given logical name
    pub fn library(&self, name: &str) -> Option<&Rc<CollectionResult>> {
        self.libraries.iter().find(|library| library.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.cpath.is_empty()
            && self.libraries.is_empty()
            && self.plugins.is_empty()
            && self.executables.is_empty()
            && self.unittests.is_empty()
            && self.smoketests.is_empty()
            && self.benchmarks.is_empty()
    }

    /// Write the module's artifacts, their phony aliases and run targets;
    /// returns the targets built by default
    pub fn generate(&self, ninja: &mut NinjaWriter, root: &Path) -> Vec<PathBuf> {
        let mut defaults = Vec::new();

        for artifact in self.libraries.iter().chain(&self.plugins).chain(&self.executables) {
            let target = artifact.generate(ninja, root);
            ninja.build(&Edge::phony(artifact.name(), [target.to_string_lossy()]));
            defaults.push(target);
        }

        let runs = self
            .benchmarks
            .iter()
            .map(|bench| (bench, "--benchmark_color=true"))
            .chain(
                self.unittests
                    .iter()
                    .chain(&self.smoketests)
                    .map(|test| (test, "--gtest_color=yes")),
            );
        for (artifact, args) in runs {
            let target = artifact.generate(ninja, root);
            ninja.build(
                &Edge::new(artifact.name(), "run")
                    .with_input(target.to_string_lossy())
                    .with_variable("path", artifact.name())
                    .with_variable("args", args),
            );
            defaults.push(target);
        }

        info!("Module {}: {}", self.name, self.summary());
        defaults
    }

    /// Human-readable artifact counts, e.g. `2 libraries, 3 tests`
    pub fn summary(&self) -> String {
        let mut artifacts = Vec::new();
        if !self.libraries.is_empty() {
            artifacts.push(format!("{} libraries", self.libraries.len()));
        }
        if !self.plugins.is_empty() {
            artifacts.push(format!("{} plugins", self.plugins.len()));
        }
        if !self.executables.is_empty() {
            artifacts.push(format!("{} executables", self.executables.len()));
        }
        if !self.benchmarks.is_empty() {
            artifacts.push(format!("{} benchmarks", self.benchmarks.len()));
        }
        if !self.smoketests.is_empty() {
            artifacts.push(format!(
                "{} tests ({} smoke tests)",
                self.unittests.len() + self.smoketests.len(),
                self.smoketests.len()
            ));
        } else if !self.unittests.is_empty() {
            artifacts.push(format!("{} tests", self.unittests.len()));
        }

        if artifacts.is_empty() {
            "no artifacts".to_string()
        } else {
            artifacts.join(", ")
        }
    }
}

/// Modules of one configuration run, in creation order
#[derive(Debug)]
pub struct ModuleCollection {
    modules: Vec<Module>,
    active: usize,
    sealed: bool,
}

impl Default for ModuleCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleCollection {
    pub fn new() -> Self {
        let default = Module {
            name: DEFAULT_MODULE.to_string(),
            cpath: Vec::new(),
            libraries: Vec::new(),
            plugins: Vec::new(),
            executables: Vec::new(),
            unittests: Vec::new(),
            smoketests: Vec::new(),
            benchmarks: Vec::new(),
        };
        Self {
            modules: vec![default],
            active: 0,
            sealed: false,
        }
    }

    pub fn default_module(&self) -> &Module {
        &self.modules[0]
    }

    /// Module that artifact declarations attach to
    pub fn active(&self) -> &Module {
        &self.modules[self.active]
    }

    pub(crate) fn active_mut(&mut self) -> &mut Module {
        &mut self.modules[self.active]
    }

    pub(crate) fn active_index(&self) -> usize {
        self.active
    }

    pub(crate) fn set_active(&mut self, index: usize) {
        self.active = index;
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.modules.iter().position(|module| module.name == name)
    }

    /// Look up an existing module
    pub fn get(&self, name: &str) -> BuildResult<&Module> {
        let name = Validator::validate_module_name(name)?;
        self.index_of(&name)
            .map(|index| &self.modules[index])
            .ok_or(BuildError::ModuleNotFound { module: name })
    }

    /// Index of the named module, creating it if the collection is unsealed
    pub fn get_or_create(&mut self, name: &str) -> BuildResult<usize> {
        let name = Validator::validate_module_name(name)?;
        match (self.index_of(&name), self.sealed) {
            (Some(_), true) => Err(BuildError::SealedModule { module: name }),
            (None, true) => Err(BuildError::ModuleNotFound { module: name }),
            (Some(index), false) => Ok(index),
            (None, false) => {
                self.modules.push(Module::new(&name)?);
                Ok(self.modules.len() - 1)
            }
        }
    }

    /// Freeze the module structure
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Write every module, the default target list and the `bench`,
    /// `smoketest` and `test` aliases
    pub fn generate(&self, ninja: &mut NinjaWriter, root: &Path) {
        let defaults: Vec<PathBuf> = self
            .modules
            .iter()
            .flat_map(|module| module.generate(ninja, root))
            .collect();
        ninja.defaults(defaults.iter().map(|target| target.to_string_lossy()));

        let mut benchmarks = Vec::new();
        let mut smoketests = Vec::new();
        let mut tests = Vec::new();
        for module in &self.modules {
            benchmarks.extend(module.benchmarks.iter().map(|b| b.name().to_string()));
            let module_smoketests: Vec<String> =
                module.smoketests.iter().map(|t| t.name().to_string()).collect();
            smoketests.extend(module_smoketests.iter().cloned());
            tests.extend(module_smoketests);
            tests.extend(module.unittests.iter().map(|t| t.name().to_string()));
        }

        for (alias, targets) in [("bench", benchmarks), ("smoketest", smoketests), ("test", tests)] {
            if !targets.is_empty() {
                ninja.build(&Edge::phony(alias, targets));
            }
        }
    }
}

/// Shared reference to one module of a sealed collection
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    modules: Rc<ModuleCollection>,
    index: usize,
}

impl ModuleHandle {
    pub fn new(modules: Rc<ModuleCollection>, index: usize) -> Option<Self> {
        (index < modules.len()).then_some(Self { modules, index })
    }

    /// Handle to the default module
    pub fn default_of(modules: Rc<ModuleCollection>) -> Self {
        Self { modules, index: 0 }
    }

    pub fn collection(&self) -> &Rc<ModuleCollection> {
        &self.modules
    }
}

impl Deref for ModuleHandle {
    type Target = Module;

    fn deref(&self) -> &Module {
        &self.modules.modules[self.index]
    }
}

impl PartialEq for ModuleHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.modules, &other.modules) && self.index == other.index
    }
}

impl Eq for ModuleHandle {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Subdir;
    use pretty_assertions::assert_eq;

    fn artifact(subdir: Subdir, name: &str) -> Rc<CollectionResult> {
        Rc::new(CollectionResult::new(subdir, name, "executable"))
    }

    #[test]
    fn test_default_module_exists() {
        let modules = ModuleCollection::new();
        assert_eq!(modules.default_module().name(), "default");
        assert_eq!(modules.active().name(), "default");
        assert!(modules.get("default").is_ok());
    }

    #[test]
    fn test_unsealed_creates_on_first_access() {
        let mut modules = ModuleCollection::new();
        let index = modules.get_or_create("Core").unwrap();
        assert_eq!(index, 1);
        assert_eq!(modules.get_or_create("core").unwrap(), 1);
        assert_eq!(modules.get("CORE").unwrap().name(), "core");
        assert_eq!(modules.len(), 2);
    }

    #[test]
    fn test_sealed_rejects_new_modules() {
        let mut modules = ModuleCollection::new();
        modules.get_or_create("core").unwrap();
        modules.seal();

        let err = modules.get_or_create("extra").unwrap_err();
        assert!(matches!(err, BuildError::ModuleNotFound { ref module } if module == "extra"));
        assert!(matches!(
            modules.get_or_create("core"),
            Err(BuildError::SealedModule { .. })
        ));
        assert!(modules.get("core").is_ok());
        assert!(modules.get("extra").is_err());
    }

    #[test]
    fn test_invalid_module_names() {
        let mut modules = ModuleCollection::new();
        assert!(modules.get_or_create("_private").is_err());
        assert!(modules.get_or_create("9lives").is_err());
    }

    #[test]
    fn test_summary() {
        let mut module = Module::new("default").unwrap();
        assert_eq!(module.summary(), "no artifacts");
        module.libraries.push(artifact(Subdir::Lib, "a"));
        module.unittests.push(artifact(Subdir::Bin, "t1"));
        module.smoketests.push(artifact(Subdir::Bin, "t2"));
        assert_eq!(module.summary(), "1 libraries, 2 tests (1 smoke tests)");
    }

    #[test]
    fn test_generate_aliases() {
        let mut modules = ModuleCollection::new();
        modules.active_mut().executables.push(artifact(Subdir::Bin, "tool"));
        modules.active_mut().unittests.push(artifact(Subdir::Bin, "unit"));
        let index = modules.get_or_create("extra").unwrap();
        modules.set_active(index);
        modules.active_mut().smoketests.push(artifact(Subdir::Bin, "smoke"));
        modules.active_mut().benchmarks.push(artifact(Subdir::Bin, "speed"));

        let mut ninja = NinjaWriter::new();
        modules.generate(&mut ninja, Path::new("/p"));
        let text = ninja.finish();

        assert!(text.contains("build tool: phony /p/bin/tool\n"));
        assert!(text.contains("build unit: run /p/bin/unit\n  path = unit\n  args = --gtest_color=yes\n"));
        assert!(text.contains("build speed: run /p/bin/speed\n  path = speed\n  args = --benchmark_color=true\n"));
        assert!(text.contains("default /p/bin/tool /p/bin/unit /p/bin/speed /p/bin/smoke\n"));
        assert!(text.contains("build bench: phony speed\n"));
        assert!(text.contains("build smoketest: phony smoke\n"));
        assert!(text.contains("build test: phony unit smoke\n"));
    }

    #[test]
    fn test_handle_equality() {
        let modules = Rc::new(ModuleCollection::new());
        let a = ModuleHandle::default_of(modules.clone());
        let b = ModuleHandle::new(modules, 0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, ModuleHandle::default_of(Rc::new(ModuleCollection::new())));
        assert_eq!(a.name(), "default");
    }
}
