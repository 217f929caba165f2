//! Compilation state
//!
//! The state is what artifact declarations read: where sources live, which
//! include directories and macros apply, which dependencies and system
//! libraries are linked, and which instruction sets are enabled. [`Options`]
//! describes a temporary change to it, applied by `Build::options`.

use crate::error::{BuildError, BuildResult};
use crate::isa::InstructionSets;
use crate::module::ModuleHandle;
use crate::results::LinkLibrary;
use crate::validate::{validate_include_dir, validate_source_dir};
use kiln_package::Validator;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Preprocessor macros; `None` is a flag without a value (`-DNAME`)
pub type Macros = BTreeMap<String, Option<String>>;

/// Render one macro definition as a compiler flag
pub fn format_macro(name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("-D{}={}", name, value),
        None => format!("-D{}", name),
    }
}

/// Dependency of the code being compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepRef {
    /// Module of a configured dependency: include directories and libraries
    Module(ModuleHandle),
    /// System library linked by name
    System(String),
}

impl DepRef {
    /// System library with a validated name
    pub fn system(name: impl Into<String>) -> BuildResult<Self> {
        let name = name.into();
        Validator::validate_system_library(&name)?;
        Ok(DepRef::System(name))
    }

    /// Exported include directories
    pub fn cpath(&self) -> &[PathBuf] {
        match self {
            DepRef::Module(module) => &module.cpath,
            DepRef::System(_) => &[],
        }
    }

    /// Libraries to link for this dependency
    pub fn libraries(&self) -> Vec<LinkLibrary> {
        match self {
            DepRef::Module(module) => module
                .libraries
                .iter()
                .cloned()
                .map(LinkLibrary::Artifact)
                .collect(),
            DepRef::System(name) => vec![LinkLibrary::System(name.clone())],
        }
    }
}

impl From<ModuleHandle> for DepRef {
    fn from(module: ModuleHandle) -> Self {
        DepRef::Module(module)
    }
}

/// Mutable compilation state of a build
#[derive(Debug, Clone)]
pub struct State {
    root_dir: PathBuf,
    pub(crate) source_dir: PathBuf,
    pub(crate) include_dirs: Vec<PathBuf>,
    pub(crate) macros: Macros,
    pub(crate) deps: Vec<DepRef>,
    pub(crate) libs: Vec<String>,
    pub(crate) isa: InstructionSets,
}

impl State {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        Self {
            source_dir: root_dir.clone(),
            root_dir,
            include_dirs: Vec::new(),
            macros: Macros::new(),
            deps: Vec::new(),
            libs: Vec::new(),
            isa: InstructionSets::new(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Set the source directory; it must exist inside the root directory
    pub fn set_source_dir(&mut self, source_dir: impl AsRef<Path>) -> BuildResult<()> {
        self.source_dir = validate_source_dir(source_dir.as_ref(), &self.root_dir)?;
        Ok(())
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    /// Replace the include directories; each must exist
    pub fn set_include_dirs<I, P>(&mut self, include_dirs: I) -> BuildResult<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.include_dirs = include_dirs
            .into_iter()
            .map(|dir| validate_include_dir(dir.as_ref(), &self.root_dir))
            .collect::<BuildResult<_>>()?;
        Ok(())
    }

    pub fn add_include_dir(&mut self, include_dir: impl AsRef<Path>) -> BuildResult<()> {
        let include_dir = validate_include_dir(include_dir.as_ref(), &self.root_dir)?;
        self.include_dirs.push(include_dir);
        Ok(())
    }

    pub fn macros(&self) -> &Macros {
        &self.macros
    }

    /// Define a macro with the value `1`
    pub fn add_macro(&mut self, name: &str) -> BuildResult<()> {
        self.add_macro_value(name, Some("1"))
    }

    /// Define a macro; `None` defines it without a value
    pub fn add_macro_value(&mut self, name: &str, value: Option<&str>) -> BuildResult<()> {
        Validator::validate_macro_name(name)?;
        if self.macros.contains_key(name) {
            return Err(BuildError::MacroRedefined(name.to_string()));
        }
        self.macros
            .insert(name.to_string(), value.map(str::to_string));
        Ok(())
    }

    pub fn remove_macro(&mut self, name: &str) -> BuildResult<()> {
        self.macros
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BuildError::MacroUndefined(name.to_string()))
    }

    pub fn clear_macros(&mut self) {
        self.macros.clear();
    }

    /// Macro flags in name order
    pub fn macro_flags(&self) -> Vec<String> {
        self.macros
            .iter()
            .map(|(name, value)| format_macro(name, value.as_deref()))
            .collect()
    }

    pub fn deps(&self) -> &[DepRef] {
        &self.deps
    }

    pub fn add_dep(&mut self, dep: impl Into<DepRef>) {
        self.deps.push(dep.into());
    }

    pub fn libs(&self) -> &[String] {
        &self.libs
    }

    /// Link a system library into executables and plugins
    pub fn add_lib(&mut self, name: &str) -> BuildResult<()> {
        Validator::validate_system_library(name)?;
        self.libs.push(name.to_string());
        Ok(())
    }

    pub fn isa(&self) -> &InstructionSets {
        &self.isa
    }

    pub fn set_isa(&mut self, isa: impl Into<InstructionSets>) {
        self.isa = isa.into();
    }

    /// Include directories of the state followed by those exported by its
    /// dependencies
    pub fn all_include_dirs(&self) -> Vec<PathBuf> {
        self.include_dirs
            .iter()
            .chain(self.deps.iter().flat_map(DepRef::cpath))
            .cloned()
            .collect()
    }

    /// Libraries exported by the dependencies
    pub fn deps_libraries(&self) -> Vec<LinkLibrary> {
        self.deps.iter().flat_map(DepRef::libraries).collect()
    }

    /// System libraries followed by dependency libraries
    pub fn link_libraries(&self) -> Vec<LinkLibrary> {
        self.libs
            .iter()
            .map(|lib| LinkLibrary::System(lib.clone()))
            .chain(self.deps_libraries())
            .collect()
    }
}

/// Temporary changes to the compilation state
///
/// Each attribute may be replaced or extended, not both.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub(crate) source_dir: Option<PathBuf>,
    pub(crate) include_dirs: Option<Vec<PathBuf>>,
    pub(crate) extra_include_dirs: Option<Vec<PathBuf>>,
    pub(crate) macros: Option<Macros>,
    pub(crate) extra_macros: Option<Macros>,
    pub(crate) deps: Option<Vec<DepRef>>,
    pub(crate) extra_deps: Option<Vec<DepRef>>,
    pub(crate) libs: Option<Vec<String>>,
    pub(crate) extra_libs: Option<Vec<String>>,
    pub(crate) isa: Option<InstructionSets>,
}

fn paths<I, P>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    paths.into_iter().map(Into::into).collect()
}

fn flags<I, S>(names: I) -> impl Iterator<Item = (String, Option<String>)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(|name| (name.into(), None))
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_dir(mut self, source_dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(source_dir.into());
        self
    }

    pub fn include_dirs<I, P>(mut self, include_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_dirs = Some(paths(include_dirs));
        self
    }

    pub fn extra_include_dirs<I, P>(mut self, include_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.extra_include_dirs = Some(paths(include_dirs));
        self
    }

    /// Replace the macros with valueless flags
    pub fn macros<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.macros.get_or_insert_with(Macros::new).extend(flags(names));
        self
    }

    /// Replace the macros, including one with an explicit value
    pub fn macro_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.macros
            .get_or_insert_with(Macros::new)
            .insert(name.into(), Some(value.into()));
        self
    }

    /// Add valueless flags to the current macros
    pub fn extra_macros<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_macros
            .get_or_insert_with(Macros::new)
            .extend(flags(names));
        self
    }

    /// Add a macro with an explicit value to the current macros
    pub fn extra_macro_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_macros
            .get_or_insert_with(Macros::new)
            .insert(name.into(), Some(value.into()));
        self
    }

    pub fn deps<I, D>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DepRef>,
    {
        self.deps = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn extra_deps<I, D>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DepRef>,
    {
        self.extra_deps = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn libs<I, S>(mut self, libs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libs = Some(libs.into_iter().map(Into::into).collect());
        self
    }

    pub fn extra_libs<I, S>(mut self, libs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_libs = Some(libs.into_iter().map(Into::into).collect());
        self
    }

    pub fn isa(mut self, isa: impl Into<InstructionSets>) -> Self {
        self.isa = Some(isa.into());
        self
    }

    /// Reject attributes that are both replaced and extended
    fn check_conflicts(&self) -> BuildResult<()> {
        let pairs = [
            (self.include_dirs.is_some() && self.extra_include_dirs.is_some(), "include_dirs", "extra_include_dirs"),
            (self.macros.is_some() && self.extra_macros.is_some(), "macros", "extra_macros"),
            (self.deps.is_some() && self.extra_deps.is_some(), "deps", "extra_deps"),
            (self.libs.is_some() && self.extra_libs.is_some(), "libs", "extra_libs"),
        ];
        match pairs.into_iter().find(|(conflict, _, _)| *conflict) {
            Some((_, replace, extend)) => Err(BuildError::ConflictingOptions { replace, extend }),
            None => Ok(()),
        }
    }
}

/// Attributes saved before applying [`Options`], restored afterwards
#[derive(Debug, Default)]
pub(crate) struct SavedState {
    source_dir: Option<PathBuf>,
    include_dirs: Option<Vec<PathBuf>>,
    macros: Option<Macros>,
    deps: Option<Vec<DepRef>>,
    libs: Option<Vec<String>>,
    isa: Option<InstructionSets>,
}

impl State {
    /// Validate `options` completely, then apply them
    ///
    /// Nothing is changed when validation fails. The returned value restores
    /// the touched attributes through [`State::restore`].
    pub(crate) fn apply(&mut self, options: Options) -> BuildResult<SavedState> {
        options.check_conflicts()?;

        let source_dir = options
            .source_dir
            .as_deref()
            .map(|dir| validate_source_dir(dir, &self.root_dir))
            .transpose()?;
        let validate_dirs = |dirs: &[PathBuf]| -> BuildResult<Vec<PathBuf>> {
            dirs.iter()
                .map(|dir| validate_include_dir(dir, &self.root_dir))
                .collect()
        };
        let include_dirs = options.include_dirs.as_deref().map(validate_dirs).transpose()?;
        let extra_include_dirs = options
            .extra_include_dirs
            .as_deref()
            .map(validate_dirs)
            .transpose()?;

        for name in options
            .macros
            .iter()
            .chain(options.extra_macros.iter())
            .flat_map(|macros| macros.keys())
        {
            Validator::validate_macro_name(name)?;
        }
        if let Some(extra) = &options.extra_macros {
            if let Some(name) = extra.keys().find(|name| self.macros.contains_key(*name)) {
                return Err(BuildError::MacroRedefined(name.clone()));
            }
        }
        for lib in options
            .libs
            .iter()
            .chain(options.extra_libs.iter())
            .flatten()
        {
            Validator::validate_system_library(lib)?;
        }

        let mut saved = SavedState::default();
        if let Some(source_dir) = source_dir {
            saved.source_dir = Some(std::mem::replace(&mut self.source_dir, source_dir));
        }
        if let Some(include_dirs) = include_dirs {
            saved.include_dirs = Some(std::mem::replace(&mut self.include_dirs, include_dirs));
        } else if let Some(extra) = extra_include_dirs {
            saved.include_dirs = Some(self.include_dirs.clone());
            self.include_dirs.extend(extra);
        }
        if let Some(macros) = options.macros {
            saved.macros = Some(std::mem::replace(&mut self.macros, macros));
        } else if let Some(extra) = options.extra_macros {
            saved.macros = Some(self.macros.clone());
            self.macros.extend(extra);
        }
        if let Some(deps) = options.deps {
            saved.deps = Some(std::mem::replace(&mut self.deps, deps));
        } else if let Some(extra) = options.extra_deps {
            saved.deps = Some(self.deps.clone());
            self.deps.extend(extra);
        }
        if let Some(libs) = options.libs {
            saved.libs = Some(std::mem::replace(&mut self.libs, libs));
        } else if let Some(extra) = options.extra_libs {
            saved.libs = Some(self.libs.clone());
            self.libs.extend(extra);
        }
        if let Some(isa) = options.isa {
            saved.isa = Some(std::mem::replace(&mut self.isa, isa));
        }
        Ok(saved)
    }

    /// Put back the attributes saved by [`State::apply`]
    pub(crate) fn restore(&mut self, saved: SavedState) {
        if let Some(source_dir) = saved.source_dir {
            self.source_dir = source_dir;
        }
        if let Some(include_dirs) = saved.include_dirs {
            self.include_dirs = include_dirs;
        }
        if let Some(macros) = saved.macros {
            self.macros = macros;
        }
        if let Some(deps) = saved.deps {
            self.deps = deps;
        }
        if let Some(libs) = saved.libs {
            self.libs = libs;
        }
        if let Some(isa) = saved.isa {
            self.isa = isa;
        }
    }
}
