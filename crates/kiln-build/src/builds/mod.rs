//! Build configuration
//!
//! A [`Build`] is what configuration code works with: it resolves the target
//! platform and toolchain, exposes the project's dependencies, tracks the
//! compilation state and the active module, records declared artifacts and
//! finally writes `build.ninja`.
//!
//! Three flavors share one implementation: plain Unix-like targets
//! (including Native Client and Android), Portable Native Client, whose
//! executables are linked to bitcode, finalized and translated, and
//! Emscripten, whose executables and plugins are JavaScript.

mod artifacts;
mod emscripten;
mod scope;

pub use emscripten::{EmscriptenPluginOptions, MemorySize};
pub use scope::{ModuleScope, OptionsScope};

use crate::context::Context;
use crate::deps::DependencyCollection;
use crate::error::{BuildError, BuildResult};
use crate::module::{ModuleCollection, ModuleHandle};
use crate::ninja::{Edge, NinjaWriter, Rule};
use crate::platform::Platform;
use crate::results::{CompilationResult, BUILD_NINJA};
use crate::state::{Options, State};
use crate::toolchain::{path_str, Toolchain, ToolchainKind};
use crate::tools::{include_flags, Tool};
use crate::validate::{validate_include_dir, validate_source_path};
use kiln_package::{Project, MANIFEST_FILE_NAME};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

/// Target and toolchain a configuration run was invoked with; forwarded
/// unchanged to every dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureArgs {
    pub target: Platform,
    pub toolchain: ToolchainKind,
}

impl ConfigureArgs {
    pub fn new(target: Platform, toolchain: ToolchainKind) -> Self {
        Self { target, toolchain }
    }

    /// Command-line form, e.g. `--target pnacl-nacl-newlib --toolchain auto`
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--target".to_string(),
            self.target.name().to_string(),
            "--toolchain".to_string(),
            self.toolchain.as_str().to_string(),
        ]
    }
}

/// How artifacts are produced for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Host builds, Native Client and Android
    Unix,
    /// Portable Native Client
    PNaCl,
    /// Emscripten (asm.js and WebAssembly)
    Emscripten,
}

impl Flavor {
    /// Flavor for building `target` on `host`
    pub fn select(target: Platform, host: Platform) -> BuildResult<Self> {
        if target.is_emscripten() {
            Ok(Flavor::Emscripten)
        } else if target.is_pnacl() {
            Ok(Flavor::PNaCl)
        } else if target == host || target.is_nacl() || target.is_android() {
            Ok(Flavor::Unix)
        } else {
            Err(BuildError::unsupported_target(
                target,
                format!("cross-compilation from {} is not supported", host),
            ))
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flavor::Unix => "unix",
            Flavor::PNaCl => "pnacl",
            Flavor::Emscripten => "emscripten",
        })
    }
}

/// Configuration of one project
#[derive(Debug)]
pub struct Build {
    context: Rc<Context>,
    args: ConfigureArgs,
    flavor: Flavor,
    toolchain: Toolchain,
    manifest: Project,
    deps: DependencyCollection,
    modules: ModuleCollection,
    state: State,
    /// Tools used by this build, by name
    tools: BTreeMap<String, Rc<Tool>>,
}

impl Build {
    /// Set up a build of the project in `root_dir` (the context root if
    /// `None`) for the target and toolchain in `args`
    pub fn from_args(args: &ConfigureArgs, context: &Rc<Context>, root_dir: Option<&Path>) -> BuildResult<Self> {
        let root_dir = root_dir.unwrap_or_else(|| context.root_dir()).to_path_buf();
        let flavor = Flavor::select(args.target, context.host())?;
        let toolchain = Toolchain::for_platform(
            args.target,
            args.toolchain,
            context.host(),
            context.environment(),
        )?;
        debug!("{} build for {} with {} and {}", flavor, args.target, toolchain.cc, toolchain.cxx);

        let manifest = context.load_manifest(&root_dir)?;
        debug!("parsed manifest for {}", manifest);
        let deps = DependencyCollection::new(Rc::clone(context), &manifest, *args);

        Ok(Self {
            context: Rc::clone(context),
            args: *args,
            flavor,
            toolchain,
            manifest,
            deps,
            modules: ModuleCollection::new(),
            state: State::new(root_dir),
            tools: BTreeMap::new(),
        })
    }

    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    pub fn args(&self) -> &ConfigureArgs {
        &self.args
    }

    pub fn root_dir(&self) -> &Path {
        self.state.root_dir()
    }

    pub fn target(&self) -> Platform {
        self.args.target
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn manifest(&self) -> &Project {
        &self.manifest
    }

    pub fn deps(&self) -> &DependencyCollection {
        &self.deps
    }

    pub fn modules(&self) -> &ModuleCollection {
        &self.modules
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn tools(&self) -> impl Iterator<Item = &Rc<Tool>> {
        self.tools.values()
    }

    /// Default module of the dependency `name`, configured on first use
    pub fn dep(&self, name: &str) -> BuildResult<ModuleHandle> {
        Ok(ModuleHandle::default_of(self.deps.resolve(name)?))
    }

    /// Named module of the dependency `name`
    pub fn dep_module(&self, name: &str, module: &str) -> BuildResult<ModuleHandle> {
        let modules = self.deps.resolve(name)?;
        modules
            .index_of(module)
            .and_then(|index| ModuleHandle::new(Rc::clone(&modules), index))
            .ok_or_else(|| BuildError::ModuleNotFound {
                module: format!("{}.{}", name, module),
            })
    }

    /// Apply `options` until the returned scope is dropped
    pub fn options(&mut self, options: Options) -> BuildResult<OptionsScope<'_>> {
        let saved = self.state.apply(options)?;
        Ok(OptionsScope::new(self, saved))
    }

    /// Make the module `name` active until the returned scope is dropped
    pub fn module(&mut self, name: &str) -> BuildResult<ModuleScope<'_>> {
        let index = self.modules.get_or_create(name)?;
        let previous = self.modules.active_index();
        self.modules.set_active(index);
        Ok(ModuleScope::new(self, previous))
    }

    /// Compile a C source file
    pub fn cc(&self, source: impl AsRef<Path>) -> BuildResult<Rc<CompilationResult>> {
        self.compile("cc", source.as_ref())
    }

    /// Compile a C++ source file
    pub fn cxx(&self, source: impl AsRef<Path>) -> BuildResult<Rc<CompilationResult>> {
        self.compile("cxx", source.as_ref())
    }

    fn compile(&self, rule: &str, source: &Path) -> BuildResult<Rc<CompilationResult>> {
        let source = validate_source_path(source, self.state.source_dir())?;
        let mut object = CompilationResult::new(source, self.target(), rule);

        let include_dirs = self.state.all_include_dirs();
        if !include_dirs.is_empty() {
            object = object.with_variable("includes", include_flags(&include_dirs));
        }
        let isa_flags = self.state.isa().flags(self.toolchain.compiler);
        if !isa_flags.is_empty() {
            object = object.with_variable("optflags", format!("$optflags {}", isa_flags.join(" ")));
        }
        if !self.state.macros().is_empty() {
            object = object.with_variable("macro", self.state.macro_flags().join(" "));
        }
        Ok(Rc::new(object))
    }

    /// Assemble a PeachPy source file
    pub fn peachpy(&mut self, source: impl AsRef<Path>) -> BuildResult<Rc<CompilationResult>> {
        let source = validate_source_path(source.as_ref(), self.state.source_dir())?;
        let tool = self.tool("peachpy")?;
        let Tool::PeachPy(peachpy) = tool.as_ref();
        Ok(Rc::new(peachpy.compile(source, &self.state.all_include_dirs())))
    }

    /// Tool `name`, recorded so its rules are written with this build
    pub fn tool(&mut self, name: &str) -> BuildResult<Rc<Tool>> {
        if let Some(tool) = self.tools.get(name) {
            return Ok(Rc::clone(tool));
        }
        let tool = self.context.tool(name, self.target())?;
        self.tools.insert(name.to_string(), Rc::clone(&tool));
        Ok(tool)
    }

    /// Export an include directory from the active module, optionally also
    /// using it for this build's compilations
    pub fn export_cpath(&mut self, include_dir: impl AsRef<Path>, add_to_include_dirs: bool) -> BuildResult<PathBuf> {
        let include_dir = validate_include_dir(include_dir.as_ref(), self.state.root_dir())?;
        self.modules.active_mut().cpath.push(include_dir.clone());
        if add_to_include_dirs {
            self.state.include_dirs.push(include_dir.clone());
        }
        Ok(include_dir)
    }

    /// Modules declared by this build
    pub fn into_modules(self) -> ModuleCollection {
        self.modules
    }

    /// Text of the build file
    ///
    /// Generation marks every artifact as written, so a build renders once.
    pub fn render(self) -> BuildResult<String> {
        let root_dir = self.context.root_dir().to_path_buf();
        let mut ninja = NinjaWriter::new();

        ninja.variable("ninja_required_version", "1.7");
        ninja.variable("builddir", path_str(&root_dir.join("build")));
        ninja.variable("root", path_str(&root_dir));
        self.toolchain.write_variables(&mut ninja);
        for tool in self.tools.values() {
            tool.write_variables(&mut ninja);
        }
        ninja.newline();

        self.toolchain.write_rules(&mut ninja);
        for tool in self.tools.values() {
            tool.write_rules(&mut ninja);
        }

        let command = self.context.configure_command();
        let program = path_str(&command.program);
        ninja.rule(
            &Rule::new("configure", format!("{} $args", program))
                .with_description("CONFIGURE $args")
                .console()
                .generator(),
        );
        ninja.rule(
            &Rule::new("clean", "ninja -f $config -t clean")
                .with_description("CLEAN")
                .console(),
        );

        ninja.build(
            &Edge::new(BUILD_NINJA, "configure")
                .with_input(program)
                .with_implicit([path_str(&root_dir.join(MANIFEST_FILE_NAME))])
                .with_variable("args", command.args.join(" ")),
        );
        ninja.build(
            &Edge::new("clean", "clean")
                .with_variable("config", path_str(&root_dir.join(BUILD_NINJA))),
        );
        ninja.newline();

        self.modules.generate(&mut ninja, &root_dir);
        Ok(ninja.finish())
    }

    /// Write `build.ninja` into the root directory; returns its path
    pub fn generate(self) -> BuildResult<PathBuf> {
        let path = self.context.root_dir().join(BUILD_NINJA);
        let content = self.render()?;
        std::fs::write(&path, content).map_err(|e| BuildError::io(&path, e))?;
        info!("generated {}", path.display());
        Ok(path)
    }
}
