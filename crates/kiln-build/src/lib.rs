//! Kiln build configuration
//!
//! Turns a project's configuration code into a `build.ninja` file:
//! - Platform triples, toolchains and instruction-set flags
//! - Dependency resolution with overrides, fetching and built-in recipes
//! - Modules of artifacts (libraries, plugins, executables, tests, benchmarks)
//! - Ninja generation of the artifact graph
//!
//! # Example
//!
//! ```no_run
//! use kiln_build::{Build, ConfigureArgs, Context, Options, Platform, ToolchainKind};
//!
//! # fn main() -> kiln_build::BuildResult<()> {
//! let context = Context::builder(".").build()?;
//! let args = ConfigureArgs::new(Platform::host()?, ToolchainKind::Auto);
//! let mut build = Build::from_args(&args, &context, None)?;
//! {
//!     let mut scope = build.options(Options::new().source_dir("src").include_dirs(["include"]))?;
//!     let object = scope.cc("fp16.c")?;
//!     scope.static_library("fp16", [object])?;
//! }
//! build.generate()?;
//! # Ok(())
//! # }
//! ```

pub mod builds;
pub mod context;
pub mod deps;
pub mod error;
pub mod fetch;
pub mod isa;
pub mod module;
pub mod ninja;
pub mod platform;
pub mod recipes;
pub mod results;
pub mod state;
pub mod toolchain;
pub mod tools;
pub mod validate;

// Re-export main types
pub use builds::{Build, ConfigureArgs, EmscriptenPluginOptions, Flavor, MemorySize, ModuleScope, OptionsScope};
pub use context::{ConfigureCommand, ConfigureScript, Context, ContextBuilder};
pub use deps::DependencyCollection;
pub use error::{BuildError, BuildResult, ErrorKind};
pub use fetch::{Fetcher, GitFetcher};
pub use isa::{FlagFamily, InstructionSet, InstructionSets};
pub use module::{Module, ModuleCollection, ModuleHandle, DEFAULT_MODULE};
pub use ninja::NinjaWriter;
pub use platform::Platform;
pub use recipes::Recipe;
pub use results::{BuildNode, CollectionResult, CompilationResult, LinkLibrary, Subdir};
pub use state::{DepRef, Macros, Options, State};
pub use toolchain::{CompilerKind, Toolchain, ToolchainKind};
pub use tools::Tool;
