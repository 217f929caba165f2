//! Built-in recipes
//!
//! A recipe knows how to obtain a well-known third-party project that ships
//! no Kiln manifest of its own, and how to configure it.

mod googlebenchmark;
mod googletest;

pub use googlebenchmark::GoogleBenchmark;
pub use googletest::GoogleTest;

use crate::builds::{Build, ConfigureArgs};
use crate::context::Context;
use crate::error::BuildResult;
use std::path::Path;
use std::rc::Rc;

/// Setup and configuration of a dependency without a manifest
pub trait Recipe {
    /// Dependency name the recipe is registered under
    fn name(&self) -> &str;

    /// Populate `dir` with the sources and a project manifest
    fn setup(&self, context: &Context, dir: &Path) -> BuildResult<()>;

    /// Configure the sources in `root_dir`
    fn configure(&self, args: &ConfigureArgs, context: &Rc<Context>, root_dir: &Path) -> BuildResult<Build>;
}

/// Recipes available in every context
pub fn builtin() -> Vec<Rc<dyn Recipe>> {
    vec![Rc::new(GoogleTest), Rc::new(GoogleBenchmark)]
}
