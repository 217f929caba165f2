//! Dependency resolution
//!
//! A dependency is resolved on first use: its sources are materialized
//! (reused, linked, fetched or set up by a recipe), its own dependencies are
//! materialized recursively, and it is configured by its configure script or
//! built-in recipe with the parent's target and toolchain. The sealed modules
//! of the result are cached in the [`Context`], so a dependency reachable
//! through several parents is configured once per run.

use crate::builds::{Build, ConfigureArgs};
use crate::context::Context;
use crate::error::{BuildError, BuildResult};
use crate::module::ModuleCollection;
use kiln_package::{Dependency, Project};
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, error, info};

/// Dependencies declared by one project manifest
#[derive(Debug, Clone)]
pub struct DependencyCollection {
    context: Rc<Context>,
    deps: Vec<Dependency>,
    args: ConfigureArgs,
}

impl DependencyCollection {
    pub fn new(context: Rc<Context>, manifest: &Project, args: ConfigureArgs) -> Self {
        Self {
            context,
            deps: manifest.deps.clone(),
            args,
        }
    }

    /// Declared dependency names in manifest order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.deps.iter().map(|dep| dep.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.deps.iter().any(|dep| dep.name == name)
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Sealed modules of the declared dependency `name`
    pub fn resolve(&self, name: &str) -> BuildResult<Rc<ModuleCollection>> {
        let dep = self
            .deps
            .iter()
            .find(|dep| dep.name == name)
            .ok_or_else(|| BuildError::UndeclaredDependency {
                name: name.to_string(),
            })?;

        let dep_dir = self.context.dep_dir(&dep.name);
        if let Some(modules) = self.context.resolved(&dep_dir) {
            debug!("dependency {} already configured", name);
            return Ok(modules);
        }

        let qualified_name = self.context.qualify(&dep.name);
        self.context.check_not_in_progress(&dep_dir, &qualified_name)?;
        self.context.materialize(dep, &qualified_name)?;
        self.context.setup(&dep_dir, &qualified_name)?;

        info!("configuring dependency {}", qualified_name);
        self.context
            .push_in_progress(qualified_name.clone(), dep_dir.clone());
        let build = self.configure(dep, &qualified_name, &dep_dir);
        self.context.pop_in_progress();

        let mut modules = build?.into_modules();
        modules.seal();
        let modules = Rc::new(modules);
        self.context
            .insert_resolved(dep_dir, qualified_name, Rc::clone(&modules));
        Ok(modules)
    }

    fn configure(&self, dep: &Dependency, qualified_name: &str, dep_dir: &Path) -> BuildResult<Build> {
        if let Some(script) = self.context.script(&dep.name) {
            return script(&self.args, &self.context, dep_dir);
        }
        if let Some(recipe) = self.context.recipe(&dep.name) {
            debug!("configuring {} with built-in recipe {}", qualified_name, recipe.name());
            return recipe.configure(&self.args, &self.context, dep_dir);
        }
        error!(
            "don't know how to configure {}: no configure script for {}",
            qualified_name,
            dep_dir.display()
        );
        Err(BuildError::NoConfigureScript {
            name: dep.name.clone(),
            qualified_name: qualified_name.to_string(),
            dir: dep_dir.to_path_buf(),
        })
    }
}
