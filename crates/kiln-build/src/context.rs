//! Configuration context
//!
//! One [`Context`] is shared by the top-level build and every dependency
//! build it configures. It carries the project root, the host platform and
//! SDK environment, dependency overrides, the fetcher and the known recipes
//! and configure scripts, plus the caches that make each dependency resolve
//! and each tool load only once per run.

use crate::builds::{Build, ConfigureArgs};
use crate::error::{BuildError, BuildResult};
use crate::fetch::{Fetcher, GitFetcher};
use crate::module::ModuleCollection;
use crate::platform::Platform;
use crate::recipes::{self, Recipe};
use crate::tools::Tool;
use crate::validate::normalize;
use kiln_config::{Environment, GlobalConfig};
use kiln_package::{Dependency, Project};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, error, info};

/// Directory below the root that holds every dependency checkout
pub const DEPS_DIR: &str = "deps";

/// Configure function of a dependency, registered by its bare name
pub type ConfigureScript = Rc<dyn Fn(&ConfigureArgs, &Rc<Context>, &Path) -> BuildResult<Build>>;

/// Command that regenerates the build file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ConfigureCommand {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The running executable and its arguments
    pub fn from_process() -> BuildResult<Self> {
        let program = std::env::current_exe()?;
        Ok(Self::new(program, std::env::args().skip(1)))
    }
}

/// A dependency whose modules are available
#[derive(Debug, Clone)]
struct Resolved {
    qualified_name: String,
    modules: Rc<ModuleCollection>,
}

/// Shared state of one configuration run
pub struct Context {
    root_dir: PathBuf,
    host: Platform,
    environment: Environment,
    overrides: HashMap<String, PathBuf>,
    fetcher: Box<dyn Fetcher>,
    recipes: HashMap<String, Rc<dyn Recipe>>,
    scripts: HashMap<String, ConfigureScript>,
    configure_command: ConfigureCommand,
    resolved: RefCell<HashMap<PathBuf, Resolved>>,
    in_progress: RefCell<Vec<(String, PathBuf)>>,
    tools: RefCell<HashMap<(String, Platform), Rc<Tool>>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("root_dir", &self.root_dir)
            .field("host", &self.host)
            .field("overrides", &self.overrides)
            .field("recipes", &self.recipes.keys().collect::<Vec<_>>())
            .field("scripts", &self.scripts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Start building a context for the project rooted at `root_dir`
    pub fn builder(root_dir: impl Into<PathBuf>) -> ContextBuilder {
        ContextBuilder::new(root_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn host(&self) -> Platform {
        self.host
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn deps_dir(&self) -> PathBuf {
        self.root_dir.join(DEPS_DIR)
    }

    /// Checkout directory of the dependency named `name`
    pub fn dep_dir(&self, name: &str) -> PathBuf {
        self.deps_dir().join(name)
    }

    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    pub fn recipe(&self, name: &str) -> Option<Rc<dyn Recipe>> {
        self.recipes.get(name).cloned()
    }

    pub fn script(&self, name: &str) -> Option<ConfigureScript> {
        self.scripts.get(name).cloned()
    }

    /// Local path replacing the dependency named `name`
    pub fn override_path(&self, name: &str) -> Option<&Path> {
        self.overrides.get(name).map(PathBuf::as_path)
    }

    pub fn configure_command(&self) -> &ConfigureCommand {
        &self.configure_command
    }

    /// `name` prefixed with the namespace of the dependency being configured
    pub fn qualify(&self, name: &str) -> String {
        match self.in_progress.borrow().last() {
            Some((namespace, _)) => format!("{}:{}", namespace, name),
            None => name.to_string(),
        }
    }

    /// Make the dependency's sources available in its checkout directory
    ///
    /// An existing directory is reused. Otherwise the sources come from an
    /// override path (symlinked), the dependency URL (cloned) or a built-in
    /// recipe, in that order.
    pub fn materialize(&self, dep: &Dependency, qualified_name: &str) -> BuildResult<PathBuf> {
        let dep_dir = self.dep_dir(&dep.name);
        if dep_dir.exists() {
            info!("reuse dependency {} from {}", qualified_name, dep_dir.display());
            return Ok(dep_dir);
        }

        let deps_dir = self.deps_dir();
        std::fs::create_dir_all(&deps_dir).map_err(|e| BuildError::io(&deps_dir, e))?;

        if let Some(path) = self.override_path(&dep.name) {
            info!("link dependency {} from {}", qualified_name, path.display());
            symlink_dir(path, &dep_dir)?;
        } else if let Some(url) = &dep.url {
            info!("fetch dependency {} from {}", qualified_name, url);
            self.fetcher.clone_repository(url, &dep_dir, None)?;
        } else if let Some(recipe) = self.recipe(&dep.name) {
            info!("setup dependency {} using built-in recipe", qualified_name);
            recipe.setup(self, &dep_dir)?;
        } else {
            error!("no source provided for dependency {} ({})", dep.name, qualified_name);
            return Err(BuildError::NoSource {
                name: dep.name.clone(),
                qualified_name: qualified_name.to_string(),
            });
        }
        Ok(dep_dir)
    }

    /// Materialize every dependency of the project in `project_dir`,
    /// recursively, without configuring any of them
    ///
    /// The top-level project must have a manifest; a dependency without one
    /// has no dependencies of its own.
    pub fn setup(&self, project_dir: &Path, namespace: &str) -> BuildResult<()> {
        let mut chain = Vec::new();
        if project_dir != self.root_dir {
            chain.push((namespace.to_string(), project_dir.to_path_buf()));
        }
        self.setup_tree(project_dir, namespace, &mut chain)
    }

    fn setup_tree(
        &self,
        project_dir: &Path,
        namespace: &str,
        chain: &mut Vec<(String, PathBuf)>,
    ) -> BuildResult<()> {
        let project = self.load_manifest(project_dir)?;
        for dep in &project.deps {
            let qualified_name = if namespace.is_empty() {
                dep.name.clone()
            } else {
                format!("{}:{}", namespace, dep.name)
            };
            let dep_dir = self.dep_dir(&dep.name);
            if chain.iter().any(|(_, dir)| *dir == dep_dir) {
                return Err(circular(chain, &qualified_name));
            }

            self.materialize(dep, &qualified_name)?;
            chain.push((qualified_name.clone(), dep_dir.clone()));
            let result = self.setup_tree(&dep_dir, &qualified_name, chain);
            chain.pop();
            result?;
        }
        Ok(())
    }

    /// Manifest of `project_dir`; required for the root only
    pub fn load_manifest(&self, project_dir: &Path) -> BuildResult<Project> {
        if project_dir == self.root_dir {
            return Ok(Project::from_root(project_dir)?);
        }
        match Project::load(project_dir)? {
            Some(project) => Ok(project),
            None => {
                let name = project_dir
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                debug!("no manifest in {}, treating {} as a leaf", project_dir.display(), name);
                Ok(Project::anonymous(name))
            }
        }
    }

    /// Tool `name` for `target`, loaded on first use
    pub fn tool(&self, name: &str, target: Platform) -> BuildResult<Rc<Tool>> {
        let key = (name.to_string(), target);
        if let Some(tool) = self.tools.borrow().get(&key) {
            return Ok(Rc::clone(tool));
        }
        let tool = Rc::new(Tool::for_name(name, target)?);
        self.tools.borrow_mut().insert(key, Rc::clone(&tool));
        Ok(tool)
    }

    /// Modules of an already configured dependency
    pub fn resolved(&self, dep_dir: &Path) -> Option<Rc<ModuleCollection>> {
        self.resolved
            .borrow()
            .get(dep_dir)
            .map(|resolved| Rc::clone(&resolved.modules))
    }

    /// Qualified name under which the dependency in `dep_dir` was first resolved
    pub fn resolved_name(&self, dep_dir: &Path) -> Option<String> {
        self.resolved
            .borrow()
            .get(dep_dir)
            .map(|resolved| resolved.qualified_name.clone())
    }

    /// Number of configured dependencies
    pub fn resolved_count(&self) -> usize {
        self.resolved.borrow().len()
    }

    pub(crate) fn insert_resolved(
        &self,
        dep_dir: PathBuf,
        qualified_name: String,
        modules: Rc<ModuleCollection>,
    ) {
        self.resolved
            .borrow_mut()
            .entry(dep_dir)
            .or_insert(Resolved {
                qualified_name,
                modules,
            });
    }

    /// Fail if the dependency in `dep_dir` is being configured further up
    pub(crate) fn check_not_in_progress(&self, dep_dir: &Path, qualified_name: &str) -> BuildResult<()> {
        let in_progress = self.in_progress.borrow();
        if in_progress.iter().any(|(_, dir)| dir == dep_dir) {
            return Err(circular(&in_progress, qualified_name));
        }
        Ok(())
    }

    pub(crate) fn push_in_progress(&self, qualified_name: String, dep_dir: PathBuf) {
        self.in_progress.borrow_mut().push((qualified_name, dep_dir));
    }

    pub(crate) fn pop_in_progress(&self) {
        self.in_progress.borrow_mut().pop();
    }
}

fn circular(chain: &[(String, PathBuf)], qualified_name: &str) -> BuildError {
    let mut names: Vec<&str> = chain.iter().map(|(name, _)| name.as_str()).collect();
    names.push(qualified_name);
    BuildError::CircularDependency(names.join(" -> "))
}

#[cfg(unix)]
fn symlink_dir(original: &Path, link: &Path) -> BuildResult<()> {
    std::os::unix::fs::symlink(original, link).map_err(|e| BuildError::io(link, e))
}

#[cfg(windows)]
fn symlink_dir(original: &Path, link: &Path) -> BuildResult<()> {
    std::os::windows::fs::symlink_dir(original, link).map_err(|e| BuildError::io(link, e))
}

/// Absolute, lexically normalized form of `path`
fn absolute(path: &Path) -> BuildResult<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(path)))
    }
}

/// Builder for [`Context`]
pub struct ContextBuilder {
    root_dir: PathBuf,
    host: Option<Platform>,
    environment: Option<Environment>,
    overrides: HashMap<String, PathBuf>,
    fetcher: Option<Box<dyn Fetcher>>,
    recipes: HashMap<String, Rc<dyn Recipe>>,
    scripts: HashMap<String, ConfigureScript>,
    configure_command: Option<ConfigureCommand>,
}

impl ContextBuilder {
    /// Builder with the built-in recipes registered
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let recipes = recipes::builtin()
            .into_iter()
            .map(|recipe| (recipe.name().to_string(), recipe))
            .collect();
        Self {
            root_dir: root_dir.into(),
            host: None,
            environment: None,
            overrides: HashMap::new(),
            fetcher: None,
            recipes,
            scripts: HashMap::new(),
            configure_command: None,
        }
    }

    pub fn with_host(mut self, host: Platform) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Use a local directory instead of fetching the dependency `name`
    pub fn with_override(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(name.into(), path.into());
        self
    }

    pub fn with_overrides<I, S, P>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        self.overrides
            .extend(overrides.into_iter().map(|(name, path)| (name.into(), path.into())));
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Register a recipe, replacing a built-in one of the same name
    pub fn with_recipe(mut self, recipe: impl Recipe + 'static) -> Self {
        self.recipes.insert(recipe.name().to_string(), Rc::new(recipe));
        self
    }

    /// Register the configure function of the dependency `name`
    pub fn with_script<F>(mut self, name: impl Into<String>, script: F) -> Self
    where
        F: Fn(&ConfigureArgs, &Rc<Context>, &Path) -> BuildResult<Build> + 'static,
    {
        self.scripts.insert(name.into(), Rc::new(script));
        self
    }

    pub fn with_configure_command(mut self, command: ConfigureCommand) -> Self {
        self.configure_command = Some(command);
        self
    }

    pub fn build(self) -> BuildResult<Rc<Context>> {
        let root_dir = absolute(&self.root_dir)?;
        info!("detected root directory {}", root_dir.display());

        let host = match self.host {
            Some(host) => host,
            None => Platform::host()?,
        };
        let environment = self
            .environment
            .unwrap_or_else(|| Environment::from_process(&GlobalConfig::default()));
        let configure_command = match self.configure_command {
            Some(command) => command,
            None => ConfigureCommand::from_process()?,
        };
        let overrides = self
            .overrides
            .into_iter()
            .map(|(name, path)| Ok((name, absolute(&path)?)))
            .collect::<BuildResult<_>>()?;

        Ok(Rc::new(Context {
            root_dir,
            host,
            environment,
            overrides,
            fetcher: self.fetcher.unwrap_or_else(|| Box::new(GitFetcher::new())),
            recipes: self.recipes,
            scripts: self.scripts,
            configure_command,
            resolved: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(Vec::new()),
            tools: RefCell::new(HashMap::new()),
        }))
    }
}
