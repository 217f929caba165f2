//! Dependency setup command (kiln setup)
//!
//! Fetches, links or creates every dependency of the project, recursively,
//! into `<root>/deps`. Nothing is configured.

use anyhow::{bail, Context as _, Result};
use kiln_build::Context;
use kiln_config::ConfigLoader;
use kiln_package::Project;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Arguments for the setup command
#[derive(Debug, Clone, Default)]
pub struct SetupArgs {
    /// Directory to start looking for the project root from
    pub start_dir: PathBuf,
    /// Local checkouts replacing dependency sources, by dependency name
    pub overrides: Vec<(String, PathBuf)>,
}

/// Parse `--with-NAME=PATH` and `--with-NAME PATH` arguments
pub fn parse_overrides(args: &[String]) -> Result<Vec<(String, PathBuf)>> {
    let mut overrides = Vec::new();
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        let Some(rest) = arg.strip_prefix("--with-") else {
            bail!("unexpected argument {}: --with-<dependency>=<path> expected", arg);
        };
        let (name, path) = match rest.split_once('=') {
            Some((name, path)) => (name, path.to_string()),
            None => match args.next() {
                Some(path) => (rest, path.clone()),
                None => bail!("missing path for {}", arg),
            },
        };
        if name.is_empty() {
            bail!("missing dependency name in {}", arg);
        }
        overrides.push((name.to_string(), expand_home(&path)));
    }
    Ok(overrides)
}

/// Replace a leading `~` with the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

/// Run the setup command
pub fn run(args: SetupArgs) -> Result<()> {
    let config = ConfigLoader::new().load_from_directory(&args.start_dir)?;
    let root_dir = config
        .project_root()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| args.start_dir.clone());

    for (name, path) in &args.overrides {
        debug!("override for {}: {}", name, path.display());
    }
    let context = Context::builder(root_dir)
        .with_environment(config.environment.clone())
        .with_overrides(args.overrides)
        .build()?;

    let project = Project::from_root(context.root_dir())?;
    info!("setting up dependencies of {}", project);
    context
        .setup(context.root_dir(), "")
        .with_context(|| format!("failed to set up dependencies of {}", project.name))?;
    Ok(())
}
