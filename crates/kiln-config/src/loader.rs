//! Configuration Loader
//!
//! Loads and merges configuration from multiple sources with proper precedence.

use crate::environment::Environment;
use crate::global::{DefaultsConfig, GlobalConfig};
use crate::{ConfigResult, MANIFEST_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default target platform
pub const KILN_TARGET: &str = "KILN_TARGET";
/// Environment variable overriding the default toolchain
pub const KILN_TOOLCHAIN: &str = "KILN_TOOLCHAIN";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.kiln/config.toml) - lowest priority
/// 2. Emscripten dotfile (~/.emscripten)
/// 3. Environment variables (KILN_*, SDK roots) - overrides files
/// 4. CLI flags - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Global configuration, with environment overrides applied
    pub global: GlobalConfig,

    /// SDK locations
    pub environment: Environment,

    /// Project root directory (where kiln.toml was found)
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Default target platform name, if configured
    pub fn default_target(&self) -> Option<&str> {
        self.global.default_target()
    }

    /// Default toolchain name, if configured
    pub fn default_toolchain(&self) -> Option<&str> {
        self.global.default_toolchain()
    }

    /// Project root directory, if a manifest was found
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Whether the configuration was loaded from inside a project
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit global config file instead of ~/.kiln/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find kiln.toml, then loads the global
    /// config if it exists and applies environment overrides.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let project_root = find_project_root(start_dir);
        let global = self.load_global_config()?;
        let global = apply_env_overrides(global);
        global.validate()?;
        let environment = Environment::from_process(&global);

        Ok(Config {
            global,
            environment,
            project_root,
        })
    }

    /// Load global configuration from ~/.kiln/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }
}

/// Walk up from `start_dir` to the nearest directory containing kiln.toml
pub fn find_project_root(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}

/// Apply KILN_TARGET and KILN_TOOLCHAIN overrides to the defaults section
fn apply_env_overrides(mut config: GlobalConfig) -> GlobalConfig {
    let target = env::var(KILN_TARGET).ok().filter(|v| !v.is_empty());
    let toolchain = env::var(KILN_TOOLCHAIN).ok().filter(|v| !v.is_empty());

    if target.is_some() || toolchain.is_some() {
        let defaults = config.defaults.get_or_insert_with(DefaultsConfig::default);
        if target.is_some() {
            defaults.target = target;
        }
        if toolchain.is_some() {
            defaults.toolchain = toolchain;
        }
    }

    config
}
