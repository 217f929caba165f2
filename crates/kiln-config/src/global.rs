//! Global Configuration (~/.kiln/config.toml)
//!
//! Handles user-level configuration stored in `~/.kiln/config.toml`.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.kiln/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// SDK locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<SdkConfig>,
}

/// Default settings applied when the command line does not override them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Default target platform (any name accepted by the platform alias table)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Default toolchain ("auto", "gnu" or "clang")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<String>,
}

/// SDK roots for cross-compilation toolchains
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SdkConfig {
    /// Native Client SDK root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nacl: Option<PathBuf>,

    /// Emscripten SDK root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emscripten: Option<PathBuf>,

    /// Node.js executable used to run Emscripten output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodejs: Option<String>,

    /// Android NDK root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_ndk: Option<PathBuf>,

    /// Android SDK root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_sdk: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(toolchain) = self.default_toolchain() {
            if !matches!(toolchain, "auto" | "gnu" | "clang") {
                return Err(ConfigError::InvalidValue {
                    field: "defaults.toolchain".to_string(),
                    reason: format!("must be 'auto', 'gnu', or 'clang', got '{}'", toolchain),
                });
            }
        }

        if let Some(target) = self.default_target() {
            if target.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "defaults.target".to_string(),
                    reason: "target name cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the global config file path (~/.kiln/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".kiln").join("config.toml"))
    }

    /// Get the default target platform name
    pub fn default_target(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.target.as_deref())
    }

    /// Get the default toolchain name
    pub fn default_toolchain(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.toolchain.as_deref())
    }

}
