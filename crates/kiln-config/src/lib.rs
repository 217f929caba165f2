//! Kiln Configuration System
//!
//! Provides the configuration inputs consumed by the build generator:
//! - Global user configuration (~/.kiln/config.toml)
//! - SDK environment discovery (Native Client, Emscripten, Android)
//! - Project root discovery (directory containing kiln.toml)
//!
//! # Configuration Hierarchy
//!
//! Configuration is merged in the following order (later overrides earlier):
//! 1. Global config (~/.kiln/config.toml)
//! 2. Emscripten dotfile (~/.emscripten), for the Emscripten SDK only
//! 3. Environment variables (NACL_SDK_ROOT, EMSCRIPTEN, ANDROID_NDK, ...)
//! 4. CLI flags (handled by the caller)
//!
//! # Example
//!
//! ```no_run
//! use kiln_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("{:?}", config.environment.nacl_sdk_root);
//! ```

pub mod environment;
pub mod global;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the project manifest that marks a project root
pub const MANIFEST_FILE_NAME: &str = "kiln.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use environment::Environment;
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
