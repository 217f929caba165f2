//! SDK environment discovery
//!
//! Cross-compilation toolchains need SDK roots that are never guessed: they
//! come from the global config, the Emscripten dotfile, or environment
//! variables. A missing root is reported by the toolchain that needs it.

use crate::global::GlobalConfig;
use std::path::{Path, PathBuf};

/// Native Client SDK root variable
pub const NACL_SDK_ROOT: &str = "NACL_SDK_ROOT";
/// Emscripten SDK root variable
pub const EMSCRIPTEN: &str = "EMSCRIPTEN";
/// Android NDK root variable
pub const ANDROID_NDK: &str = "ANDROID_NDK";
/// Android SDK root variable
pub const ANDROID_SDK: &str = "ANDROID_SDK";

/// Snapshot of the SDK locations visible to the configuration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Native Client SDK root
    pub nacl_sdk_root: Option<PathBuf>,
    /// Emscripten SDK root
    pub emscripten_root: Option<PathBuf>,
    /// Node.js executable for running Emscripten output
    pub emscripten_nodejs: Option<String>,
    /// Android NDK root
    pub android_ndk: Option<PathBuf>,
    /// Android SDK root
    pub android_sdk: Option<PathBuf>,
}

impl Environment {
    /// Build an environment from the global config, an optional `~/.emscripten`
    /// dotfile, and a variable lookup function
    ///
    /// Later sources override earlier ones: global config, then the dotfile,
    /// then environment variables.
    pub fn resolve<F>(global: &GlobalConfig, emscripten_dotfile: Option<&str>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = Environment::default();

        if let Some(sdk) = &global.sdk {
            env.nacl_sdk_root = sdk.nacl.clone();
            env.emscripten_root = sdk.emscripten.clone();
            env.emscripten_nodejs = sdk.nodejs.clone();
            env.android_ndk = sdk.android_ndk.clone();
            env.android_sdk = sdk.android_sdk.clone();
        }

        if let Some(content) = emscripten_dotfile {
            let dotfile = EmscriptenDotfile::parse(content);
            if dotfile.root.is_some() {
                env.emscripten_root = dotfile.root;
            }
            if dotfile.nodejs.is_some() {
                env.emscripten_nodejs = dotfile.nodejs;
            }
        }

        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(root) = non_empty(NACL_SDK_ROOT) {
            env.nacl_sdk_root = Some(PathBuf::from(root));
        }
        if let Some(root) = non_empty(EMSCRIPTEN) {
            env.emscripten_root = Some(PathBuf::from(root));
        }
        if let Some(root) = non_empty(ANDROID_NDK) {
            env.android_ndk = Some(PathBuf::from(root));
        }
        if let Some(root) = non_empty(ANDROID_SDK) {
            env.android_sdk = Some(PathBuf::from(root));
        }

        env
    }

    /// Build an environment from the process environment and the user's home
    /// directory
    pub fn from_process(global: &GlobalConfig) -> Self {
        let dotfile = dirs::home_dir()
            .map(|home| home.join(".emscripten"))
            .and_then(|path| std::fs::read_to_string(path).ok());
        Self::resolve(global, dotfile.as_deref(), |name| std::env::var(name).ok())
    }

    /// Whether a Native Client SDK is configured
    pub fn has_nacl(&self) -> bool {
        self.nacl_sdk_root.is_some()
    }

    /// Whether an Emscripten SDK is configured
    pub fn has_emscripten(&self) -> bool {
        self.emscripten_root.is_some()
    }

    /// Node.js executable, falling back to `node` on the search path
    pub fn nodejs(&self) -> &str {
        self.emscripten_nodejs.as_deref().unwrap_or("node")
    }

    /// Emscripten SDK root, if configured
    pub fn emscripten_root(&self) -> Option<&Path> {
        self.emscripten_root.as_deref()
    }
}

/// Values extracted from an `~/.emscripten` configuration file
#[derive(Debug, Default, PartialEq, Eq)]
struct EmscriptenDotfile {
    root: Option<PathBuf>,
    nodejs: Option<String>,
}

impl EmscriptenDotfile {
    /// Parse the simple `KEY = 'value'` assignments of an Emscripten dotfile
    ///
    /// Only literal string assignments are understood; computed values are
    /// ignored.
    fn parse(content: &str) -> Self {
        let mut dotfile = EmscriptenDotfile::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let Some(value) = unquote(value.trim()) else {
                continue;
            };
            match key.trim() {
                "EMSCRIPTEN_ROOT" => dotfile.root = Some(PathBuf::from(value)),
                "NODE_JS" => dotfile.nodejs = Some(value.to_string()),
                _ => {}
            }
        }
        dotfile
    }
}

fn unquote(value: &str) -> Option<&str> {
    ['\'', '"'].iter().find_map(|&quote| {
        value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}
