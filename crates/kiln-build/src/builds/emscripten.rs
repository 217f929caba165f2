//! Emscripten link flags

use crate::error::{BuildError, BuildResult};
use crate::platform::Platform;
use crate::toolchain::path_str;
use crate::validate::validate_source_path;
use kiln_package::Validator;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

/// Heap size of an Emscripten plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySize {
    /// Fixed heap of this many bytes
    Bytes(u64),
    /// Heap grows on demand
    All,
}

fn memory_size_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)([MK]?)$").expect("valid memory size regex"))
}

impl FromStr for MemorySize {
    type Err = BuildError;

    /// Parse `all`, a byte count, or a count with a `K` or `M` suffix (`256M`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(MemorySize::All);
        }
        let invalid = || {
            BuildError::InvalidArgument(format!(
                "invalid memory size value {}: a number optionally followed by K or M expected (e.g. 256M)",
                s
            ))
        };
        let captures = memory_size_regex().captures(s).ok_or_else(invalid)?;
        let number: u64 = captures[1].parse().map_err(|_| invalid())?;
        let multiplier = match &captures[2] {
            "K" => 1024,
            "M" => 1_048_576,
            _ => 1,
        };
        number
            .checked_mul(multiplier)
            .map(MemorySize::Bytes)
            .ok_or_else(invalid)
    }
}

impl MemorySize {
    fn flags(&self) -> BuildResult<Vec<String>> {
        match self {
            MemorySize::Bytes(0) => Err(BuildError::InvalidArgument(
                "invalid memory size value 0: a positive number expected".to_string(),
            )),
            MemorySize::Bytes(bytes) => Ok(vec!["-s".to_string(), format!("TOTAL_MEMORY={}", bytes)]),
            MemorySize::All => Ok(vec!["-s".to_string(), "ALLOW_MEMORY_GROWTH=1".to_string()]),
        }
    }
}

/// Link settings of an Emscripten plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmscriptenPluginOptions {
    /// C functions exported to JavaScript, without the leading underscore
    pub functions: Option<Vec<String>>,
    pub memory_size: Option<MemorySize>,
    /// Abort instead of returning NULL when allocation fails
    pub aborting_malloc: bool,
    /// JavaScript prepended to the output, relative to the source directory
    pub pre_js: Option<PathBuf>,
    /// JavaScript appended to the output, relative to the source directory
    pub post_js: Option<PathBuf>,
}

impl Default for EmscriptenPluginOptions {
    fn default() -> Self {
        Self {
            functions: None,
            memory_size: None,
            aborting_malloc: true,
            pre_js: None,
            post_js: None,
        }
    }
}

impl EmscriptenPluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn functions<I, S>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions = Some(functions.into_iter().map(Into::into).collect());
        self
    }

    pub fn memory_size(mut self, memory_size: MemorySize) -> Self {
        self.memory_size = Some(memory_size);
        self
    }

    pub fn aborting_malloc(mut self, aborting_malloc: bool) -> Self {
        self.aborting_malloc = aborting_malloc;
        self
    }

    pub fn pre_js(mut self, path: impl Into<PathBuf>) -> Self {
        self.pre_js = Some(path.into());
        self
    }

    pub fn post_js(mut self, path: impl Into<PathBuf>) -> Self {
        self.post_js = Some(path.into());
        self
    }

    /// `emflags` of the plugin link edge
    pub(super) fn emflags(&self, target: Platform, source_dir: &Path) -> BuildResult<String> {
        let mut emflags: Vec<String> = vec!["$emflags".into(), "--memory-init-file".into(), "0".into()];
        emflags.push("-s".into());
        if target.is_wasm() {
            emflags.push("BINARYEN_METHOD=\\\"native-wasm\\\"".into());
        } else {
            emflags.push("PRECISE_F32=2".into());
        }

        if let Some(functions) = &self.functions {
            for function in functions {
                Validator::validate_export_function(function)?;
            }
            let exported: Vec<String> = functions.iter().map(|f| format!("'_{}'", f)).collect();
            emflags.push("-s".into());
            emflags.push(format!("EXPORTED_FUNCTIONS=\"[{}]\"", exported.join(",")));
        }

        if let Some(memory_size) = &self.memory_size {
            emflags.extend(memory_size.flags()?);
        }
        if self.memory_size != Some(MemorySize::All) {
            emflags.push("-s".into());
            emflags.push(format!("ABORTING_MALLOC={}", u8::from(self.aborting_malloc)));
        }

        if let Some(pre_js) = &self.pre_js {
            emflags.push("--pre-js".into());
            emflags.push(path_str(&validate_source_path(pre_js, source_dir)?));
        }
        if let Some(post_js) = &self.post_js {
            emflags.push("--post-js".into());
            emflags.push(path_str(&validate_source_path(post_js, source_dir)?));
        }

        Ok(emflags.join(" "))
    }
}

/// `emflags` of an Emscripten executable link edge
pub(super) fn executable_emflags(target: Platform) -> String {
    let mut emflags = String::from("$emflags --memory-init-file 0 -s PRECISE_F32=2");
    if target.is_wasm() {
        emflags.push_str(" -s BINARYEN_METHOD=\\\"interpret-binary\\\"");
    }
    emflags
}
