//! External code generators
//!
//! Tools contribute their own variables and rules to the build file and are
//! resolved once per configuration context.

use crate::error::{BuildError, BuildResult};
use crate::ninja::{NinjaWriter, Rule};
use crate::platform::Platform;
use crate::results::CompilationResult;
use crate::toolchain::path_str;
use std::path::{Path, PathBuf};

/// A code generator usable from configuration code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    PeachPy(PeachPy),
}

impl Tool {
    /// Instantiate the tool named `name` for `target`
    pub fn for_name(name: &str, target: Platform) -> BuildResult<Self> {
        match name {
            "peachpy" => Ok(Tool::PeachPy(PeachPy::new(target)?)),
            other => Err(BuildError::InvalidArgument(format!(
                "tool {} not available: name not recognized",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::PeachPy(_) => "peachpy",
        }
    }

    pub fn write_variables(&self, ninja: &mut NinjaWriter) {
        match self {
            Tool::PeachPy(peachpy) => peachpy.write_variables(ninja),
        }
    }

    pub fn write_rules(&self, ninja: &mut NinjaWriter) {
        match self {
            Tool::PeachPy(peachpy) => peachpy.write_rules(ninja),
        }
    }
}

/// PeachPy x86-64 assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeachPy {
    target: Platform,
    abi: &'static str,
    image_format: &'static str,
}

/// target -> (ABI, object image format)
fn peachpy_abi(target: &str) -> Option<(&'static str, &'static str)> {
    match target {
        "x86_64-linux-gnu" | "x86_64-freebsd" => Some(("sysv", "elf")),
        "x86_64-macos" => Some(("sysv", "mach-o")),
        "x86_64-nacl-newlib" | "x86_64-nacl-gnu" => Some(("nacl", "elf")),
        _ => None,
    }
}

impl PeachPy {
    pub fn new(target: Platform) -> BuildResult<Self> {
        if !target.is_x86_64() {
            return Err(BuildError::unsupported("PeachPy compilation", target));
        }
        let (abi, image_format) = peachpy_abi(target.name()).ok_or_else(|| {
            BuildError::unsupported_target(target, "no PeachPy ABI for this platform")
        })?;
        Ok(Self {
            target,
            abi,
            image_format,
        })
    }

    pub fn target(&self) -> Platform {
        self.target
    }

    /// Assemble one PeachPy source file
    pub fn compile(&self, source: impl Into<PathBuf>, include_dirs: &[PathBuf]) -> CompilationResult {
        let mut object = CompilationResult::new(source, self.target, "peachpy");
        if !include_dirs.is_empty() {
            object = object.with_variable("includes", include_flags(include_dirs));
        }
        object
    }

    fn write_variables(&self, ninja: &mut NinjaWriter) {
        ninja.variable("peachpy", "python -m peachpy.x86_64");
    }

    fn write_rules(&self, ninja: &mut NinjaWriter) {
        ninja.rule(
            &Rule::new(
                "peachpy",
                format!(
                    "$peachpy -mabi={} -g4 -mimage-format={} $includes -MMD -MF $out.d -o $out $in",
                    self.abi, self.image_format
                ),
            )
            .with_gcc_depfile()
            .with_description("PEACHPY $path"),
        );
    }
}

/// `$includes -I<dir> ...`, extending the file-level include flags
pub(crate) fn include_flags(include_dirs: &[PathBuf]) -> String {
    let flags: Vec<String> = include_dirs
        .iter()
        .map(|dir| format!("-I{}", path_str(Path::new(dir))))
        .collect();
    format!("$includes {}", flags.join(" "))
}
