//! Emscripten toolchain (`asmjs-emscripten`, `wasm32-emscripten`)

use super::{path_str, CompilerKind, Toolchain, ToolchainFamily, ToolchainKind};
use crate::error::{BuildError, BuildResult};
use crate::ninja::NinjaWriter;
use crate::platform::Platform;
use kiln_config::environment::EMSCRIPTEN;
use kiln_config::Environment;
use std::path::PathBuf;
use tracing::debug;

/// Emscripten SDK locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmscriptenSdk {
    pub root: PathBuf,
    pub nodejs: String,
}

pub(super) fn toolchain(
    target: Platform,
    kind: ToolchainKind,
    host: Platform,
    environment: &Environment,
) -> BuildResult<Toolchain> {
    if kind == ToolchainKind::Gnu {
        return Err(BuildError::unsupported_target(target, "a Clang toolchain is required"));
    }

    let root = environment
        .emscripten_root()
        .map(PathBuf::from)
        .ok_or_else(|| BuildError::sdk_not_found("Emscripten SDK", EMSCRIPTEN))?;
    debug!("Emscripten SDK at {}", root.display());

    let suffix = if host.is_windows() { ".bat" } else { "" };
    let tool = |name: &str| path_str(&root.join(format!("{}{}", name, suffix)));

    let mut tc = Toolchain::base(target, CompilerKind::Clang, tool("emcc"), tool("em++"));
    tc.ar = Some(tool("emar"));
    tc.ranlib = Some(tool("emranlib"));
    tc.family = ToolchainFamily::Emscripten(EmscriptenSdk {
        nodejs: environment.nodejs().to_string(),
        root,
    });
    Ok(tc)
}

impl EmscriptenSdk {
    pub(super) fn write_variables(&self, ninja: &mut NinjaWriter) {
        ninja.variable("nodejs", &self.nodejs);
    }
}
