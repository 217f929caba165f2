//! Platform description command (kiln platform)

use anyhow::Result;
use kiln_build::Platform;
use kiln_config::environment::{ANDROID_NDK, EMSCRIPTEN, NACL_SDK_ROOT};
use serde::Serialize;
use std::fmt::Write as _;

/// Naming conventions and requirements of one platform
#[derive(Debug, Serialize)]
pub struct PlatformReport {
    pub name: &'static str,
    pub arch: &'static str,
    pub os: &'static str,
    pub abi: Option<&'static str>,
    pub object_ext: Option<&'static str>,
    pub executable_ext: &'static str,
    pub static_library: Option<String>,
    pub dynamic_library: String,
    /// Variable naming the SDK the platform's toolchain comes from
    pub sdk: Option<&'static str>,
}

impl PlatformReport {
    pub fn new(platform: Platform) -> Self {
        let sdk = if platform.is_nacl() {
            Some(NACL_SDK_ROOT)
        } else if platform.is_emscripten() {
            Some(EMSCRIPTEN)
        } else if platform.is_android() {
            Some(ANDROID_NDK)
        } else {
            None
        };
        Self {
            name: platform.name(),
            arch: platform.arch(),
            os: platform.os(),
            abi: platform.abi(),
            object_ext: platform.object_ext(false),
            executable_ext: platform.executable_ext(),
            static_library: platform.static_library_filename("NAME", false),
            dynamic_library: platform.dynamic_library_filename("NAME"),
            sdk,
        }
    }

    pub fn to_text(&self) -> String {
        let mut text = format!("{}\n", self.name);
        let _ = writeln!(text, "  arch: {}", self.arch);
        let _ = writeln!(text, "  os: {}", self.os);
        if let Some(abi) = self.abi {
            let _ = writeln!(text, "  abi: {}", abi);
        }
        if let Some(ext) = self.object_ext {
            let _ = writeln!(text, "  object extension: {}", ext);
        }
        if !self.executable_ext.is_empty() {
            let _ = writeln!(text, "  executable extension: {}", self.executable_ext);
        }
        if let Some(library) = &self.static_library {
            let _ = writeln!(text, "  static library: {}", library);
        }
        let _ = writeln!(text, "  dynamic library: {}", self.dynamic_library);
        if let Some(sdk) = self.sdk {
            let _ = writeln!(text, "  SDK: ${}", sdk);
        }
        text
    }
}

/// Run the platform command
pub fn run(name: &str, json: bool) -> Result<()> {
    let report = PlatformReport::new(Platform::new(name)?);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}
