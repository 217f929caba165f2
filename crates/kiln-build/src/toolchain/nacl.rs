//! Native Client toolchains (`x86_64-nacl-gnu`, `x86_64-nacl-newlib`, `pnacl`)

use super::{path_str, CompilerKind, Toolchain, ToolchainFamily, ToolchainKind};
use crate::error::{BuildError, BuildResult};
use crate::ninja::{NinjaWriter, Rule};
use crate::platform::Platform;
use kiln_config::environment::NACL_SDK_ROOT;
use kiln_config::Environment;
use std::path::{Path, PathBuf};

/// Native Client SDK locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaClSdk {
    pub sdk_root: PathBuf,
    pub toolchain_dir: PathBuf,
    pub pepper_include_dir: PathBuf,
    pub pepper_lib_dir: PathBuf,
    /// PNaCl bitcode finalizer, compressor and translator
    pub finalize: Option<String>,
    pub compress: Option<String>,
    pub translate: Option<String>,
    pub sel_ldr: String,
}

/// (host os, target) -> (toolchain subdirectory, library subdirectory)
fn sdk_subdirs(host_os: &str, target: &str) -> Option<(&'static str, &'static str)> {
    let subdirs = match (host_os, target) {
        ("linux", "x86_64-nacl-gnu") => ("linux_x86_glibc", "glibc_x86_64"),
        ("linux", "x86_64-nacl-newlib") => ("linux_pnacl", "clang-newlib_x86_64"),
        ("linux", "pnacl-nacl-newlib") => ("linux_pnacl", "pnacl"),
        ("macos", "x86_64-nacl-gnu") => ("mac_x86_glibc", "glibc_x86_64"),
        ("macos", "x86_64-nacl-newlib") => ("mac_pnacl", "clang-newlib_x86_64"),
        ("macos", "pnacl-nacl-newlib") => ("mac_pnacl", "pnacl"),
        ("windows", "x86_64-nacl-gnu") => ("win_x86_glibc", "glibc_x86_64"),
        ("windows", "x86_64-nacl-newlib") => ("win_pnacl", "clang-newlib_x86_64"),
        ("windows", "pnacl-nacl-newlib") => ("win_pnacl", "pnacl"),
        _ => return None,
    };
    Some(subdirs)
}

/// target -> (C compiler, C++ compiler, binutils prefix)
fn compilers(target: &str) -> Option<(&'static str, &'static str, &'static str)> {
    match target {
        "x86_64-nacl-gnu" => Some(("x86_64-nacl-gcc", "x86_64-nacl-g++", "x86_64-nacl-")),
        "x86_64-nacl-newlib" => Some(("x86_64-nacl-clang", "x86_64-nacl-clang++", "x86_64-nacl-")),
        "pnacl-nacl-newlib" => Some(("pnacl-clang", "pnacl-clang++", "pnacl-")),
        _ => None,
    }
}

pub(super) fn toolchain(
    target: Platform,
    kind: ToolchainKind,
    host: Platform,
    environment: &Environment,
) -> BuildResult<Toolchain> {
    if !host.is_x86_64() || !(host.is_linux() || host.is_macos() || host.is_windows()) {
        return Err(BuildError::unsupported_target(
            target,
            format!(
                "cross-compilation is not supported on {}: x86-64 Linux, Mac, or Windows system required",
                host
            ),
        ));
    }

    let sdk_root = environment
        .nacl_sdk_root
        .clone()
        .ok_or_else(|| BuildError::sdk_not_found("Native Client SDK", NACL_SDK_ROOT))?;

    let compiler = if target == "x86_64-nacl-gnu" {
        if kind == ToolchainKind::Clang {
            return Err(BuildError::unsupported_target(target, "a GNU toolchain is required"));
        }
        CompilerKind::Gnu
    } else {
        if kind == ToolchainKind::Gnu {
            return Err(BuildError::unsupported_target(target, "a Clang toolchain is required"));
        }
        CompilerKind::Clang
    };

    let (toolchain_subdir, library_subdir) = sdk_subdirs(host.os(), target.name())
        .ok_or_else(|| BuildError::unsupported_target(target, "not a Native Client platform"))?;
    let (cc, cxx, prefix) = compilers(target.name())
        .ok_or_else(|| BuildError::unsupported_target(target, "not a Native Client platform"))?;

    let toolchain_dir = sdk_root.join("toolchain").join(toolchain_subdir);
    let bin_dir = toolchain_dir.join("bin");
    let suffix = if host.is_windows() { ".bat" } else { "" };
    let bin = |name: &str| path_str(&bin_dir.join(format!("{}{}", name, suffix)));

    let mut tc = Toolchain::base(target, compiler, bin(cc), bin(cxx));
    tc.ranlib = Some(bin(&format!("{}ranlib", prefix)));
    tc.ar = Some(bin(&format!("{}ar", prefix)));
    tc.strip = Some(bin(&format!("{}strip", prefix)));

    let tool = |name: &str| Some(path_str(&bin_dir.join(name)));
    let (finalize, compress, translate) = if target.is_pnacl() {
        (tool("pnacl-finalize"), tool("pnacl-compress"), tool("pnacl-translate"))
    } else {
        tc.objcopy = tool(&format!("{}objcopy", prefix));
        (None, None, None)
    };

    tc.family = ToolchainFamily::NaCl(NaClSdk {
        pepper_include_dir: sdk_root.join("include"),
        pepper_lib_dir: sdk_root
            .join("toolchain")
            .join("lib")
            .join(library_subdir)
            .join("Release"),
        sel_ldr: path_str(&sdk_root.join("tools").join("sel_ldr.py")),
        toolchain_dir,
        finalize,
        compress,
        translate,
        sdk_root,
    });
    Ok(tc)
}

impl NaClSdk {
    pub(super) fn write_variables(&self, ninja: &mut NinjaWriter) {
        ninja.variable("includes", format!("-I{}", path_str(&self.pepper_include_dir)));
        ninja.variable("lddirs", format!("-L{}", path_str(&self.pepper_lib_dir)));
        for (key, value) in [
            ("finalize", &self.finalize),
            ("compress", &self.compress),
            ("translate", &self.translate),
        ] {
            if let Some(value) = value {
                ninja.variable(key, value);
            }
        }
        ninja.variable("sel_ldr", &self.sel_ldr);
    }

    /// Write the PNaCl rules; returns the run rule
    pub(super) fn write_rules(&self, ninja: &mut NinjaWriter, target: Platform) -> Option<Rule> {
        if target.is_pnacl() {
            ninja.rule(
                &Rule::new("finalize", "$finalize --compress -o $out $in")
                    .with_description("FINALIZE $path"),
            );
            ninja.rule(
                &Rule::new(
                    "translate",
                    "$translate --allow-llvm-bitcode-input -O3 -threads=auto -arch x86-64 $in -o $out",
                )
                .with_description("TRANSLATE $path"),
            );
        }
        Some(Rule::new("run", "$sel_ldr -p -- $in $args"))
    }

    pub fn sdk_root(&self) -> &Path {
        &self.sdk_root
    }
}
