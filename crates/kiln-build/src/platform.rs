//! Host and target platforms
//!
//! A platform is a normalized `arch-os[-abi]` triple such as `x86_64-linux-gnu`
//! or `wasm32-emscripten`. Informal names (`wasm`, `pnacl`, `x86_64-linux`)
//! are normalized through a fixed alias table. The platform decides object,
//! library and executable naming, independent of toolchains or installed SDKs.

use crate::error::{BuildError, BuildResult};
use kiln_config::Environment;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Normalized platform names and their accepted aliases
pub const PLATFORM_ALIASES: &[(&str, &[&str])] = &[
    ("x86_64-linux-gnu", &["x86_64-linux"]),
    ("x86_64-linux-gnux32", &["x32", "linux-x32"]),
    ("ppc64le-linux-gnu", &["ppc64le-linux"]),
    ("arm-linux-gnueabihf", &["arm-linux", "linux-gnueabihf"]),
    ("aarch64-linux-gnu", &["arm64-linux", "aarch64-linux"]),
    ("arm-android-v7a", &["arm-android"]),
    (
        "aarch64-android-v8a",
        &["arm64-android", "arm64-android-v8a", "aarch64-android"],
    ),
    ("x86_64-android", &[]),
    ("x86-android", &[]),
    ("x86_64-macos", &[]),
    ("x86_64-windows", &[]),
    ("x86_64-freebsd", &[]),
    ("x86_64-nacl-gnu", &[]),
    ("x86_64-nacl-newlib", &["x86_64-nacl"]),
    ("pnacl-nacl-newlib", &["pnacl", "pnacl-nacl", "pnacl-newlib"]),
    ("asmjs-emscripten", &["asmjs"]),
    ("wasm32-emscripten", &["wasm-emscripten", "wasm"]),
];

/// Resolve a platform name or alias to its normalized name
pub fn normalize_platform_name(name: &str) -> Option<&'static str> {
    PLATFORM_ALIASES
        .iter()
        .find(|(normalized, aliases)| *normalized == name || aliases.contains(&name))
        .map(|(normalized, _)| *normalized)
}

/// A combination of processor architecture, operating system (or runtime
/// environment), and optionally ABI and C library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Platform {
    name: &'static str,
    arch: &'static str,
    os: &'static str,
}

impl Platform {
    /// Create a platform from a normalized name or alias
    pub fn new(name: &str) -> BuildResult<Self> {
        let name = normalize_platform_name(name)
            .ok_or_else(|| BuildError::InvalidPlatform(name.to_string()))?;
        let mut parts = name.split('-');
        let arch = parts.next().unwrap_or(name);
        let os = parts.next().unwrap_or_default();
        Ok(Self { name, arch, os })
    }

    /// Detect the platform this process runs on
    pub fn host() -> BuildResult<Self> {
        let name = detect_host_name(
            std::env::consts::OS,
            std::env::consts::ARCH,
            cfg!(target_endian = "little"),
        )?;
        Self::new(name)
    }

    /// Targets this host can configure for given the configured SDKs
    pub fn possible_targets(&self, environment: &Environment) -> Vec<Platform> {
        let mut names = vec![self.name];
        if self.is_x86_64() && environment.has_nacl() {
            names.extend(["pnacl", "x86_64-nacl", "x86_64-nacl-gnu"]);
        }
        if environment.has_emscripten() {
            names.extend(["asmjs", "wasm"]);
        }
        names.into_iter().filter_map(|n| Self::new(n).ok()).collect()
    }

    /// Normalized name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Processor architecture part of the name
    pub fn arch(&self) -> &'static str {
        self.arch
    }

    /// Operating system or runtime part of the name
    pub fn os(&self) -> &'static str {
        self.os
    }

    /// ABI / C library part of the name, if any
    pub fn abi(&self) -> Option<&'static str> {
        self.name.splitn(3, '-').nth(2)
    }

    /// File name of a static library
    ///
    /// Returns `None` when position-independent code is requested on a
    /// platform without a PIC archive convention.
    pub fn static_library_filename(&self, name: &str, pic: bool) -> Option<String> {
        if self.is_pnacl() || self.is_emscripten() {
            (!pic).then(|| format!("lib{}.a", name))
        } else if self.is_windows() {
            (!pic).then(|| format!("{}s.lib", name))
        } else if pic {
            Some(format!("lib{}.la", name))
        } else {
            Some(format!("lib{}.a", name))
        }
    }

    /// File name of a dynamic library
    pub fn dynamic_library_filename(&self, name: &str) -> String {
        if self.is_macos() {
            format!("lib{}.dylib", name)
        } else if self.is_windows() {
            format!("{}.dll", name)
        } else {
            format!("lib{}.so", name)
        }
    }

    /// Object file extension, or `None` for PIC objects on platforms without them
    pub fn object_ext(&self, pic: bool) -> Option<&'static str> {
        if self.is_pnacl() || self.is_emscripten() {
            (!pic).then_some(".bc")
        } else if self.is_windows() {
            (!pic).then_some(".obj")
        } else if pic {
            Some(".lo")
        } else {
            Some(".o")
        }
    }

    /// Executable file extension (empty on Unix)
    pub fn executable_ext(&self) -> &'static str {
        if self.is_pnacl() {
            ".pexe"
        } else if self.is_nacl() {
            ".x86_64.nexe"
        } else if self.is_asmjs() {
            ".asm.js"
        } else if self.is_wasm() {
            ".js"
        } else if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }

    pub fn is_x86_64(&self) -> bool {
        self.arch == "x86_64"
    }

    pub fn is_x86(&self) -> bool {
        self.arch == "x86"
    }

    pub fn is_ppc64(&self) -> bool {
        matches!(self.arch, "ppc64" | "ppc64le")
    }

    pub fn is_arm(&self) -> bool {
        self.arch == "arm"
    }

    pub fn is_arm64(&self) -> bool {
        self.arch == "aarch64"
    }

    pub fn is_pnacl(&self) -> bool {
        self.arch == "pnacl"
    }

    pub fn is_asmjs(&self) -> bool {
        self.arch == "asmjs"
    }

    pub fn is_wasm(&self) -> bool {
        self.arch == "wasm32"
    }

    pub fn is_linux(&self) -> bool {
        self.os == "linux"
    }

    pub fn is_macos(&self) -> bool {
        self.os == "macos"
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    pub fn is_freebsd(&self) -> bool {
        self.os == "freebsd"
    }

    pub fn is_android(&self) -> bool {
        self.os == "android"
    }

    pub fn is_nacl(&self) -> bool {
        self.os == "nacl"
    }

    pub fn is_emscripten(&self) -> bool {
        self.os == "emscripten"
    }

    /// Native Client or Emscripten: code runs inside a browser-hosted runtime
    pub fn is_web(&self) -> bool {
        self.is_nacl() || self.is_emscripten()
    }

    pub fn is_newlib(&self) -> bool {
        self.name.ends_with("-newlib")
    }

    pub fn is_glibc(&self) -> bool {
        self.abi().is_some_and(|abi| abi.starts_with("gnu"))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl FromStr for Platform {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl PartialEq<str> for Platform {
    fn eq(&self, other: &str) -> bool {
        normalize_platform_name(other) == Some(self.name)
    }
}

impl PartialEq<&str> for Platform {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Map `(os, arch)` as reported by the standard library to a platform name
pub fn detect_host_name(os: &str, arch: &str, little_endian: bool) -> BuildResult<&'static str> {
    let name = match (os, arch) {
        ("linux", "x86_64") => Some("x86_64-linux-gnu"),
        ("linux", "arm") => Some("arm-linux-gnueabihf"),
        ("linux", "aarch64") => Some("aarch64-linux-gnu"),
        ("linux", "powerpc64") if little_endian => Some("ppc64le-linux-gnu"),
        ("macos", "x86_64") => Some("x86_64-macos"),
        ("windows", "x86_64") => Some("x86_64-windows"),
        ("freebsd", "x86_64") => Some("x86_64-freebsd"),
        _ => None,
    };
    name.ok_or_else(|| BuildError::UnsupportedHost(format!("{} on {}", os, arch)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    #[rstest]
    #[case("wasm", "wasm32-emscripten")]
    #[case("pnacl", "pnacl-nacl-newlib")]
    #[case("x32", "x86_64-linux-gnux32")]
    #[case("arm64-android", "aarch64-android-v8a")]
    #[case("x86_64-linux-gnu", "x86_64-linux-gnu")]
    fn test_alias_normalization(#[case] alias: &str, #[case] expected: &str) {
        assert_eq!(Platform::new(alias).unwrap().name(), expected);
    }

    #[test]
    fn test_unknown_name() {
        let err = Platform::new("vax-vms").unwrap_err();
        assert!(matches!(err, BuildError::InvalidPlatform(ref name) if name == "vax-vms"));
    }

    #[test]
    fn test_triple_parts() {
        let p = Platform::new("arm-linux").unwrap();
        assert_eq!(p.arch(), "arm");
        assert_eq!(p.os(), "linux");
        assert_eq!(p.abi(), Some("gnueabihf"));
        assert!(p.is_glibc());
        assert!(!p.is_newlib());

        let p = Platform::new("x86_64-macos").unwrap();
        assert_eq!(p.abi(), None);
        assert!(!p.is_glibc());
    }

    #[test]
    fn test_predicates() {
        let p = Platform::new("x86-android").unwrap();
        assert!(p.is_x86() && p.is_android() && !p.is_web());
        assert!(Platform::new("ppc64le-linux").unwrap().is_ppc64());
        assert!(Platform::new("x86_64-freebsd").unwrap().is_freebsd());
        assert!(Platform::new("pnacl").unwrap().is_web());
        assert!(Platform::new("asmjs").unwrap().is_web());
    }

    #[test]
    fn test_equality_with_alias() {
        let p = Platform::new("wasm32-emscripten").unwrap();
        assert_eq!(p, "wasm");
        assert_ne!(p, "asmjs");
        assert_ne!(p, "not-a-platform");
    }

    #[rstest]
    #[case("x86_64-linux-gnu", "libm.a", Some("libm.la"), "libm.so")]
    #[case("x86_64-macos", "libm.a", Some("libm.la"), "libm.dylib")]
    #[case("x86_64-windows", "ms.lib", None, "m.dll")]
    #[case("pnacl", "libm.a", None, "libm.so")]
    fn test_library_naming(
        #[case] platform: &str,
        #[case] static_name: &str,
        #[case] pic_name: Option<&str>,
        #[case] dynamic_name: &str,
    ) {
        let p = Platform::new(platform).unwrap();
        assert_eq!(p.static_library_filename("m", false).as_deref(), Some(static_name));
        assert_eq!(p.static_library_filename("m", true).as_deref(), pic_name);
        assert_eq!(p.dynamic_library_filename("m"), dynamic_name);
    }

    #[rstest]
    #[case("x86_64-linux", ".o", "")]
    #[case("x86_64-windows", ".obj", ".exe")]
    #[case("pnacl", ".bc", ".pexe")]
    #[case("x86_64-nacl", ".o", ".x86_64.nexe")]
    #[case("asmjs", ".bc", ".asm.js")]
    #[case("wasm", ".bc", ".js")]
    fn test_file_extensions(#[case] platform: &str, #[case] object: &str, #[case] exe: &str) {
        let p = Platform::new(platform).unwrap();
        assert_eq!(p.object_ext(false), Some(object));
        assert_eq!(p.executable_ext(), exe);
    }

    #[test]
    fn test_pic_objects() {
        assert_eq!(Platform::new("x86_64-linux").unwrap().object_ext(true), Some(".lo"));
        assert_eq!(Platform::new("asmjs").unwrap().object_ext(true), None);
    }

    #[rstest]
    #[case("linux", "x86_64", true, Some("x86_64-linux-gnu"))]
    #[case("linux", "arm", true, Some("arm-linux-gnueabihf"))]
    #[case("linux", "powerpc64", true, Some("ppc64le-linux-gnu"))]
    #[case("linux", "powerpc64", false, None)]
    #[case("macos", "x86_64", true, Some("x86_64-macos"))]
    #[case("macos", "aarch64", true, None)]
    #[case("solaris", "x86_64", true, None)]
    fn test_detect_host(
        #[case] os: &str,
        #[case] arch: &str,
        #[case] little_endian: bool,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(detect_host_name(os, arch, little_endian).ok(), expected);
    }

    #[test]
    fn test_possible_targets() {
        let host = Platform::new("x86_64-linux").unwrap();
        let names = |env: &Environment| -> Vec<&str> {
            host.possible_targets(env).iter().map(|p| p.name()).collect()
        };

        assert_eq!(names(&Environment::default()), vec!["x86_64-linux-gnu"]);

        let env = Environment {
            nacl_sdk_root: Some(PathBuf::from("/opt/nacl")),
            emscripten_root: Some(PathBuf::from("/opt/emsdk")),
            ..Default::default()
        };
        assert_eq!(
            names(&env),
            vec![
                "x86_64-linux-gnu",
                "pnacl-nacl-newlib",
                "x86_64-nacl-newlib",
                "x86_64-nacl-gnu",
                "asmjs-emscripten",
                "wasm32-emscripten",
            ]
        );
    }

    #[test]
    fn test_nacl_requires_x86_64_host() {
        let host = Platform::new("arm-linux").unwrap();
        let env = Environment {
            nacl_sdk_root: Some(PathBuf::from("/opt/nacl")),
            ..Default::default()
        };
        assert_eq!(host.possible_targets(&env), vec![host]);
    }
}
