//! Toolchains
//!
//! A toolchain is the set of compiler, linker and archiver commands plus the
//! default flags for one target platform. The generic Unix toolchain covers
//! host builds; Native Client, Emscripten and the Android NDK extend it with
//! SDK-relative executables and target-specific flags.

mod android;
mod emscripten;
mod nacl;

pub use android::AndroidSdk;
pub use emscripten::EmscriptenSdk;
pub use nacl::NaClSdk;

use crate::error::{BuildError, BuildResult};
use crate::ninja::{NinjaWriter, Rule};
use crate::platform::Platform;
use kiln_config::Environment;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Toolchain requested on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ToolchainKind {
    #[default]
    Auto,
    Gnu,
    Clang,
}

impl ToolchainKind {
    pub const ALL: [ToolchainKind; 3] = [ToolchainKind::Auto, ToolchainKind::Gnu, ToolchainKind::Clang];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainKind::Auto => "auto",
            ToolchainKind::Gnu => "gnu",
            ToolchainKind::Clang => "clang",
        }
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolchainKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ToolchainKind::Auto),
            "gnu" => Ok(ToolchainKind::Gnu),
            "clang" => Ok(ToolchainKind::Clang),
            other => Err(BuildError::InvalidArgument(format!(
                "unknown toolchain {}: 'auto', 'gnu', or 'clang' expected",
                other
            ))),
        }
    }
}

/// Compiler family actually selected for a toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilerKind {
    Gnu,
    Clang,
}

/// Platform-family specific toolchain data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainFamily {
    /// Host compilers found on the search path
    Unix,
    /// Native Client SDK
    NaCl(NaClSdk),
    /// Emscripten SDK
    Emscripten(EmscriptenSdk),
    /// Android NDK
    Android(AndroidSdk),
}

/// Compiler, linker and archiver commands with their default flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub target: Platform,
    pub compiler: CompilerKind,
    pub cc: String,
    pub cxx: String,
    pub ar: Option<String>,
    pub ranlib: Option<String>,
    pub strip: Option<String>,
    pub objcopy: Option<String>,
    pub cflags: Vec<String>,
    pub cxxflags: Vec<String>,
    pub ldflags: Vec<String>,
    /// Libraries appended to every link command
    pub ldlibs: Vec<String>,
    pub optflag: String,
    pub family: ToolchainFamily,
}

impl Toolchain {
    /// Select and initialize the toolchain for `target`
    pub fn for_platform(
        target: Platform,
        kind: ToolchainKind,
        host: Platform,
        environment: &Environment,
    ) -> BuildResult<Self> {
        if target.is_nacl() {
            nacl::toolchain(target, kind, host, environment)
        } else if target.is_emscripten() {
            emscripten::toolchain(target, kind, host, environment)
        } else if target.is_android() {
            android::toolchain(target, kind, host, environment)
        } else {
            Ok(Self::unix(target, kind, host))
        }
    }

    /// Generic Unix toolchain with compilers from the search path
    pub fn unix(target: Platform, kind: ToolchainKind, host: Platform) -> Self {
        let compiler = match kind {
            ToolchainKind::Gnu => CompilerKind::Gnu,
            ToolchainKind::Clang => CompilerKind::Clang,
            ToolchainKind::Auto if host.is_linux() => CompilerKind::Gnu,
            ToolchainKind::Auto => CompilerKind::Clang,
        };
        let (cc, cxx) = match compiler {
            CompilerKind::Gnu => ("gcc", "g++"),
            CompilerKind::Clang => ("clang", "clang++"),
        };
        let mut toolchain = Self::base(target, compiler, cc.to_string(), cxx.to_string());
        toolchain.ar = Some("ar".to_string());
        toolchain.ranlib = Some("ranlib".to_string());
        toolchain.strip = Some("strip".to_string());
        toolchain
    }

    /// Default flags shared by every Unix-like toolchain
    fn base(target: Platform, compiler: CompilerKind, cc: String, cxx: String) -> Self {
        let cxx_std = if target == "x86_64-nacl-gnu" {
            "-std=gnu++0x"
        } else {
            "-std=gnu++11"
        };
        let mut toolchain = Self {
            target,
            compiler,
            cc,
            cxx,
            ar: None,
            ranlib: None,
            strip: None,
            objcopy: None,
            cflags: vec!["-std=gnu99".to_string(), "-g".to_string()],
            cxxflags: vec![cxx_std.to_string(), "-g".to_string()],
            ldflags: Vec::new(),
            ldlibs: Vec::new(),
            optflag: "-O2".to_string(),
            family: ToolchainFamily::Unix,
        };
        if target.is_glibc() {
            toolchain.cflags.push("-pthread".to_string());
            toolchain.cxxflags.push("-pthread".to_string());
            toolchain.ldflags.push("-pthread".to_string());
        }
        toolchain
    }

    /// Whether the toolchain can link shared libraries
    pub fn supports_shared_libraries(&self) -> bool {
        match &self.family {
            ToolchainFamily::Unix => true,
            ToolchainFamily::NaCl(_) => self.target.is_newlib(),
            ToolchainFamily::Emscripten(_) | ToolchainFamily::Android(_) => false,
        }
    }

    pub fn write_variables(&self, ninja: &mut NinjaWriter) {
        ninja.variable("cc", &self.cc);
        ninja.variable("cxx", &self.cxx);
        for (key, value) in [
            ("ar", &self.ar),
            ("ranlib", &self.ranlib),
            ("strip", &self.strip),
            ("objcopy", &self.objcopy),
        ] {
            if let Some(value) = value {
                ninja.variable(key, value);
            }
        }

        ninja.variable_list("cflags", &self.cflags);
        ninja.variable_list("cxxflags", &self.cxxflags);
        ninja.variable_list("ldflags", &self.ldflags);
        ninja.variable("optflags", &self.optflag);
        if !self.ldlibs.is_empty() {
            ninja.variable_list("stdlibs", &self.ldlibs);
        }

        match &self.family {
            ToolchainFamily::Unix => {}
            ToolchainFamily::NaCl(sdk) => sdk.write_variables(ninja),
            ToolchainFamily::Emscripten(sdk) => sdk.write_variables(ninja),
            ToolchainFamily::Android(sdk) => sdk.write_variables(ninja),
        }
    }

    pub fn write_rules(&self, ninja: &mut NinjaWriter) {
        ninja.rule(
            &Rule::new(
                "cc",
                "$cc -o $out -c $in -MMD -MF $out.d $optflags $cflags $macro $includes",
            )
            .with_gcc_depfile()
            .with_description("CC $path"),
        );
        ninja.rule(
            &Rule::new(
                "cxx",
                "$cxx -o $out -c $in -MMD -MF $out.d $optflags $cxxflags $macro $includes",
            )
            .with_gcc_depfile()
            .with_description("CXX $path"),
        );

        let emscripten_flags = if self.target.is_wasm() {
            "$optflags -s WASM=1 $emflags "
        } else if self.target.is_emscripten() {
            "$optflags $emflags "
        } else {
            ""
        };
        ninja.rule(
            &Rule::new(
                "executable",
                format!(
                    "$linker {}$ldflags $lddirs -o $out $in $ldlibs $stdlibs",
                    emscripten_flags
                ),
            )
            .with_description("LINK $path"),
        );

        if self.supports_shared_libraries() {
            let library_flag = if self.target.is_macos() {
                "-dynamiclib"
            } else {
                "-shared"
            };
            ninja.rule(
                &Rule::new(
                    "library",
                    format!(
                        "$linker {}{} $ldflags $lddirs -o $out $in $ldlibs $stdlibs",
                        emscripten_flags, library_flag
                    ),
                )
                .with_description("LINK $path"),
            );
        }

        ninja.rule(&Rule::new("archive", "$ar rcs $out $in").with_description("AR $path"));

        let run = match &self.family {
            ToolchainFamily::Unix => Some(Rule::new("run", "$in $args")),
            ToolchainFamily::NaCl(sdk) => sdk.write_rules(ninja, self.target),
            ToolchainFamily::Emscripten(_) => Some(Rule::new("run", "$nodejs $in $args")),
            ToolchainFamily::Android(_) => Some(Rule::new(
                "run",
                "$adb push $in /data/local/tmp/$path && $adb shell /data/local/tmp/$path $args",
            )),
        };
        if let Some(run) = run {
            ninja.rule(&run.with_description("RUN $path").console());
        }
    }
}

/// Render a path for use in a command or variable
pub(crate) fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
