//! Android NDK toolchain

use super::{path_str, CompilerKind, Toolchain, ToolchainFamily, ToolchainKind};
use crate::error::{BuildError, BuildResult};
use crate::ninja::NinjaWriter;
use crate::platform::Platform;
use kiln_config::environment::{ANDROID_NDK, ANDROID_SDK};
use kiln_config::Environment;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Android SDK and NDK locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidSdk {
    pub sdk_root: PathBuf,
    pub ndk_root: PathBuf,
    /// Platform API level the code is compiled against
    pub api_level: u32,
}

/// Per-ABI naming in the NDK layout
struct AbiInfo {
    abi: &'static str,
    sysroot_abi: &'static str,
    toolchain_name: &'static str,
    toolchain_root: &'static str,
    header_triple: &'static str,
    llvm_triple: &'static str,
}

fn abi_info(target: &str) -> Option<AbiInfo> {
    let info = match target {
        "arm-android-v7a" => AbiInfo {
            abi: "armeabi-v7a",
            sysroot_abi: "arm",
            toolchain_name: "arm-linux-androideabi",
            toolchain_root: "arm-linux-androideabi",
            header_triple: "arm-linux-androideabi",
            llvm_triple: "armv7-none-linux-androideabi",
        },
        "aarch64-android-v8a" => AbiInfo {
            abi: "arm64-v8a",
            sysroot_abi: "arm64",
            toolchain_name: "aarch64-linux-android",
            toolchain_root: "aarch64-linux-android",
            header_triple: "aarch64-linux-android",
            llvm_triple: "aarch64-none-linux-android",
        },
        "x86-android" => AbiInfo {
            abi: "x86",
            sysroot_abi: "x86",
            toolchain_name: "i686-linux-android",
            toolchain_root: "x86",
            header_triple: "i686-linux-android",
            llvm_triple: "i686-none-linux-android",
        },
        "x86_64-android" => AbiInfo {
            abi: "x86_64",
            sysroot_abi: "x86_64",
            toolchain_name: "x86_64-linux-android",
            toolchain_root: "x86_64",
            header_triple: "x86_64-linux-android",
            llvm_triple: "x86_64-none-linux-android",
        },
        _ => return None,
    };
    Some(info)
}

fn host_tag(host: Platform) -> Option<&'static str> {
    match host.name() {
        "x86_64-linux-gnu" => Some("linux-x86_64"),
        "x86_64-macos" => Some("darwin-x86_64"),
        "x86_64-windows" => Some("windows-x86_64"),
        _ => None,
    }
}

fn strings<const N: usize>(flags: [&'static str; N]) -> impl Iterator<Item = String> {
    flags.into_iter().map(str::to_string)
}

pub(super) fn toolchain(
    target: Platform,
    kind: ToolchainKind,
    host: Platform,
    environment: &Environment,
) -> BuildResult<Toolchain> {
    let compiler = match kind {
        ToolchainKind::Gnu => CompilerKind::Gnu,
        ToolchainKind::Auto | ToolchainKind::Clang => CompilerKind::Clang,
    };

    let ndk_root = environment
        .android_ndk
        .clone()
        .ok_or_else(|| BuildError::sdk_not_found("Android NDK", ANDROID_NDK))?;
    let sdk_root = environment
        .android_sdk
        .clone()
        .ok_or_else(|| BuildError::sdk_not_found("Android SDK", ANDROID_SDK))?;
    debug!("Android SDK path: {}", sdk_root.display());
    debug!("Android NDK path: {}", ndk_root.display());

    let info = abi_info(target.name())
        .ok_or_else(|| BuildError::unsupported_target(target, "unknown Android ABI"))?;
    let host_tag = host_tag(host).ok_or_else(|| {
        BuildError::unsupported_target(
            target,
            format!("the Android NDK does not support {} hosts", host),
        )
    })?;
    let api_level = if target.is_arm64() || target.is_x86_64() {
        21
    } else {
        14
    };

    let sysroot = ndk_root.join("sysroot");
    let system_library_path = ndk_root
        .join("platforms")
        .join(format!("android-{}", api_level))
        .join(format!("arch-{}", info.sysroot_abi));

    let compile_flags = [
        "--sysroot".to_string(),
        path_str(&sysroot),
        "-isystem".to_string(),
        path_str(&sysroot.join("usr").join("include").join(info.header_triple)),
        format!("-D__ANDROID_API__={}", api_level),
    ];
    let ldflags = [
        "--sysroot".to_string(),
        path_str(&system_library_path),
        "-L".to_string(),
        path_str(&system_library_path.join("usr").join("lib")),
        "-Wl,--exclude-libs,libgcc.a".to_string(),
    ];

    let toolchain_root = ndk_root
        .join("toolchains")
        .join(format!("{}-4.9", info.toolchain_root))
        .join("prebuilt")
        .join(host_tag);
    let bin_dir = toolchain_root.join("bin");
    let suffix = if host.is_windows() { ".exe" } else { "" };
    let binutil = |tool: &str| path_str(&bin_dir.join(format!("{}-{}{}", info.toolchain_name, tool, suffix)));

    let mut tc = match compiler {
        CompilerKind::Gnu => {
            let mut tc = Toolchain::base(target, compiler, binutil("gcc"), binutil("g++"));
            tc.ar = Some(binutil("gcc-ar"));
            tc.ranlib = Some(binutil("gcc-ranlib"));
            tc.cflags.extend(compile_flags.iter().cloned());
            tc.cxxflags.extend(compile_flags.iter().cloned());
            tc.ldflags.extend(ldflags);
            tc
        }
        CompilerKind::Clang => {
            let llvm_bin = ndk_root
                .join("toolchains")
                .join("llvm")
                .join("prebuilt")
                .join(host_tag)
                .join("bin");
            let clang = |name: &str| path_str(&llvm_bin.join(format!("{}{}", name, suffix)));
            let mut tc = Toolchain::base(target, compiler, clang("clang"), clang("clang++"));
            tc.ar = Some(binutil("ar"));
            tc.ranlib = Some(binutil("ranlib"));

            let target_flags = [
                "-target".to_string(),
                info.llvm_triple.to_string(),
                "-gcc-toolchain".to_string(),
                path_str(&toolchain_root),
            ];
            let prefixed = |flags: &[String], extra: &[String]| -> Vec<String> {
                target_flags
                    .iter()
                    .chain(flags)
                    .chain(extra)
                    .cloned()
                    .collect()
            };
            tc.cflags = prefixed(tc.cflags.as_slice(), compile_flags.as_slice());
            tc.cxxflags = prefixed(tc.cxxflags.as_slice(), compile_flags.as_slice());
            tc.ldflags = prefixed(tc.ldflags.as_slice(), ldflags.as_slice());
            tc
        }
    };

    let generic = [
        "-g",
        "-fPIC",
        "-DANDROID",
        "-ffunction-sections",
        "-funwind-tables",
        "-fstack-protector-strong",
        "-no-canonical-prefixes",
    ];
    tc.cflags.extend(strings(generic));
    tc.cxxflags.extend(strings(generic));
    tc.ldflags.extend(strings([
        "-Wl,--build-id",
        "-Wl,--warn-shared-textrel",
        "-Wl,--fatal-warnings",
        "-pie",
        "-Wl,--gc-sections",
        "-Wl,-z,nocopyreloc",
    ]));
    if compiler == CompilerKind::Clang {
        tc.cflags.push("-fno-limit-debug-info".to_string());
        tc.cxxflags.push("-fno-limit-debug-info".to_string());
    }

    let mut mflags: Vec<String> = Vec::new();
    if target == "arm-android-v7a" {
        mflags.extend(strings(["-march=armv7-a", "-mfloat-abi=softfp", "-mfpu=vfpv3-d16"]));
        if compiler == CompilerKind::Clang {
            mflags.push("-fno-integrated-as".to_string());
        }
        tc.ldflags.push("-Wl,--fix-cortex-a8".to_string());
    } else if target == "x86-android" {
        mflags.push("-mstackrealign".to_string());
    }
    tc.cflags.extend(mflags.iter().cloned());
    tc.cxxflags.extend(mflags);

    // Static libc++
    let stl_root = ndk_root.join("sources").join("cxx-stl");
    let stl_libs = stl_root.join("llvm-libc++").join("libs").join(info.abi);
    if target.is_arm() {
        tc.ldflags.push("-Wl,--exclude-libs,libunwind.a".to_string());
    }
    tc.ldflags.extend(["-L".to_string(), path_str(&stl_libs)]);
    for include in [
        stl_root.join("llvm-libc++").join("include"),
        ndk_root.join("sources").join("android").join("support").join("include"),
        stl_root.join("llvm-libc++abi").join("include"),
    ] {
        tc.cxxflags.extend(["-I".to_string(), path_str(&include)]);
    }
    tc.ldlibs.push(format!("\"{}\"", path_str(&stl_libs.join("libc++.a"))));

    tc.family = ToolchainFamily::Android(AndroidSdk {
        sdk_root,
        ndk_root,
        api_level,
    });
    Ok(tc)
}

impl AndroidSdk {
    pub(super) fn write_variables(&self, ninja: &mut NinjaWriter) {
        ninja.variable("adb", path_str(&self.adb()));
    }

    /// Android Debug Bridge executable
    pub fn adb(&self) -> PathBuf {
        self.sdk_root.join("platform-tools").join("adb")
    }

    pub fn ndk_root(&self) -> &Path {
        &self.ndk_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env() -> Environment {
        Environment {
            android_ndk: Some(PathBuf::from("/ndk")),
            android_sdk: Some(PathBuf::from("/sdk")),
            ..Default::default()
        }
    }

    fn host() -> Platform {
        Platform::new("x86_64-linux-gnu").unwrap()
    }

    #[test]
    fn test_android_clang_arm64() {
        let target = Platform::new("arm64-android").unwrap();
        let tc = toolchain(target, ToolchainKind::Auto, host(), &env()).unwrap();
        assert_eq!(tc.compiler, CompilerKind::Clang);
        assert_eq!(tc.cc, "/ndk/toolchains/llvm/prebuilt/linux-x86_64/bin/clang");
        assert_eq!(
            tc.ar.as_deref(),
            Some("/ndk/toolchains/aarch64-linux-android-4.9/prebuilt/linux-x86_64/bin/aarch64-linux-android-ar")
        );
        assert_eq!(
            &tc.cflags[..4],
            &[
                "-target",
                "aarch64-none-linux-android",
                "-gcc-toolchain",
                "/ndk/toolchains/aarch64-linux-android-4.9/prebuilt/linux-x86_64",
            ]
        );
        assert!(tc.cflags.contains(&"-D__ANDROID_API__=21".to_string()));
        assert!(tc.cflags.contains(&"-fno-limit-debug-info".to_string()));
        assert!(tc
            .ldflags
            .contains(&"/ndk/platforms/android-21/arch-arm64".to_string()));
        assert_eq!(
            tc.ldlibs,
            vec!["\"/ndk/sources/cxx-stl/llvm-libc++/libs/arm64-v8a/libc++.a\""]
        );
    }

    #[test]
    fn test_android_gnu_armv7() {
        let target = Platform::new("arm-android").unwrap();
        let tc = toolchain(target, ToolchainKind::Gnu, host(), &env()).unwrap();
        assert_eq!(
            tc.cc,
            "/ndk/toolchains/arm-linux-androideabi-4.9/prebuilt/linux-x86_64/bin/arm-linux-androideabi-gcc"
        );
        assert!(tc.cflags.contains(&"-D__ANDROID_API__=14".to_string()));
        assert!(tc.cflags.contains(&"-mfpu=vfpv3-d16".to_string()));
        assert!(!tc.cflags.contains(&"-fno-integrated-as".to_string()));
        assert!(tc.ldflags.contains(&"-Wl,--fix-cortex-a8".to_string()));
        assert!(tc.ldflags.contains(&"-Wl,--exclude-libs,libunwind.a".to_string()));
    }

    #[test]
    fn test_android_x86_stack_realign() {
        let target = Platform::new("x86-android").unwrap();
        let tc = toolchain(target, ToolchainKind::Auto, host(), &env()).unwrap();
        assert!(tc.cxxflags.contains(&"-mstackrealign".to_string()));
        assert!(!tc.ldflags.contains(&"-Wl,--exclude-libs,libunwind.a".to_string()));
    }

    #[test]
    fn test_android_requires_ndk_and_sdk() {
        let target = Platform::new("x86_64-android").unwrap();
        let mut environment = env();
        environment.android_sdk = None;
        let err = toolchain(target, ToolchainKind::Auto, host(), &environment).unwrap_err();
        assert!(matches!(err, BuildError::SdkNotFound { variable: "ANDROID_SDK", .. }));
    }

    #[test]
    fn test_android_variables_and_run_rule() {
        let target = Platform::new("x86_64-android").unwrap();
        let tc = toolchain(target, ToolchainKind::Auto, host(), &env()).unwrap();
        let mut ninja = NinjaWriter::new();
        tc.write_variables(&mut ninja);
        tc.write_rules(&mut ninja);
        let text = ninja.finish();
        assert!(text.contains("adb = /sdk/platform-tools/adb\n"));
        assert!(text.contains("stdlibs = \"/ndk/sources/cxx-stl/llvm-libc++/libs/x86_64/libc++.a\"\n"));
        assert!(text.contains("$adb push $in /data/local/tmp/$path"));
        assert!(!text.contains("rule library"));
    }
}
