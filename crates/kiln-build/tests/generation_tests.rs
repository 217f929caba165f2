//! Integration tests for build file generation
//!
//! Each test lays out a small C project in a temporary directory, declares
//! its artifacts the way a configuration script would and inspects the
//! rendered `build.ninja`.

use kiln_build::isa::arm;
use kiln_build::{
    Build, BuildError, BuildNode, BuildResult, ConfigureArgs, ConfigureCommand, Context, DepRef, EmscriptenPluginOptions,
    Flavor, MemorySize, Options, Platform, ToolchainKind,
};
use kiln_config::Environment;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

const MANIFEST: &str = "name = \"fp16\"\nlicense = \"MIT\"\n";

/// Create a project with a manifest and the given (empty) source files
fn create_project(files: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("kiln.toml"), MANIFEST).unwrap();
    for file in files {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }
    dir
}

fn linux() -> Platform {
    Platform::new("x86_64-linux-gnu").unwrap()
}

fn make_context(root: &Path, environment: Environment) -> Rc<Context> {
    Context::builder(root)
        .with_host(linux())
        .with_environment(environment)
        .with_configure_command(ConfigureCommand::new("/usr/bin/kiln", ["setup"]))
        .build()
        .unwrap()
}

fn make_build(root: &Path, target: &str) -> Build {
    let environment = Environment {
        nacl_sdk_root: Some(PathBuf::from("/opt/nacl_sdk")),
        emscripten_root: Some(PathBuf::from("/opt/emsdk")),
        ..Environment::default()
    };
    let context = make_context(root, environment);
    let args = ConfigureArgs::new(Platform::new(target).unwrap(), ToolchainKind::Auto);
    Build::from_args(&args, &context, None).unwrap()
}

fn root_str(build: &Build) -> String {
    build.root_dir().to_string_lossy().into_owned()
}

/// Number of lines starting with `prefix`
fn count_lines(content: &str, prefix: &str) -> usize {
    content.lines().filter(|line| line.starts_with(prefix)).count()
}

/// Configure the fp16 project: a library, a test, a smoke test and a benchmark
fn configure_fp16(build: &mut Build) -> BuildResult<()> {
    build.export_cpath("include", true)?;
    let library = {
        let mut scope = build.options(Options::new().source_dir("src"))?;
        let object = scope.cc("fp16.c")?;
        let library = scope.static_library("fp16", [object])?;
        library
    };

    let mut scope = build.options(Options::new().source_dir("test").deps([DepRef::system("m")?]))?;
    let ieee = scope.cxx("ieee.cc")?;
    scope.unittest("ieee", [BuildNode::from(ieee), BuildNode::from(Rc::clone(&library))])?;
    let smoke = scope.cxx("smoke.cc")?;
    scope.smoketest("smoke", [BuildNode::from(smoke), BuildNode::from(Rc::clone(&library))])?;
    let bench = scope.cxx("bench.cc")?;
    scope.benchmark("convert", [BuildNode::from(bench), BuildNode::from(library)])?;
    Ok(())
}

const FP16_FILES: &[&str] = &[
    "include/fp16.h",
    "src/fp16.c",
    "test/ieee.cc",
    "test/smoke.cc",
    "test/bench.cc",
];

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_render_header_and_configure_edge() {
    let temp = create_project(FP16_FILES);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    configure_fp16(&mut build).unwrap();
    let root = root_str(&build);
    let content = build.render().unwrap();

    assert!(content.starts_with("ninja_required_version = 1.7\n"));
    assert!(content.contains(&format!("builddir = {}/build\n", root)));
    assert!(content.contains(&format!("root = {}\n", root)));
    assert!(content.contains("cc = gcc\n"));
    assert!(content.contains("cxx = g++\n"));
    assert!(content.contains("rule configure\n  command = /usr/bin/kiln $args\n"));
    assert!(content.contains("  generator = 1\n"));
    assert!(content.contains(&format!(
        "build build.ninja: configure /usr/bin/kiln | {}/kiln.toml\n  args = setup\n",
        root
    )));
    assert!(content.contains(&format!(
        "build clean: clean\n  config = {}/build.ninja\n",
        root
    )));
}

#[test]
fn test_render_artifacts_and_aliases() {
    let temp = create_project(FP16_FILES);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    configure_fp16(&mut build).unwrap();
    let root = root_str(&build);
    let content = build.render().unwrap();

    assert!(content.contains(&format!(
        "build {root}/build/src/fp16.c.o: cc {root}/src/fp16.c || build.ninja\n"
    )));
    assert!(content.contains(&format!(
        "build {root}/lib/libfp16.a: archive {root}/build/src/fp16.c.o || build.ninja\n"
    )));
    assert!(content.contains(&format!("build fp16: phony {root}/lib/libfp16.a\n")));
    assert!(content.contains(&format!("build ieee: run {root}/bin/ieee\n")));
    assert!(content.contains("  args = --gtest_color=yes\n"));
    assert!(content.contains(&format!("build convert: run {root}/bin/convert\n")));
    assert!(content.contains("  args = --benchmark_color=true\n"));
    assert!(content.contains("  ldlibs = -lm\n"));

    assert!(content.contains("build bench: phony convert\n"));
    assert!(content.contains("build smoketest: phony smoke\n"));
    assert!(content.contains("build test: phony smoke ieee\n"));
    assert_eq!(count_lines(&content, "default "), 1);
}

#[test]
fn test_include_flags_on_objects() {
    let temp = create_project(FP16_FILES);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    configure_fp16(&mut build).unwrap();
    let root = root_str(&build);
    let content = build.render().unwrap();

    assert!(content.contains(&format!("  includes = $includes -I{}/include\n", root)));
}

#[test]
fn test_shared_object_written_once() {
    let temp = create_project(&["src/fp16.c"]);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    {
        let mut scope = build.options(Options::new().source_dir("src")).unwrap();
        let object = scope.cc("fp16.c").unwrap();
        scope.static_library("fp16", [Rc::clone(&object)]).unwrap();
        scope.dynamic_library("fp16-shared", [object]).unwrap();
    }
    let root = root_str(&build);
    let content = build.render().unwrap();

    assert_eq!(count_lines(&content, &format!("build {}/build/src/fp16.c.o:", root)), 1);
    assert!(content.contains(&format!("build {root}/lib/libfp16-shared.so: library")));
}

#[test]
fn test_generate_is_deterministic() {
    let temp = create_project(FP16_FILES);

    let mut first = make_build(temp.path(), "x86_64-linux-gnu");
    configure_fp16(&mut first).unwrap();
    let path = first.generate().unwrap();
    let first_content = fs::read_to_string(&path).unwrap();

    let mut second = make_build(temp.path(), "x86_64-linux-gnu");
    configure_fp16(&mut second).unwrap();
    second.generate().unwrap();

    assert_eq!(path, temp.path().join("build.ninja"));
    assert_eq!(fs::read_to_string(&path).unwrap(), first_content);
}

// ============================================================================
// Modules
// ============================================================================

#[test]
fn test_module_scope_restores_default() {
    let temp = create_project(&["src/fp16.c", "src/bitcasts.c"]);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    {
        let mut scope = build.options(Options::new().source_dir("src")).unwrap();
        let object = scope.cc("fp16.c").unwrap();
        scope.static_library("fp16", [object]).unwrap();
        {
            let mut bitcasts = scope.module("bitcasts").unwrap();
            let object = bitcasts.cc("bitcasts.c").unwrap();
            bitcasts.static_library("bitcasts", [object]).unwrap();
        }
        assert_eq!(scope.modules().active().name(), "default");
    }

    let modules = build.modules();
    assert_eq!(modules.len(), 2);
    assert!(modules.default_module().library("fp16").is_some());
    assert!(modules.get("bitcasts").unwrap().library("bitcasts").is_some());
    assert!(modules.default_module().library("bitcasts").is_none());
}

#[test]
fn test_sealed_collection_rejects_new_modules() {
    let temp = create_project(&[]);
    let build = make_build(temp.path(), "x86_64-linux-gnu");
    let mut modules = build.into_modules();
    modules.get_or_create("extras").unwrap();
    modules.seal();

    assert!(matches!(
        modules.get_or_create("tools"),
        Err(BuildError::ModuleNotFound { .. })
    ));
    assert!(matches!(
        modules.get_or_create("extras"),
        Err(BuildError::SealedModule { .. })
    ));
    assert!(modules.get("extras").is_ok());
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_options_restored_after_error() {
    let temp = create_project(&["src/fp16.c"]);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    let root = build.root_dir().to_path_buf();

    let result = (|| -> BuildResult<()> {
        let scope = build.options(Options::new().source_dir("src").macros(["FP16_FAST"]))?;
        scope.cc("missing.c")?;
        Ok(())
    })();

    assert!(matches!(result, Err(BuildError::InvalidPath { .. })));
    assert_eq!(build.state().source_dir(), root.as_path());
    assert!(build.state().macros().is_empty());
}

#[test]
fn test_invalid_options_leave_state_unchanged() {
    let temp = create_project(&["src/fp16.c"]);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    let root = build.root_dir().to_path_buf();

    let result = build.options(Options::new().source_dir("src").include_dirs(["missing"]));
    assert!(result.is_err());
    drop(result);
    assert_eq!(build.state().source_dir(), root.as_path());

    let result = build.options(Options::new().libs(["m"]).extra_libs(["dl"]));
    assert!(matches!(result, Err(BuildError::ConflictingOptions { .. })));
}

#[test]
fn test_isa_and_macro_variables() {
    let temp = create_project(&["src/fp16.c"]);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    {
        let scope = build
            .options(
                Options::new()
                    .source_dir("src")
                    .isa(arm::neon().merge(&arm::fma()).unwrap())
                    .macro_value("FP16_VERSION", "2"),
            )
            .unwrap();
        let object = scope.cc("fp16.c").unwrap();
        assert_eq!(
            object.variables().get("optflags").map(String::as_str),
            Some("$optflags -march=armv7-a -mfpu=neon-vfpv4 -mfp16-format=ieee")
        );
        assert_eq!(
            object.variables().get("macro").map(String::as_str),
            Some("-DFP16_VERSION=2")
        );
    }
    let object = build.options(Options::new().source_dir("src")).unwrap().cc("fp16.c").unwrap();
    assert!(object.variables().get("optflags").is_none());
}

#[test]
fn test_state_changes_persist() {
    let temp = create_project(&["src/fp16.c", "src/bitcasts.c"]);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    build.state_mut().set_source_dir("src").unwrap();
    build.state_mut().add_macro("FP16_USE_NATIVE_CONVERSION").unwrap();

    let first = build.cc("fp16.c").unwrap();
    let second = build.cc("bitcasts.c").unwrap();
    for object in [first, second] {
        assert_eq!(
            object.variables().get("macro").map(String::as_str),
            Some("-DFP16_USE_NATIVE_CONVERSION=1")
        );
    }
}

// ============================================================================
// Flavors
// ============================================================================

#[test]
fn test_pnacl_executable_chain() {
    let temp = create_project(&["src/hello.c"]);
    let mut build = make_build(temp.path(), "pnacl");
    assert_eq!(build.flavor(), Flavor::PNaCl);
    {
        let mut scope = build.options(Options::new().source_dir("src")).unwrap();
        let object = scope.cc("hello.c").unwrap();
        scope.executable("hello", [object]).unwrap();
    }
    let root = root_str(&build);
    let content = build.render().unwrap();

    assert!(content.contains(&format!(
        "build {root}/build/hello.bc: executable {root}/build/src/hello.c.bc || build.ninja\n"
    )));
    assert!(content.contains(&format!(
        "build {root}/build/hello.pexe: finalize {root}/build/hello.bc || build.ninja\n"
    )));
    assert!(content.contains(&format!(
        "build {root}/bin/hello.x86_64.nexe: translate {root}/build/hello.pexe || build.ninja\n"
    )));
    assert!(content.contains(&format!("build hello: phony {root}/bin/hello.x86_64.nexe\n")));
}

#[test]
fn test_emscripten_executable_and_plugin() {
    let temp = create_project(&["src/hello.c"]);
    let mut build = make_build(temp.path(), "asmjs");
    assert_eq!(build.flavor(), Flavor::Emscripten);
    {
        let mut scope = build.options(Options::new().source_dir("src")).unwrap();
        let object = scope.cc("hello.c").unwrap();
        scope.executable("hello", [Rc::clone(&object)]).unwrap();
        scope
            .emscripten_plugin(
                "hello-plugin",
                [object],
                EmscriptenPluginOptions::new().memory_size(MemorySize::All),
            )
            .unwrap();
    }
    let root = root_str(&build);
    let content = build.render().unwrap();

    assert!(content.contains("cc = /opt/emsdk/emcc\n"));
    assert!(content.contains(&format!("build {root}/bin/hello.js: executable {root}/build/src/hello.c.bc")));
    assert!(content.contains("  emflags = $emflags --memory-init-file 0 -s PRECISE_F32=2\n"));
    assert!(content.contains(&format!("build {root}/out/hello-plugin.js: executable")));
    assert!(content.contains("-s ALLOW_MEMORY_GROWTH=1\n"));
}

#[test]
fn test_unix_rejects_plugins() {
    let temp = create_project(&["src/hello.c"]);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    let mut scope = build.options(Options::new().source_dir("src")).unwrap();
    let object = scope.cc("hello.c").unwrap();

    let err = scope.plugin("hello", [Rc::clone(&object)]).unwrap_err();
    assert_eq!(err.to_string(), "Plugin modules not supported on x86_64-linux-gnu");
    assert!(scope
        .emscripten_plugin("hello", [object], EmscriptenPluginOptions::new())
        .is_err());
}

#[test]
fn test_peachpy_requires_x86_64() {
    let temp = create_project(&["src/kernel.py"]);
    let mut build = make_build(temp.path(), "asmjs");
    let mut scope = build.options(Options::new().source_dir("src")).unwrap();
    assert!(scope.peachpy("kernel.py").is_err());
}

#[test]
fn test_peachpy_object_and_tool_rules() {
    let temp = create_project(&["src/kernel.py"]);
    let mut build = make_build(temp.path(), "x86_64-linux-gnu");
    {
        let mut scope = build.options(Options::new().source_dir("src")).unwrap();
        let object = scope.peachpy("kernel.py").unwrap();
        scope.static_library("kernels", [object]).unwrap();
    }
    assert_eq!(build.tools().count(), 1);
    let content = build.render().unwrap();
    assert!(content.contains("rule peachpy\n"));
    assert!(content.contains(": peachpy "));
}
