use super::Recipe;
use crate::builds::{Build, ConfigureArgs};
use crate::context::Context;
use crate::error::BuildResult;
use crate::state::Options;
use kiln_package::Project;
use std::path::Path;
use std::rc::Rc;

const REPOSITORY: &str = "https://github.com/google/benchmark.git";

const SOURCES: &[&str] = &[
    "benchmark.cc",
    "benchmark_api_internal.cc",
    "benchmark_main.cc",
    "benchmark_register.cc",
    "benchmark_runner.cc",
    "colorprint.cc",
    "commandlineflags.cc",
    "complexity.cc",
    "console_reporter.cc",
    "counter.cc",
    "csv_reporter.cc",
    "json_reporter.cc",
    "reporter.cc",
    "sleep.cc",
    "statistics.cc",
    "string_util.cc",
    "sysinfo.cc",
    "timers.cc",
];

/// Google micro-benchmark framework
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleBenchmark;

impl GoogleBenchmark {
    pub fn manifest() -> Project {
        Project {
            name: "googlebenchmark".to_string(),
            title: Some("Google micro-Benchmark framework".to_string()),
            license: "Apache 2.0".to_string(),
            deps: Vec::new(),
        }
    }

    /// Sources compiled into the library, relative to `src`
    pub fn sources() -> &'static [&'static str] {
        SOURCES
    }
}

impl Recipe for GoogleBenchmark {
    fn name(&self) -> &str {
        "googlebenchmark"
    }

    fn setup(&self, context: &Context, dir: &Path) -> BuildResult<()> {
        context.fetcher().clone_repository(REPOSITORY, dir, None)?;
        Self::manifest().save(dir)?;
        Ok(())
    }

    fn configure(&self, args: &ConfigureArgs, context: &Rc<Context>, root_dir: &Path) -> BuildResult<Build> {
        let mut build = Build::from_args(args, context, Some(root_dir))?;
        build.export_cpath("include", true)?;
        {
            let mut scope = build.options(
                Options::new()
                    .source_dir("src")
                    .macros(["HAVE_POSIX_REGEX", "NDEBUG"])
                    .extra_include_dirs(["src"]),
            )?;
            let objects = SOURCES
                .iter()
                .map(|source| scope.cxx(source))
                .collect::<BuildResult<Vec<_>>>()?;
            scope.static_library("googlebenchmark", objects)?;
        }
        Ok(build)
    }
}
