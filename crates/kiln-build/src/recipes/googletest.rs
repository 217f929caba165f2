use super::Recipe;
use crate::builds::{Build, ConfigureArgs};
use crate::context::Context;
use crate::error::BuildResult;
use crate::module::DEFAULT_MODULE;
use crate::state::Options;
use kiln_package::Project;
use std::path::Path;
use std::rc::Rc;

const REPOSITORY: &str = "https://github.com/google/googletest.git";
const RELEASE: &str = "release-1.10.0";

/// Google Test framework
///
/// The `default` module links `gtest_main`; the `core` module leaves `main`
/// to the test program.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleTest;

impl GoogleTest {
    pub fn manifest() -> Project {
        Project {
            name: "googletest".to_string(),
            title: Some("Google Test framework".to_string()),
            license: "New BSD".to_string(),
            deps: Vec::new(),
        }
    }
}

impl Recipe for GoogleTest {
    fn name(&self) -> &str {
        "googletest"
    }

    fn setup(&self, context: &Context, dir: &Path) -> BuildResult<()> {
        context.fetcher().clone_repository(REPOSITORY, dir, Some(RELEASE))?;
        Self::manifest().save(dir)?;
        Ok(())
    }

    fn configure(&self, args: &ConfigureArgs, context: &Rc<Context>, root_dir: &Path) -> BuildResult<Build> {
        let mut build = Build::from_args(args, context, Some(root_dir))?;
        {
            let mut scope = build.options(
                Options::new()
                    .source_dir("googletest/src")
                    .include_dirs(["googletest/include", "googletest"]),
            )?;
            let gtest = scope.cxx("gtest-all.cc")?;

            {
                let mut default = scope.module(DEFAULT_MODULE)?;
                default.export_cpath("googletest/include", true)?;
                let gtest_main = default.cxx("gtest_main.cc")?;
                default.static_library("googletest", [Rc::clone(&gtest), gtest_main])?;
            }

            let mut core = scope.module("core")?;
            core.export_cpath("googletest/include", true)?;
            core.static_library("googletest-core", [gtest])?;
        }
        Ok(build)
    }
}
