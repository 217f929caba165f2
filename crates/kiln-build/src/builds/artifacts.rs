//! Artifact declarations
//!
//! Every declared artifact is added to the active module. Libraries are the
//! same for all flavors; executables and plugins differ per flavor.

use super::emscripten::{executable_emflags, EmscriptenPluginOptions};
use super::{Build, Flavor};
use crate::error::{BuildError, BuildResult};
use crate::results::{BuildNode, CollectionResult, Subdir};
use std::rc::Rc;

fn nodes<I>(inputs: I) -> Vec<BuildNode>
where
    I: IntoIterator,
    I::Item: Into<BuildNode>,
{
    inputs.into_iter().map(Into::into).collect()
}

impl Build {
    /// Archive objects into a static library
    pub fn static_library<I>(&mut self, name: &str, inputs: I) -> BuildResult<Rc<CollectionResult>>
    where
        I: IntoIterator,
        I::Item: Into<BuildNode>,
    {
        let filename = self
            .target()
            .static_library_filename(name, false)
            .ok_or_else(|| BuildError::unsupported("Static libraries", self.target()))?;
        let library = Rc::new(
            CollectionResult::new(Subdir::Lib, name, "archive")
                .with_filename(filename)
                .with_inputs(nodes(inputs))
                .with_libraries(self.state.deps_libraries()),
        );
        self.modules.active_mut().libraries.push(Rc::clone(&library));
        Ok(library)
    }

    /// Link objects into a shared library
    pub fn dynamic_library<I>(&mut self, name: &str, inputs: I) -> BuildResult<Rc<CollectionResult>>
    where
        I: IntoIterator,
        I::Item: Into<BuildNode>,
    {
        if self.flavor != Flavor::Unix || !self.toolchain.supports_shared_libraries() {
            return Err(BuildError::unsupported(
                "Dynamically loaded or shared libraries",
                self.target(),
            ));
        }
        let library = Rc::new(
            CollectionResult::new(Subdir::Lib, name, "library")
                .with_filename(self.target().dynamic_library_filename(name))
                .with_inputs(nodes(inputs))
                .with_libraries(self.state.link_libraries())
                .with_variable("linker", "$cxx"),
        );
        self.modules.active_mut().libraries.push(Rc::clone(&library));
        Ok(library)
    }

    /// Link a plugin loaded by a host environment: a Native Client module or
    /// an Emscripten script with default settings
    pub fn plugin<I>(&mut self, name: &str, inputs: I) -> BuildResult<Rc<CollectionResult>>
    where
        I: IntoIterator,
        I::Item: Into<BuildNode>,
    {
        let inputs = nodes(inputs);
        let plugin = match self.flavor {
            Flavor::Unix if self.target().is_nacl() => CollectionResult::new(Subdir::Out, name, "executable")
                .with_filename(format!("{}{}", name, self.target().executable_ext()))
                .with_inputs(inputs)
                .with_libraries(self.state.link_libraries())
                .with_variable("linker", "$cxx"),
            Flavor::Unix => return Err(BuildError::unsupported("Plugin modules", self.target())),
            Flavor::PNaCl => {
                let linked = self.link_bitcode(name, inputs);
                CollectionResult::new(Subdir::Out, name, "finalize")
                    .with_filename(format!("{}{}", name, self.target().executable_ext()))
                    .with_input(linked)
            }
            Flavor::Emscripten => {
                return self.emscripten_plugin(name, inputs, EmscriptenPluginOptions::default())
            }
        };
        let plugin = Rc::new(plugin);
        self.modules.active_mut().plugins.push(Rc::clone(&plugin));
        Ok(plugin)
    }

    /// Link an Emscripten plugin with explicit settings
    pub fn emscripten_plugin<I>(
        &mut self,
        name: &str,
        inputs: I,
        options: EmscriptenPluginOptions,
    ) -> BuildResult<Rc<CollectionResult>>
    where
        I: IntoIterator,
        I::Item: Into<BuildNode>,
    {
        if self.flavor != Flavor::Emscripten {
            return Err(BuildError::unsupported("Emscripten plugins", self.target()));
        }
        let emflags = options.emflags(self.target(), self.state.source_dir())?;
        let plugin = Rc::new(
            CollectionResult::new(Subdir::Out, name, "executable")
                .with_filename(format!("{}.js", name))
                .with_inputs(nodes(inputs))
                .with_libraries(self.state.link_libraries())
                .with_variable("linker", "$cxx")
                .with_variable("emflags", emflags),
        );
        self.modules.active_mut().plugins.push(Rc::clone(&plugin));
        Ok(plugin)
    }

    pub fn executable<I>(&mut self, name: &str, inputs: I) -> BuildResult<Rc<CollectionResult>>
    where
        I: IntoIterator,
        I::Item: Into<BuildNode>,
    {
        let executable = self.link_executable(name, nodes(inputs));
        self.modules.active_mut().executables.push(Rc::clone(&executable));
        Ok(executable)
    }

    /// Unit test, run by the `test` target
    pub fn unittest<I>(&mut self, name: &str, inputs: I) -> BuildResult<Rc<CollectionResult>>
    where
        I: IntoIterator,
        I::Item: Into<BuildNode>,
    {
        let test = self.link_executable(name, nodes(inputs));
        self.modules.active_mut().unittests.push(Rc::clone(&test));
        Ok(test)
    }

    /// Smoke test, run by the `smoketest` and `test` targets
    pub fn smoketest<I>(&mut self, name: &str, inputs: I) -> BuildResult<Rc<CollectionResult>>
    where
        I: IntoIterator,
        I::Item: Into<BuildNode>,
    {
        let test = self.link_executable(name, nodes(inputs));
        self.modules.active_mut().smoketests.push(Rc::clone(&test));
        Ok(test)
    }

    /// Benchmark, run by the `bench` target
    pub fn benchmark<I>(&mut self, name: &str, inputs: I) -> BuildResult<Rc<CollectionResult>>
    where
        I: IntoIterator,
        I::Item: Into<BuildNode>,
    {
        let benchmark = self.link_executable(name, nodes(inputs));
        self.modules.active_mut().benchmarks.push(Rc::clone(&benchmark));
        Ok(benchmark)
    }

    fn link_executable(&self, name: &str, inputs: Vec<BuildNode>) -> Rc<CollectionResult> {
        let target = self.target();
        let executable = match self.flavor {
            Flavor::Unix => CollectionResult::new(Subdir::Bin, name, "executable")
                .with_filename(format!("{}{}", name, target.executable_ext()))
                .with_inputs(inputs)
                .with_libraries(self.state.link_libraries())
                .with_variable("linker", "$cxx"),
            Flavor::PNaCl => {
                let linked = self.link_bitcode(name, inputs);
                let portable = CollectionResult::new(Subdir::Build, name, "finalize")
                    .with_filename(format!("{}{}", name, target.executable_ext()))
                    .with_input(linked);
                CollectionResult::new(Subdir::Bin, name, "translate")
                    .with_filename(format!("{}.x86_64.nexe", name))
                    .with_input(Rc::new(portable))
            }
            Flavor::Emscripten => CollectionResult::new(Subdir::Bin, name, "executable")
                .with_filename(format!("{}.js", name))
                .with_inputs(inputs)
                .with_libraries(self.state.link_libraries())
                .with_variable("linker", "$cxx")
                .with_variable("emflags", executable_emflags(target)),
        };
        Rc::new(executable)
    }

    /// Link PNaCl objects into one unfinalized bitcode module
    fn link_bitcode(&self, name: &str, inputs: Vec<BuildNode>) -> Rc<CollectionResult> {
        let ext = self.target().object_ext(false).unwrap_or(".bc");
        Rc::new(
            CollectionResult::new(Subdir::Build, name, "executable")
                .with_filename(format!("{}{}", name, ext))
                .with_inputs(inputs)
                .with_libraries(self.state.link_libraries())
                .with_variable("linker", "$cxx"),
        )
    }
}
