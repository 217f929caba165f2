use super::{BuildNode, LinkLibrary, Subdir, BUILD_NINJA};
use crate::ninja::{Edge, NinjaWriter};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Objects and libraries linked, archived or collected into one artifact
#[derive(Debug)]
pub struct CollectionResult {
    subdir: Subdir,
    name: String,
    filename: String,
    inputs: Vec<BuildNode>,
    libraries: Vec<LinkLibrary>,
    rule: String,
    variables: BTreeMap<String, String>,
    generated: Cell<bool>,
}

impl CollectionResult {
    /// New collection whose file name defaults to its logical name
    pub fn new(subdir: Subdir, name: impl Into<String>, rule: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            subdir,
            filename: name.clone(),
            name,
            inputs: Vec::new(),
            libraries: Vec::new(),
            rule: rule.into(),
            variables: BTreeMap::new(),
            generated: Cell::new(false),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_input(mut self, input: impl Into<BuildNode>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn with_inputs<I>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = BuildNode>,
    {
        self.inputs.extend(inputs);
        self
    }

    pub fn with_libraries<I>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = LinkLibrary>,
    {
        self.libraries.extend(libraries);
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn subdir(&self) -> Subdir {
        self.subdir
    }

    /// Logical name, used for phony targets
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn inputs(&self) -> &[BuildNode] {
        &self.inputs
    }

    pub fn libraries(&self) -> &[LinkLibrary] {
        &self.libraries
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Path relative to the root, e.g. `lib/libfoo.a`
    pub fn relative_path(&self) -> PathBuf {
        Path::new(self.subdir.as_str()).join(&self.filename)
    }

    pub fn target_path(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }

    pub fn is_generated(&self) -> bool {
        self.generated.get()
    }

    /// Generate all inputs and libraries, then write this collection's edge
    /// unless already written; returns the target path
    pub fn generate(&self, ninja: &mut NinjaWriter, root: &Path) -> PathBuf {
        let target = self.target_path(root);
        if self.generated.get() {
            return target;
        }

        let inputs: Vec<String> = self
            .inputs
            .iter()
            .map(|input| input.generate(ninja, root).to_string_lossy().into_owned())
            .collect();

        let mut ldlibs = Vec::new();
        let mut implicit = Vec::new();
        for library in &self.libraries {
            match library {
                LinkLibrary::System(name) => ldlibs.push(format!("-l{}", name)),
                LinkLibrary::Artifact(library) => {
                    let path = library.generate(ninja, root).to_string_lossy().into_owned();
                    ldlibs.push(path.clone());
                    implicit.push(path);
                }
            }
        }

        let mut edge = Edge::new(target.to_string_lossy(), self.rule.as_str())
            .with_inputs(inputs)
            .with_implicit(implicit)
            .with_order_only(BUILD_NINJA)
            .with_variable("path", self.relative_path().to_string_lossy())
            .with_variables(&self.variables);
        if !ldlibs.is_empty() {
            edge = edge.with_variable("ldlibs", ldlibs.join(" "));
        }
        ninja.build(&edge);

        self.generated.set(true);
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::results::CompilationResult;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn object(source: &str) -> Rc<CompilationResult> {
        Rc::new(CompilationResult::new(
            source,
            Platform::new("x86_64-linux-gnu").unwrap(),
            "cc",
        ))
    }

    #[test]
    fn test_target_path() {
        let lib = CollectionResult::new(Subdir::Lib, "m", "archive").with_filename("libm.a");
        assert_eq!(lib.target_path(Path::new("/p")), PathBuf::from("/p/lib/libm.a"));
        assert_eq!(lib.name(), "m");
    }

    #[test]
    fn test_library_is_implicit_dependency() {
        let root = Path::new("/p");
        let lib = Rc::new(
            CollectionResult::new(Subdir::Lib, "util", "archive")
                .with_filename("libutil.a")
                .with_input(object("/p/src/util.c")),
        );
        let exe = CollectionResult::new(Subdir::Bin, "app", "executable")
            .with_input(object("/p/src/main.c"))
            .with_libraries([LinkLibrary::from(lib.clone()), LinkLibrary::System("m".to_string())])
            .with_variable("linker", "$cc");

        let mut ninja = NinjaWriter::new();
        let target = exe.generate(&mut ninja, root);
        assert_eq!(target, PathBuf::from("/p/bin/app"));

        let text = ninja.finish();
        let lib_edge = text.find("build /p/lib/libutil.a: archive").unwrap();
        let exe_edge = text.find("build /p/bin/app: executable").unwrap();
        assert!(lib_edge < exe_edge);
        assert!(text.contains(
            "build /p/bin/app: executable /p/build/src/main.c.o | /p/lib/libutil.a || build.ninja\n  path = bin/app\n  linker = $cc\n  ldlibs = /p/lib/libutil.a -lm\n"
        ));
    }

    #[test]
    fn test_shared_object_generated_once() {
        let root = Path::new("/p");
        let shared = object("/p/src/common.c");
        let a = CollectionResult::new(Subdir::Bin, "a", "executable")
            .with_input(shared.clone())
            .with_input(object("/p/src/a.c"));
        let b = CollectionResult::new(Subdir::Bin, "b", "executable")
            .with_input(shared.clone())
            .with_input(object("/p/src/b.c"));

        let mut ninja = NinjaWriter::new();
        a.generate(&mut ninja, root);
        b.generate(&mut ninja, root);
        assert_eq!(a.generate(&mut ninja, root), PathBuf::from("/p/bin/a"));

        let text = ninja.finish();
        assert_eq!(text.matches("build /p/build/src/common.c.o:").count(), 1);
        assert_eq!(text.matches("build /p/bin/a:").count(), 1);
    }
}
