use super::{relative_to, BUILD_NINJA};
use crate::ninja::{Edge, NinjaWriter};
use crate::platform::Platform;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One source file compiled into one object file
#[derive(Debug)]
pub struct CompilationResult {
    source: PathBuf,
    target: Platform,
    rule: String,
    variables: BTreeMap<String, String>,
    generated: Cell<bool>,
}

impl CompilationResult {
    pub fn new(source: impl Into<PathBuf>, target: Platform, rule: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target,
            rule: rule.into(),
            variables: BTreeMap::new(),
            generated: Cell::new(false),
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Object file: the source path mirrored under `<root>/build` with the
    /// platform's object extension appended
    pub fn object_path(&self, root: &Path) -> PathBuf {
        let mut path = root
            .join("build")
            .join(relative_to(&self.source, root))
            .into_os_string();
        path.push(self.target.object_ext(false).unwrap_or(".o"));
        PathBuf::from(path)
    }

    pub fn is_generated(&self) -> bool {
        self.generated.get()
    }

    /// Write the compile edge unless already written; returns the object path
    pub fn generate(&self, ninja: &mut NinjaWriter, root: &Path) -> PathBuf {
        let object = self.object_path(root);
        if self.generated.get() {
            return object;
        }

        let display_path = relative_to(&self.source, root);
        ninja.build(
            &Edge::new(object.to_string_lossy(), self.rule.as_str())
                .with_input(self.source.to_string_lossy())
                .with_order_only(BUILD_NINJA)
                .with_variable("path", display_path.to_string_lossy())
                .with_variables(&self.variables),
        );
        self.generated.set(true);
        object
    }
}
