//! Ninja build file writer
//!
//! Emits the low-level syntax of `build.ninja`: top-level variables, rules,
//! build edges and the default target list. Paths in edges are escaped;
//! variable values are written verbatim so they may reference other
//! variables (`$cflags`).

use std::fmt::Write as _;

/// A `rule` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: String,
    command: String,
    description: Option<String>,
    depfile: Option<String>,
    deps: Option<String>,
    pool: Option<String>,
    generator: bool,
}

impl Rule {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            description: None,
            depfile: None,
            deps: None,
            pool: None,
            generator: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Compiler-generated dependency file in GCC format
    pub fn with_gcc_depfile(mut self) -> Self {
        self.depfile = Some("$out.d".to_string());
        self.deps = Some("gcc".to_string());
        self
    }

    pub fn with_pool(mut self, pool: impl Into<String>) -> Self {
        self.pool = Some(pool.into());
        self
    }

    /// Run with the console pool (direct terminal access)
    pub fn console(self) -> Self {
        self.with_pool("console")
    }

    /// Mark the rule as regenerating the build file
    pub fn generator(mut self) -> Self {
        self.generator = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A `build` edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    output: String,
    rule: String,
    inputs: Vec<String>,
    implicit: Vec<String>,
    order_only: Vec<String>,
    variables: Vec<(String, String)>,
}

impl Edge {
    pub fn new(output: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            rule: rule.into(),
            inputs: Vec::new(),
            implicit: Vec::new(),
            order_only: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Phony alias for a set of targets
    pub fn phony<I, S>(name: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, "phony").with_inputs(targets)
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    pub fn with_implicit<I, S>(mut self, implicit: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implicit.extend(implicit.into_iter().map(Into::into));
        self
    }

    pub fn with_order_only(mut self, input: impl Into<String>) -> Self {
        self.order_only.push(input.into());
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((key.into(), value.into()));
        self
    }

    pub fn with_variables<I, K, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.variables
            .extend(variables.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}

/// Escape a path for use in a build edge
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '$' => escaped.push_str("$$"),
            ' ' => escaped.push_str("$ "),
            ':' => escaped.push_str("$:"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Accumulates the text of a ninja build file
#[derive(Debug, Default)]
pub struct NinjaWriter {
    out: String,
    edges: usize,
}

impl NinjaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn newline(&mut self) {
        self.out.push('\n');
    }

    /// Top-level variable assignment
    pub fn variable(&mut self, key: &str, value: impl AsRef<str>) {
        let _ = writeln!(self.out, "{} = {}", key, value.as_ref());
    }

    /// Variable assignment joining several values with spaces
    pub fn variable_list<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        self.variable(key, values.join(" "));
    }

    pub fn rule(&mut self, rule: &Rule) {
        let _ = writeln!(self.out, "rule {}", rule.name);
        self.indented("command", &rule.command);
        if let Some(description) = &rule.description {
            self.indented("description", description);
        }
        if let Some(depfile) = &rule.depfile {
            self.indented("depfile", depfile);
        }
        if let Some(deps) = &rule.deps {
            self.indented("deps", deps);
        }
        if let Some(pool) = &rule.pool {
            self.indented("pool", pool);
        }
        if rule.generator {
            self.indented("generator", "1");
        }
        self.newline();
    }

    pub fn build(&mut self, edge: &Edge) {
        let mut line = format!("build {}: {}", escape_path(&edge.output), edge.rule);
        for input in &edge.inputs {
            line.push(' ');
            line.push_str(&escape_path(input));
        }
        if !edge.implicit.is_empty() {
            line.push_str(" |");
            for input in &edge.implicit {
                line.push(' ');
                line.push_str(&escape_path(input));
            }
        }
        if !edge.order_only.is_empty() {
            line.push_str(" ||");
            for input in &edge.order_only {
                line.push(' ');
                line.push_str(&escape_path(input));
            }
        }
        self.out.push_str(&line);
        self.out.push('\n');
        for (key, value) in &edge.variables {
            self.indented(key, value);
        }
        self.edges += 1;
    }

    /// Targets built when ninja runs without arguments
    pub fn defaults<I, S>(&mut self, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets: Vec<String> = targets
            .into_iter()
            .map(|t| escape_path(t.as_ref()))
            .collect();
        if !targets.is_empty() {
            let _ = writeln!(self.out, "default {}", targets.join(" "));
        }
    }

    /// Number of build edges written so far
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn indented(&mut self, key: &str, value: &str) {
        let _ = writeln!(self.out, "  {} = {}", key, value);
    }
}
