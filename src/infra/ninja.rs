//! Ninja file writer
//!
//! Accumulates rule templates, build edges and variable bindings in call
//! order and serializes them in the ninja file format. The writer performs
//! no deduplication or validation: keeping rules unique per kind and output
//! paths unique per run is the job of [`crate::core::generator`].

use std::fmt::Write as _;

/// A ninja rule template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    /// Command line; `$var` references are kept verbatim
    pub command: String,
    /// Human-readable description shown by ninja
    pub description: Option<String>,
    /// Dependency file path (may reference edge variables)
    pub depfile: Option<String>,
    /// Dependency file format (`gcc` or `msvc`)
    pub deps: Option<String>,
    /// Execution pool
    pub pool: Option<String>,
    /// Re-stat outputs after the command ran
    pub restat: bool,
    /// Marks the rule as regenerating the ninja file itself
    pub generator: bool,
}

impl Rule {
    /// Create a rule running `command`
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the dependency file and its format
    #[must_use]
    pub fn with_depfile(mut self, depfile: impl Into<String>, deps: impl Into<String>) -> Self {
        self.depfile = Some(depfile.into());
        self.deps = Some(deps.into());
        self
    }

    /// Set the pool
    #[must_use]
    pub fn with_pool(mut self, pool: impl Into<String>) -> Self {
        self.pool = Some(pool.into());
        self
    }

    /// Enable restat
    #[must_use]
    pub fn with_restat(mut self) -> Self {
        self.restat = true;
        self
    }

    /// Mark as generator rule
    #[must_use]
    pub fn as_generator(mut self) -> Self {
        self.generator = true;
        self
    }
}

/// A single build statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edge {
    /// Output paths
    pub outputs: Vec<String>,
    /// Rule name
    pub rule: String,
    /// Explicit inputs (`$in`)
    pub inputs: Vec<String>,
    /// Implicit inputs (after `|`)
    pub implicit: Vec<String>,
    /// Order-only inputs (after `||`)
    pub order_only: Vec<String>,
    /// Edge-scoped variables in insertion order
    pub variables: Vec<(String, String)>,
}

impl Edge {
    /// Create an edge producing `outputs` with `rule`
    pub fn new(outputs: Vec<String>, rule: impl Into<String>) -> Self {
        Self {
            outputs,
            rule: rule.into(),
            ..Self::default()
        }
    }

    /// Set explicit inputs
    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<String>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set implicit inputs
    #[must_use]
    pub fn with_implicit(mut self, implicit: Vec<String>) -> Self {
        self.implicit = implicit;
        self
    }

    /// Bind an edge variable
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((key.into(), value.into()));
        self
    }

    /// Look up a bound variable
    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Escape a path for use in a build statement
pub fn escape_path(path: &str) -> String {
    path.replace('$', "$$")
        .replace(' ', "$ ")
        .replace(':', "$:")
}

/// Escape a variable value (only `$` is special)
pub fn escape(value: &str) -> String {
    value.replace('$', "$$")
}

/// In-memory ninja file writer
#[derive(Debug, Default)]
pub struct NinjaWriter {
    out: String,
    rules: Vec<String>,
    edges: Vec<Edge>,
}

impl NinjaWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a `# comment` line
    pub fn comment(&mut self, text: &str) {
        for line in text.lines() {
            let _ = writeln!(self.out, "# {line}");
        }
    }

    /// Write an empty line
    pub fn newline(&mut self) {
        self.out.push('\n');
    }

    /// Write a top-level variable binding
    pub fn variable(&mut self, key: &str, value: &str) {
        let _ = writeln!(self.out, "{key} = {}", escape(value));
    }

    /// Write a rule template
    pub fn rule(&mut self, name: &str, rule: &Rule) {
        let _ = writeln!(self.out, "rule {name}");
        let _ = writeln!(self.out, "  command = {}", rule.command);
        if let Some(description) = &rule.description {
            let _ = writeln!(self.out, "  description = {description}");
        }
        if let Some(depfile) = &rule.depfile {
            let _ = writeln!(self.out, "  depfile = {depfile}");
        }
        if let Some(deps) = &rule.deps {
            let _ = writeln!(self.out, "  deps = {deps}");
        }
        if let Some(pool) = &rule.pool {
            let _ = writeln!(self.out, "  pool = {pool}");
        }
        if rule.restat {
            self.out.push_str("  restat = 1\n");
        }
        if rule.generator {
            self.out.push_str("  generator = 1\n");
        }
        self.rules.push(name.to_string());
    }

    /// Write a build statement
    pub fn build(&mut self, edge: Edge) {
        let join = |paths: &[String]| {
            paths
                .iter()
                .map(|p| escape_path(p))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut line = format!("build {}: {}", join(&edge.outputs), edge.rule);
        if !edge.inputs.is_empty() {
            line.push(' ');
            line.push_str(&join(&edge.inputs));
        }
        if !edge.implicit.is_empty() {
            line.push_str(" | ");
            line.push_str(&join(&edge.implicit));
        }
        if !edge.order_only.is_empty() {
            line.push_str(" || ");
            line.push_str(&join(&edge.order_only));
        }
        let _ = writeln!(self.out, "{line}");
        for (key, value) in &edge.variables {
            let _ = writeln!(self.out, "  {key} = {}", escape(value));
        }
        self.edges.push(edge);
    }

    /// Write a `default` statement
    pub fn default_targets(&mut self, targets: &[String]) {
        if targets.is_empty() {
            return;
        }
        let paths: Vec<String> = targets.iter().map(|t| escape_path(t)).collect();
        let _ = writeln!(self.out, "default {}", paths.join(" "));
    }

    /// Names of the rules written so far, in order
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Build statements written so far, in order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of rules written
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of build statements written
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Serialized text written so far
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Consume the writer and return the serialized file
    pub fn into_string(self) -> String {
        self.out
    }
}
