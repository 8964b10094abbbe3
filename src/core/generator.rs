//! Build graph assembly
//!
//! Walks the targets of a [`Manifest`] in configuration order, instantiates
//! one builder per target and feeds the resulting rules to a
//! [`NinjaWriter`]. The shared rule of a builder kind is emitted before the
//! first target of that kind and never again.
//!
//! Configuration order doubles as dependency order: a target may only depend
//! on targets declared above it, which keeps the graph acyclic without a
//! separate graph search. All dependency references are checked before
//! anything is emitted, and a failed run returns no ninja text at all.

use std::collections::{HashMap, HashSet};

use crate::config::defaults::{DEFAULT_NINJA_FILE, REGENERATE_RULE};
use crate::core::builders::{normalize_path, BuilderContext, BuilderKind, BuilderRegistry};
use crate::core::manifest::{Manifest, TargetSpec};
use crate::core::state::StateFile;
use crate::error::{ConfigError, EmissionError, RulemillError};
use crate::infra::ninja::{escape, Edge, NinjaWriter, Rule};

/// Settings that do not come from the build description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Command used to re-invoke rulemill from ninja
    pub program: String,
    /// Path of the build description, as given on the command line
    pub conf_path: String,
    /// Parameter overrides, as `--NAME value` words
    pub overrides: Vec<String>,
    /// Name of the ninja file being generated
    pub ninja_file: String,
    /// Emit a generator rule that re-runs rulemill when the description changes
    pub regenerate: bool,
    /// State file refreshed by the generator rule, if one was requested
    pub capture_state: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            program: "rulemill".to_string(),
            conf_path: "build.yaml".to_string(),
            overrides: Vec::new(),
            ninja_file: DEFAULT_NINJA_FILE.to_string(),
            regenerate: false,
            capture_state: None,
        }
    }
}

/// Set of builder kinds whose shared rules were emitted in this run
#[derive(Debug, Default)]
pub struct RuleBook {
    emitted: HashSet<&'static str>,
}

impl RuleBook {
    /// Create an empty rule book
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the kind's rules are already in the output
    pub fn is_emitted(&self, kind: &str) -> bool {
        self.emitted.contains(kind)
    }

    /// Emit the kind's shared rules
    ///
    /// A second call for the same kind is an error, not a no-op.
    pub fn emit(&mut self, kind: &BuilderKind, writer: &mut NinjaWriter) -> Result<(), EmissionError> {
        if !self.emitted.insert(kind.name) {
            return Err(EmissionError::RuleEmittedTwice {
                kind: kind.name.to_string(),
            });
        }
        tracing::debug!("Emitting shared rules for builder kind '{}'", kind.name);
        (kind.gen_build_rules)(writer);
        Ok(())
    }

    /// Number of kinds emitted
    pub fn len(&self) -> usize {
        self.emitted.len()
    }

    /// Whether no kind has been emitted
    pub fn is_empty(&self) -> bool {
        self.emitted.is_empty()
    }
}

/// One target of the finished graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphTarget {
    /// Target name
    pub name: String,
    /// Builder kind
    pub kind: String,
    /// Explicit inputs of the target's edge
    pub inputs: Vec<String>,
    /// Artifacts produced by the target's edge
    pub artifacts: Vec<String>,
}

/// Escape a path for a gcc-style depfile
///
/// ninja reads `$$`, `\#`, `\ ` and `\:` back as the plain character.
fn escape_depfile_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '$' => out.push_str("$$"),
            '#' | ' ' | ':' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Result of a successful generation run
#[derive(Debug, Clone)]
pub struct BuildGraph {
    /// Serialized ninja file
    pub ninja: String,
    /// Number of shared builder rules emitted
    pub rule_count: usize,
    /// Number of builder edges emitted
    pub edge_count: usize,
    /// Targets in configuration order
    pub targets: Vec<GraphTarget>,
    /// Captured reproducibility state
    pub states: StateFile,
}

impl BuildGraph {
    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&GraphTarget> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Every artifact of the graph, in emission order
    pub fn all_artifacts(&self) -> Vec<String> {
        self.targets
            .iter()
            .flat_map(|t| t.artifacts.iter().cloned())
            .collect()
    }

    /// Render a gcc-style dependency file for one target
    ///
    /// The build description itself is listed first so editing it rebuilds
    /// the target.
    pub fn depfile(&self, name: &str, conf_path: &str) -> Option<String> {
        let target = self.target(name)?;
        let outputs: Vec<String> = target
            .artifacts
            .iter()
            .map(|p| escape_depfile_path(p))
            .collect();
        let mut deps = vec![escape_depfile_path(conf_path)];
        deps.extend(target.inputs.iter().map(|p| escape_depfile_path(p)));
        Some(format!("{}: {}\n", outputs.join(" "), deps.join(" ")))
    }
}

/// Assembles one build graph
#[derive(Debug)]
pub struct BuildGenerator<'r> {
    registry: &'r BuilderRegistry,
    options: GeneratorOptions,
    writer: NinjaWriter,
    rules: RuleBook,
    edges_emitted: HashSet<String>,
    builder_edges: usize,
    artifacts: HashMap<String, Vec<String>>,
    owners: HashMap<String, String>,
    targets: Vec<GraphTarget>,
    states: StateFile,
}

impl<'r> BuildGenerator<'r> {
    /// Create a generator for one run
    pub fn new(registry: &'r BuilderRegistry, options: GeneratorOptions) -> Self {
        Self {
            registry,
            options,
            writer: NinjaWriter::new(),
            rules: RuleBook::new(),
            edges_emitted: HashSet::new(),
            builder_edges: 0,
            artifacts: HashMap::new(),
            owners: HashMap::new(),
            targets: Vec::new(),
            states: StateFile::default(),
        }
    }

    /// Generate the complete graph for `manifest`
    pub fn generate(mut self, manifest: &Manifest) -> Result<BuildGraph, RulemillError> {
        self.validate(manifest)?;
        self.write_header(manifest);
        for target in &manifest.targets {
            self.add_target(target)?;
        }
        self.write_footer();

        tracing::info!(
            "Generated {} build edges using {} builder kinds",
            self.builder_edges,
            self.rules.len()
        );
        Ok(self.finish())
    }

    /// Check builder kinds and dependency order of every target
    ///
    /// Besides `depends`, a stamp naming an artifact of the same or a later
    /// target is a forward dependency. Artifacts are computed with
    /// [`Builder::get_targets`](crate::core::builders::Builder::get_targets)
    /// before anything is emitted.
    pub fn validate(&self, manifest: &Manifest) -> Result<(), ConfigError> {
        let mut producers: HashMap<String, usize> = HashMap::new();
        for (index, target) in manifest.targets.iter().enumerate() {
            let kind = self.lookup_kind(target)?;
            for dep in &target.depends {
                match manifest.position(dep) {
                    Some(pos) if pos < index => {}
                    Some(_) => {
                        return Err(ConfigError::ForwardDependency {
                            target: target.name.clone(),
                            dependency: dep.clone(),
                        })
                    }
                    None => {
                        return Err(ConfigError::UnresolvedDependency {
                            target: target.name.clone(),
                            dependency: dep.clone(),
                        })
                    }
                }
            }

            let ctx = BuilderContext {
                conf: target.builder_conf(),
                name: &target.name,
                build_dir: &target.build_dir,
                inputs: Vec::new(),
            };
            for path in (kind.factory)(&ctx)?.get_targets() {
                producers.entry(path).or_insert(index);
            }
        }

        for (index, target) in manifest.targets.iter().enumerate() {
            for stamp in &target.stamps {
                match producers.get(&normalize_path(stamp)) {
                    Some(&pos) if pos >= index => {
                        return Err(ConfigError::ForwardDependency {
                            target: target.name.clone(),
                            dependency: manifest.targets[pos].name.clone(),
                        })
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn lookup_kind(&self, target: &TargetSpec) -> Result<BuilderKind, ConfigError> {
        self.registry
            .get(&target.kind)
            .copied()
            .ok_or_else(|| ConfigError::UnknownKind {
                target: target.name.clone(),
                kind: target.kind.clone(),
                known: self.registry.names(),
            })
    }

    /// Stamps followed by the artifacts of every dependency
    fn resolve_inputs(&self, target: &TargetSpec) -> Result<Vec<String>, ConfigError> {
        let mut inputs = target.stamps.clone();
        for dep in &target.depends {
            let produced = self
                .artifacts
                .get(dep)
                .ok_or_else(|| ConfigError::ForwardDependency {
                    target: target.name.clone(),
                    dependency: dep.clone(),
                })?;
            tracing::debug!(
                "Target '{}' consumes {} artifact(s) of '{dep}'",
                target.name,
                produced.len()
            );
            inputs.extend(produced.iter().cloned());
        }
        Ok(inputs)
    }

    /// Emit the rules and edge of one target and return its artifacts
    pub fn add_target(&mut self, target: &TargetSpec) -> Result<Vec<String>, RulemillError> {
        let kind = self.lookup_kind(target)?;
        if !self.rules.is_emitted(kind.name) {
            self.rules.emit(&kind, &mut self.writer)?;
        }

        let inputs = self.resolve_inputs(target)?;
        let ctx = BuilderContext {
            conf: target.builder_conf(),
            name: &target.name,
            build_dir: &target.build_dir,
            inputs,
        };
        let builder = (kind.factory)(&ctx)?;

        if self.edges_emitted.contains(&target.name) {
            return Err(EmissionError::EdgeEmittedTwice {
                target: target.name.clone(),
            }
            .into());
        }
        let before = self.writer.edge_count();
        let produced = builder.gen_build(&mut self.writer);
        let count = self.writer.edge_count() - before;
        if count != 1 {
            return Err(EmissionError::EdgeCount {
                target: target.name.clone(),
                count,
            }
            .into());
        }
        self.edges_emitted.insert(target.name.clone());
        self.builder_edges += 1;

        for path in &produced {
            if let Some(owner) = self.owners.get(path) {
                return Err(ConfigError::DuplicateArtifact {
                    target: target.name.clone(),
                    path: path.clone(),
                    owner: owner.clone(),
                }
                .into());
            }
            self.owners.insert(path.clone(), target.name.clone());
        }

        if let Some(capture) = builder.state_capture() {
            self.states.add_target(&target.name, capture.capture_state());
        }

        tracing::info!(
            "Target '{}' ({}): {} artifact(s)",
            target.name,
            kind.name,
            produced.len()
        );
        self.artifacts.insert(target.name.clone(), produced.clone());
        self.targets.push(GraphTarget {
            name: target.name.clone(),
            kind: kind.name.to_string(),
            inputs: builder.inputs().to_vec(),
            artifacts: produced.clone(),
        });
        Ok(produced)
    }

    fn write_header(&mut self, manifest: &Manifest) {
        let opts = &self.options;
        self.writer.comment(&format!(
            "Generated by rulemill from {}. Do not edit.",
            opts.conf_path
        ));
        self.writer.comment(&manifest.desc);
        self.writer.newline();
        self.writer.variable("rulemill", &opts.program);
        self.writer.variable("conf", &opts.conf_path);
        self.writer.variable("overrides", &opts.overrides.join(" "));
        self.writer.newline();

        if opts.regenerate {
            let state_arg = opts
                .capture_state
                .as_ref()
                .map(|path| format!(" --capture-state {}", escape(path)))
                .unwrap_or_default();
            let rule = Rule::new(format!(
                "$rulemill generate $conf -o {}{state_arg} -- $overrides",
                escape(&opts.ninja_file)
            ))
            .with_description(format!("Regenerate {}", opts.ninja_file))
            .as_generator();
            self.writer.rule(REGENERATE_RULE, &rule);
            self.writer.newline();
            self.writer.build(
                Edge::new(vec![opts.ninja_file.clone()], REGENERATE_RULE)
                    .with_inputs(vec![opts.conf_path.clone()]),
            );
            self.writer.newline();
        }
    }

    fn write_footer(&mut self) {
        let all: Vec<String> = self
            .targets
            .iter()
            .flat_map(|t| t.artifacts.iter().cloned())
            .collect();
        self.writer.default_targets(&all);
    }

    fn finish(self) -> BuildGraph {
        BuildGraph {
            rule_count: self.rules.len(),
            edge_count: self.builder_edges,
            ninja: self.writer.into_string(),
            targets: self.targets,
            states: self.states,
        }
    }
}

/// Generate the graph for `manifest` with the built-in builder kinds
pub fn generate_build(
    manifest: &Manifest,
    options: GeneratorOptions,
) -> Result<BuildGraph, RulemillError> {
    let registry = BuilderRegistry::with_defaults();
    BuildGenerator::new(&registry, options).generate(manifest)
}
