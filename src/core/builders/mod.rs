//! Builder kinds
//!
//! A builder turns one target of the build description into ninja rules.
//! Each kind provides a factory and a shared-rule generator, collected in a
//! [`BuilderRegistry`] that is populated once at start-up.
//!
//! # Submodules
//!
//! - [`zephyr`] - Zephyr RTOS applications built with `west`
//! - [`custom_script`] - Arbitrary user-provided build scripts

pub mod custom_script;
pub mod zephyr;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::config::defaults::DEPFILE_TEMPLATE;
use crate::core::config_value::ConfigValue;
use crate::core::state::BuilderState;
use crate::error::ConfigError;
use crate::infra::ninja::{NinjaWriter, Rule};

/// Everything a factory needs to construct one builder
#[derive(Debug, Clone)]
pub struct BuilderContext<'a> {
    /// The target's `builder` subtree
    pub conf: ConfigValue<'a>,
    /// Unique target name
    pub name: &'a str,
    /// Build output directory of the target
    pub build_dir: &'a str,
    /// Upstream stamps and artifacts, in order
    pub inputs: Vec<String>,
}

/// One configured build target
pub trait Builder: fmt::Debug {
    /// Target name
    fn name(&self) -> &str;

    /// Builder kind name
    fn kind(&self) -> &'static str;

    /// Upstream inputs this target was given
    fn inputs(&self) -> &[String];

    /// Compute the artifact paths this target produces
    ///
    /// Pure: calling it never emits anything and always returns the same
    /// paths.
    fn get_targets(&self) -> Vec<String>;

    /// Emit exactly one build edge and return its artifact paths
    fn gen_build(&self, writer: &mut NinjaWriter) -> Vec<String>;

    /// Reproducibility hook, if this kind supports one
    fn state_capture(&self) -> Option<&dyn CaptureState> {
        None
    }
}

/// Optional capability: describe exactly what a target is built with
pub trait CaptureState {
    /// Record the pinned configuration of this target
    fn capture_state(&self) -> BuilderState;
}

/// Factory constructing a builder from its configuration
pub type BuilderFactory = fn(&BuilderContext<'_>) -> Result<Box<dyn Builder>, ConfigError>;

/// Shared-rule generator of a builder kind
pub type RuleGenerator = fn(&mut NinjaWriter);

/// A registered builder kind
#[derive(Clone, Copy)]
pub struct BuilderKind {
    /// Value of `builder.type` selecting this kind
    pub name: &'static str,
    /// Constructs one builder per target
    pub factory: BuilderFactory,
    /// Emits the kind's shared rule; must run at most once per run
    pub gen_build_rules: RuleGenerator,
}

impl fmt::Debug for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderKind")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Mapping of kind name to implementation
#[derive(Debug, Clone, Default)]
pub struct BuilderRegistry {
    kinds: BTreeMap<&'static str, BuilderKind>,
}

impl BuilderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(zephyr::KIND);
        registry.register(custom_script::KIND);
        registry
    }

    /// Register a kind, replacing any kind of the same name
    pub fn register(&mut self, kind: BuilderKind) -> Option<BuilderKind> {
        self.kinds.insert(kind.name, kind)
    }

    /// Look up a kind by name
    pub fn get(&self, name: &str) -> Option<&BuilderKind> {
        self.kinds.get(name)
    }

    /// Names of all registered kinds, sorted
    pub fn names(&self) -> Vec<String> {
        self.kinds.keys().map(|k| (*k).to_string()).collect()
    }
}

/// Join an image path onto the build directory
///
/// Absolute image paths are kept as they are. The result is normalized with
/// [`normalize_path`].
pub fn artifact_path(build_dir: &str, image: &str) -> String {
    normalize_path(&Path::new(build_dir).join(image).to_string_lossy())
}

/// Drop `.` components and repeated separators
///
/// `out/z.elf`, `./out/z.elf` and `out//./z.elf` all name the same file for
/// ninja and normalize to the same string. `..` is kept as written.
pub fn normalize_path(path: &str) -> String {
    let normalized: PathBuf = Path::new(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if normalized.as_os_str().is_empty() {
        ".".to_string()
    } else {
        normalized.to_string_lossy().into_owned()
    }
}

/// Command prefix regenerating the target's dependency file
///
/// Every builder rule runs it first so the edge is rebuilt whenever the
/// build description or any upstream input changes.
pub fn fetcher_dep_cmd() -> String {
    format!("$rulemill depfile $conf $name -- $overrides > {DEPFILE_TEMPLATE}")
}

/// Shared rule skeleton used by all builder kinds
///
/// Builders run on the console pool, report extra dependencies through a
/// gcc-style depfile and are re-stated so untouched artifacts do not
/// trigger downstream rebuilds.
pub fn builder_rule(steps: &[&str], description: &str) -> Rule {
    let mut cmd = vec![fetcher_dep_cmd()];
    cmd.extend(steps.iter().map(|s| (*s).to_string()));
    Rule::new(format!("bash -c \"{}\"", cmd.join(" && ")))
        .with_description(description)
        .with_pool("console")
        .with_depfile(DEPFILE_TEMPLATE, "gcc")
        .with_restat()
}
