//! Build description (build.yaml) loading
//!
//! The build description is an ordered mapping of targets. Order matters:
//! a target may only depend on targets declared above it.
//!
//! ```yaml
//! desc: "Zephyr demo firmware"
//! variables:
//!   BOARD: qemu_x86
//! targets:
//!   app:
//!     stamps: [fetch/zephyr.stamp]
//!     builder:
//!       type: zephyr
//!       board: "%{BOARD}"
//!       target: samples/hello_world
//!       target_images: [build/zephyr/zephyr.elf]
//!   image:
//!     depends: [app]
//!     builder:
//!       type: custom_script
//!       script: ./pack.sh
//!       target_images: [image.bin]
//! ```
//!
//! Loading runs parameter injection first, then `%{NAME}` expansion, then
//! reads the target list.

use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::config::defaults::{BUILD_DIR_KEY, ROOT_TARGET, TARGETS_KEY};
use crate::core::config_value::ConfigValue;
use crate::core::parameters::{self, Parameter};
use crate::core::variables;
use crate::error::{ConfigError, RulemillError};
use crate::infra::filesystem;

/// One target of the build description
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    /// Unique target name
    pub name: String,
    /// Builder kind (`builder.type`)
    pub kind: String,
    /// Build output directory
    pub build_dir: String,
    /// Source stamps produced by the fetch stage
    pub stamps: Vec<String>,
    /// Names of earlier targets this one consumes
    pub depends: Vec<String>,
    builder: Value,
    builder_path: String,
}

impl TargetSpec {
    /// Parse one `targets.<name>` entry
    pub fn from_value(name: &str, value: &Value) -> Result<Self, ConfigError> {
        let path = format!("{TARGETS_KEY}.{name}");
        let node = ConfigValue::new(value, name, path);
        if !value.is_mapping() {
            return Err(ConfigError::InvalidType {
                target: name.to_string(),
                key: node.path().to_string(),
                expected: "a mapping".to_string(),
            });
        }

        let builder = node.get("builder")?;
        let kind = builder.get("type")?.as_str()?;
        let build_dir = match node.get_opt(BUILD_DIR_KEY) {
            Some(dir) => dir.as_str()?,
            None => name.to_string(),
        };
        let stamps = match node.get_opt("stamps") {
            Some(list) => list.as_str_list()?,
            None => Vec::new(),
        };
        let depends = match node.get_opt("depends") {
            Some(list) => list.as_str_list()?,
            None => Vec::new(),
        };

        Ok(Self {
            name: name.to_string(),
            kind,
            build_dir,
            stamps,
            depends,
            builder_path: builder.path().to_string(),
            builder: builder.raw().clone(),
        })
    }

    /// Typed view of the `builder` subtree
    pub fn builder_conf(&self) -> ConfigValue<'_> {
        ConfigValue::new(&self.builder, &self.name, self.builder_path.clone())
    }
}

/// A fully processed build description
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Human-readable description
    pub desc: String,
    /// Minimum generator version requested by the file (not enforced)
    pub min_ver: Option<String>,
    /// Targets in configuration order
    pub targets: Vec<TargetSpec>,
}

/// Parse YAML text into a raw tree
pub fn parse_yaml(content: &str) -> Result<Value, ConfigError> {
    serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Read and parse a build description file without processing it
pub fn read_raw(path: &Path) -> Result<Value, RulemillError> {
    let content = filesystem::read_file(path)?;
    let root = parse_yaml(&content)?;
    require_desc(&root)?;
    Ok(root)
}

fn require_desc(root: &Value) -> Result<String, ConfigError> {
    ConfigValue::new(root, ROOT_TARGET, "")
        .get_opt("desc")
        .ok_or(ConfigError::MissingDescription)?
        .as_str()
}

impl Manifest {
    /// Load, apply parameter overrides and expand variables
    pub fn load(path: &Path, overrides: &HashMap<String, String>) -> Result<Self, RulemillError> {
        let root = read_raw(path)?;
        Self::process(root, overrides)
    }

    /// Process a raw tree: parameters, then variables, then targets
    pub fn process(
        mut root: Value,
        overrides: &HashMap<String, String>,
    ) -> Result<Self, RulemillError> {
        let params = parameters::get_possible_parameters(&root)?;
        let resolved = parameters::resolve_parameters(&params, overrides)?;
        parameters::apply_parameters(&mut root, &resolved)?;
        variables::expand_variables(&mut root)?;
        Ok(Self::from_value(&root)?)
    }

    /// Parse and process YAML text
    pub fn from_yaml(
        content: &str,
        overrides: &HashMap<String, String>,
    ) -> Result<Self, RulemillError> {
        Self::process(parse_yaml(content)?, overrides)
    }

    /// Read targets from an already processed tree
    pub fn from_value(root: &Value) -> Result<Self, ConfigError> {
        let desc = require_desc(root)?;
        let node = ConfigValue::new(root, ROOT_TARGET, "");
        let min_ver = match node.get_opt("min_ver") {
            Some(v) => Some(v.as_str()?),
            None => None,
        };
        if let Some(ver) = &min_ver {
            tracing::debug!("Build description requests min_ver {ver}; not enforced");
        }

        let targets_node = node.get(TARGETS_KEY)?;
        let mapping = targets_node
            .raw()
            .as_mapping()
            .ok_or_else(|| ConfigError::InvalidType {
                target: ROOT_TARGET.to_string(),
                key: TARGETS_KEY.to_string(),
                expected: "a mapping of target names".to_string(),
            })?;

        let mut targets = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let name = ConfigValue::new(key, ROOT_TARGET, TARGETS_KEY).as_str()?;
            targets.push(TargetSpec::from_value(&name, value)?);
        }

        Ok(Self {
            desc,
            min_ver,
            targets,
        })
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&TargetSpec> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Position of a target in configuration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.targets.iter().position(|t| t.name == name)
    }
}

/// Parameters declared by a build description file
pub fn possible_parameters(path: &Path) -> Result<Vec<Parameter>, RulemillError> {
    let root = read_raw(path)?;
    Ok(parameters::get_possible_parameters(&root)?)
}
