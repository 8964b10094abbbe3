//! Captured build state
//!
//! The state file records, per target, exactly what the target is built
//! with so two runs can be diffed for reproducibility.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::config::defaults::STATE_FILE_VERSION;
use crate::error::StateError;

/// Reproducibility record of one target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuilderState {
    /// Builder kind
    pub kind: String,

    /// Build directory
    pub build_dir: String,

    /// SHA256 of kind, parameters and inputs
    pub fingerprint: String,

    /// Upstream inputs
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Pinned kind-specific parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl BuilderState {
    /// Create a record and compute its fingerprint
    pub fn new(
        kind: &str,
        build_dir: &str,
        params: BTreeMap<String, String>,
        inputs: Vec<String>,
    ) -> Self {
        let fingerprint = fingerprint(kind, &params, &inputs);
        Self {
            kind: kind.to_string(),
            build_dir: build_dir.to_string(),
            fingerprint,
            inputs,
            params,
        }
    }
}

/// Hash the pinned configuration of a target
///
/// Fields are length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
pub fn fingerprint(kind: &str, params: &BTreeMap<String, String>, inputs: &[String]) -> String {
    let mut hasher = Sha256::new();
    let mut feed = |s: &str| {
        hasher.update((s.len() as u64).to_le_bytes());
        hasher.update(s.as_bytes());
    };
    feed(kind);
    for (key, value) in params {
        feed(key);
        feed(value);
    }
    for input in inputs {
        feed(input);
    }
    hex::encode(hasher.finalize())
}

/// State file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateFile {
    /// State file format version
    pub version: u32,

    /// Generator that wrote the file
    pub generator: String,

    /// Captured targets by name
    #[serde(default)]
    pub targets: BTreeMap<String, BuilderState>,
}

impl StateFile {
    /// Create an empty state file
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            version: STATE_FILE_VERSION,
            generator: generator.into(),
            targets: BTreeMap::new(),
        }
    }

    /// Add a captured target
    pub fn add_target(&mut self, name: impl Into<String>, state: BuilderState) {
        self.targets.insert(name.into(), state);
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self, StateError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, StateError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new(concat!("rulemill ", env!("CARGO_PKG_VERSION")))
    }
}
