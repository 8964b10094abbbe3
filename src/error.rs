//! Error types for rulemill
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Build description errors
///
/// Every variant names the target it was raised for, so a failed run
/// points straight at the offending entry in `build.yaml`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required key is absent
    #[error("Target '{target}' is missing required key '{key}'")]
    MissingKey { target: String, key: String },

    /// Key present but holds the wrong kind of value
    #[error("Target '{target}': key '{key}' must be {expected}")]
    InvalidType {
        target: String,
        key: String,
        expected: String,
    },

    /// Builder type not present in the registry
    #[error("Target '{target}' uses unknown builder type '{kind}' (known: {known:?})")]
    UnknownKind {
        target: String,
        kind: String,
        known: Vec<String>,
    },

    /// Dependency names a target that does not exist
    #[error("Target '{target}' depends on unknown target '{dependency}'")]
    UnresolvedDependency { target: String, dependency: String },

    /// Dependency names a target that is declared later (or itself)
    #[error(
        "Target '{target}' depends on '{dependency}', which is not declared before it. \
         Move '{dependency}' above '{target}' in the build description"
    )]
    ForwardDependency { target: String, dependency: String },

    /// Two targets declare the same output path
    #[error("Target '{target}' declares artifact '{path}' already produced by '{owner}'")]
    DuplicateArtifact {
        target: String,
        path: String,
        owner: String,
    },

    /// `%{NAME}` references an undefined variable
    #[error("Unknown variable '{name}' referenced in '{key}'")]
    UnknownVariable { name: String, key: String },

    /// Variables reference each other in a loop
    #[error("Variable cycle detected: {}", cycle.join(" -> "))]
    VariableCycle { cycle: Vec<String> },

    /// The mandatory top-level `desc` field is missing
    #[error("'desc' field in build description is mandatory")]
    MissingDescription,

    /// YAML syntax error
    #[error("Failed to parse build description: {0}")]
    Parse(String),
}

/// Rule emission discipline violations
///
/// These indicate a bug in the assembler or in a builder kind, not a
/// problem with the user's build description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmissionError {
    /// Shared rules requested twice for one builder kind
    #[error("Rules for builder kind '{kind}' were already emitted")]
    RuleEmittedTwice { kind: String },

    /// Build edge requested twice for one target
    #[error("Build edge for target '{target}' was already emitted")]
    EdgeEmittedTwice { target: String },

    /// Builder appended something other than exactly one edge
    #[error("Builder for target '{target}' emitted {count} build edges, expected exactly one")]
    EdgeCount { target: String, count: usize },
}

/// Build parameter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    /// Override given for a parameter the description does not declare
    #[error("Unknown parameter '{name}' (declared: {declared:?})")]
    UnknownParameter { name: String, declared: Vec<String> },

    /// Override value is not one of the declared choices
    #[error("Parameter '{name}' has invalid value '{value}': must be one of {choices:?}")]
    InvalidChoice {
        name: String,
        value: String,
        choices: Vec<String>,
    },

    /// `default` does not name a declared choice
    #[error("Parameter '{name}' default '{default}' is not one of {choices:?}")]
    InvalidDefault {
        name: String,
        default: String,
        choices: Vec<String>,
    },

    /// Parameter declares no choices at all
    #[error("Parameter '{name}' declares no choices")]
    NoChoices { name: String },

    /// Parameter block is not shaped as expected
    #[error("Parameter '{name}' is malformed: {reason}")]
    MalformedOverride { name: String, reason: String },

    /// Override argument could not be parsed from the command line
    #[error("Invalid parameter argument '{arg}': {reason}")]
    InvalidArgument { arg: String, reason: String },
}

/// Captured state file errors
#[derive(Error, Debug)]
pub enum StateError {
    /// Serialization failure
    #[error("Failed to serialize build state: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Parse failure
    #[error("Failed to parse build state: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Top-level rulemill error type
#[derive(Error, Debug)]
pub enum RulemillError {
    /// Build description error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Emission discipline error
    #[error("Emission error: {0}")]
    Emission(#[from] EmissionError),

    /// Parameter error
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// State file error
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}
