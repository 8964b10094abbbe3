//! Core build-graph logic
//!
//! Everything here works on in-memory values. Reading the build description
//! and writing the ninja file belong in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`manifest`] - Build description (build.yaml) parsing
//! - [`config_value`] - Typed access to YAML subtrees with error paths
//! - [`parameters`] - Overridable parameters and their choices
//! - [`variables`] - `%{NAME}` variable expansion
//! - [`builders`] - Builder kinds and their registry
//! - [`generator`] - Build graph assembly
//! - [`state`] - Captured reproducibility state

pub mod builders;
pub mod config_value;
pub mod generator;
pub mod manifest;
pub mod parameters;
pub mod state;
pub mod variables;
