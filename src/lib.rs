//! Rulemill - meta-build tool for embedded firmware
//!
//! Reads a YAML build description listing targets, each handled by a
//! builder kind (Zephyr, custom script), and emits one ninja file that builds
//! them all in dependency order.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Build description processing and graph assembly
//! - [`infra`] - Filesystem access and the ninja writer
//! - [`config`] - Defaults and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
