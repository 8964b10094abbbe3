//! Infrastructure layer
//!
//! Filesystem access and the ninja file format.

pub mod filesystem;
pub mod ninja;
