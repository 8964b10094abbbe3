//! Depfile command implementation
//!
//! Implements `rulemill depfile`, run by every builder rule before the
//! builder itself. It prints a gcc-style dependency file listing the build
//! description and the target's inputs.

use anyhow::{anyhow, Result};
use std::path::Path;

use super::generate::load_manifest;
use crate::core::generator::{self, GeneratorOptions};

/// Execute the depfile command
pub fn execute(conf: &Path, target: &str, overrides: &[String]) -> Result<()> {
    let (manifest, _) = load_manifest(conf, overrides)?;
    let conf_path = conf.display().to_string();
    let options = GeneratorOptions {
        conf_path: conf_path.clone(),
        ..GeneratorOptions::default()
    };
    let graph = generator::generate_build(&manifest, options)?;
    let depfile = graph
        .depfile(target, &conf_path)
        .ok_or_else(|| anyhow!("Unknown target '{target}'"))?;
    print!("{depfile}");
    Ok(())
}
