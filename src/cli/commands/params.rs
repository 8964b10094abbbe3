//! Params command implementation
//!
//! Implements `rulemill params` to list the parameters of a build
//! description and their choices.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::OutputConfig;
use crate::core::manifest;

/// Execute the params command
pub fn execute(conf: &Path, out: &OutputConfig) -> Result<()> {
    let params = manifest::possible_parameters(conf)
        .with_context(|| format!("Failed to read parameters of {}", conf.display()))?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(());
    }
    if params.is_empty() {
        if !out.quiet {
            println!("No parameters declared");
        }
        return Ok(());
    }

    for param in &params {
        match &param.desc {
            Some(desc) => println!("--{}  {desc}", param.name),
            None => println!("--{}", param.name),
        }
        for choice in &param.choices {
            let marker = if *choice == param.default { " (default)" } else { "" };
            println!("    {choice}{marker}");
        }
    }
    Ok(())
}
