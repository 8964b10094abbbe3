//! Generate command implementation
//!
//! Implements `rulemill generate` to turn a build description into a ninja
//! file. The ninja file is only written once the whole graph was assembled,
//! so a failed run leaves any previous file untouched.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cli::output::{self, status, OutputConfig};
use crate::core::generator::{self, GeneratorOptions};
use crate::core::manifest::{self, Manifest};
use crate::core::parameters;
use crate::infra::filesystem;

/// Arguments of the generate command
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    /// Build description path
    pub conf: PathBuf,
    /// Ninja file to write
    pub ninja_file: PathBuf,
    /// Optional state file to write
    pub capture_state: Option<PathBuf>,
    /// Emit the regenerate rule
    pub regenerate: bool,
    /// Raw override words
    pub overrides: Vec<String>,
}

/// Load a build description with command line overrides applied
///
/// Returns the processed manifest together with the parsed override values.
pub fn load_manifest(
    conf: &Path,
    overrides: &[String],
) -> Result<(Manifest, HashMap<String, String>)> {
    let root = manifest::read_raw(conf)
        .with_context(|| format!("Failed to load build description {}", conf.display()))?;
    let values = parameters::parse_override_args(overrides)?;
    let manifest = Manifest::process(root, &values)
        .with_context(|| format!("Invalid build description {}", conf.display()))?;
    Ok((manifest, values))
}

fn program_path() -> String {
    std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "rulemill".to_string())
}

/// Execute the generate command
pub fn execute(args: &GenerateArgs, out: &OutputConfig) -> Result<()> {
    let (manifest, values) = load_manifest(&args.conf, &args.overrides)?;
    tracing::info!("Generating build for: {}", manifest.desc);
    if manifest.targets.is_empty() {
        output::warn(out, "Build description declares no targets");
    }

    let options = GeneratorOptions {
        program: program_path(),
        conf_path: args.conf.display().to_string(),
        overrides: parameters::override_words(&values),
        ninja_file: args.ninja_file.display().to_string(),
        regenerate: args.regenerate,
        capture_state: args
            .capture_state
            .as_ref()
            .map(|p| p.display().to_string()),
    };
    let graph = generator::generate_build(&manifest, options)?;

    filesystem::write_file(&args.ninja_file, &graph.ninja)?;
    if let Some(path) = &args.capture_state {
        filesystem::write_file(path, &graph.states.to_toml()?)?;
        tracing::info!("Captured state of {} target(s)", graph.states.targets.len());
    }

    if out.json {
        let report = serde_json::json!({
            "ninja_file": args.ninja_file.display().to_string(),
            "rules": graph.rule_count,
            "edges": graph.edge_count,
            "artifacts": graph.all_artifacts(),
            "state_file": args.capture_state.as_ref().map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if out.show_status() {
        println!(
            "{} Wrote {} ({} rules, {} build edges)",
            status::SUCCESS,
            args.ninja_file.display(),
            graph.rule_count,
            graph.edge_count
        );
    }
    Ok(())
}
