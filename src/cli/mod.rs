//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! Build-graph logic belongs in [`crate::core`].

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::Parser;

use commands::Commands;
use output::OutputConfig;

/// Rulemill - meta-build tool for embedded firmware
///
/// Turn a YAML build description into a ninja build file.
#[derive(Parser, Debug)]
#[command(name = "rulemill")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Output settings selected by the global flags
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::new(self.quiet, self.json, self.verbose)
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = self.output_config();
        if let Some(cmd) = self.command {
            cmd.run(&output)
        } else {
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_generate_collects_trailing_overrides() {
        let cli = Cli::try_parse_from([
            "rulemill", "generate", "build.yaml", "-o", "out.ninja", "--BOARD", "nrf",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Generate {
                conf,
                output,
                overrides,
                ..
            }) => {
                assert_eq!(conf, PathBuf::from("build.yaml"));
                assert_eq!(output, PathBuf::from("out.ninja"));
                assert_eq!(overrides, ["--BOARD", "nrf"]);
            }
            other => panic!("Expected generate command, got {other:?}"),
        }
    }

    #[test]
    fn test_overrides_after_double_dash() {
        let cli = Cli::try_parse_from([
            "rulemill", "depfile", "build.yaml", "app", "--", "--BOARD=nrf",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Depfile {
                target, overrides, ..
            }) => {
                assert_eq!(target, "app");
                assert_eq!(overrides, ["--BOARD=nrf"]);
            }
            other => panic!("Expected depfile command, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["rulemill", "-vv", "params", "build.yaml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }
}
