//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod depfile;
pub mod generate;
pub mod params;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use super::output::OutputConfig;
use crate::config::defaults::DEFAULT_NINJA_FILE;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the ninja file from a build description
    Generate {
        /// Build description (YAML)
        conf: PathBuf,

        /// Ninja file to write
        #[arg(short, long, default_value = DEFAULT_NINJA_FILE)]
        output: PathBuf,

        /// Also write captured builder state to this TOML file
        #[arg(long, value_name = "PATH")]
        capture_state: Option<PathBuf>,

        /// Do not emit the rule that re-runs rulemill when the description changes
        #[arg(long)]
        no_regenerate: bool,

        /// Parameter overrides (--NAME VALUE or --NAME=VALUE)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "OVERRIDES")]
        overrides: Vec<String>,
    },

    /// List the parameters a build description declares
    Params {
        /// Build description (YAML)
        conf: PathBuf,
    },

    /// Print the dependency file of one target (used by generated rules)
    Depfile {
        /// Build description (YAML)
        conf: PathBuf,

        /// Target name
        target: String,

        /// Parameter overrides (--NAME VALUE or --NAME=VALUE)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "OVERRIDES")]
        overrides: Vec<String>,
    },
}

impl Commands {
    /// Execute the command
    pub fn run(self, output: &OutputConfig) -> Result<()> {
        match self {
            Self::Generate {
                conf,
                output: ninja_file,
                capture_state,
                no_regenerate,
                overrides,
            } => generate::execute(
                &generate::GenerateArgs {
                    conf,
                    ninja_file,
                    capture_state,
                    regenerate: !no_regenerate,
                    overrides,
                },
                output,
            ),
            Self::Params { conf } => params::execute(&conf, output),
            Self::Depfile {
                conf,
                target,
                overrides,
            } => depfile::execute(&conf, &target, &overrides),
        }
    }
}
