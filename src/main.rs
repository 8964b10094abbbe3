//! Rulemill CLI - meta-build tool for embedded firmware
//!
//! Entry point for the rulemill command-line application.

use clap::Parser;

use rulemill::cli::output::display_error;
use rulemill::cli::Cli;

fn main() {
    let cli = Cli::parse();
    cli.output_config().init_tracing();

    if let Err(e) = cli.run() {
        display_error(&e);
        std::process::exit(1);
    }
}
