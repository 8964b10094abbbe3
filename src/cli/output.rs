//! Output formatting
//!
//! Maps the global `-v`/`-q`/`--json` flags onto the tracing subscriber and
//! formats user-facing messages. Logs always go to stderr so commands that
//! write to stdout (such as `depfile`) stay clean.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";
}

/// Output settings for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputConfig {
    /// Only errors are printed
    pub quiet: bool,
    /// Machine-readable output on stdout
    pub json: bool,
    /// Number of `-v` flags
    pub verbose: u8,
}

impl OutputConfig {
    /// Create output settings from the global flags
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Log level selected by the flags
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Whether human-readable status lines should be printed
    pub fn show_status(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Install the global tracing subscriber
    ///
    /// `RUST_LOG` directives are honoured on top of the flag-selected level.
    pub fn init_tracing(&self) {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(self.log_level().into()))
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

/// Print an error and its causes to stderr
pub fn display_error(err: &anyhow::Error) {
    eprintln!("{} {err}", status::ERROR);
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Print a warning to stderr unless quiet
pub fn warn(output: &OutputConfig, message: &str) {
    if !output.quiet {
        eprintln!("{} {message}", status::WARNING);
    }
}
