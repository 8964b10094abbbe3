//! Default configuration values

/// Default name of the generated ninja file
pub const DEFAULT_NINJA_FILE: &str = "build.ninja";

/// Depfile path template bound in every builder rule
pub const DEPFILE_TEMPLATE: &str = ".rulemill_$name.d";

/// Captured state file format version
pub const STATE_FILE_VERSION: u32 = 1;

/// Top-level key holding the ordered target definitions
pub const TARGETS_KEY: &str = "targets";

/// Top-level key holding `%{NAME}` variables
pub const VARIABLES_KEY: &str = "variables";

/// Top-level key holding overridable build parameters
pub const PARAMETERS_KEY: &str = "parameters";

/// Per-target key overriding the build directory (defaults to the target name)
pub const BUILD_DIR_KEY: &str = "build-dir";

/// Name of the rule that regenerates the ninja file
pub const REGENERATE_RULE: &str = "regenerate";

/// Pseudo target name used for errors outside any target
pub const ROOT_TARGET: &str = "<root>";
