//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory holding a build description and provides
/// utilities for running rulemill inside it.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a test project with `build.yaml` set to `content`
    pub fn with_build(content: &str) -> Self {
        let project = Self::new();
        project.create_file("build.yaml", content);
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Run rulemill with `args` inside the project directory
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_rulemill"))
            .current_dir(self.path())
            .args(args)
            .output()
            .expect("Failed to execute rulemill")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Stdout of a finished command
#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished command
#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Sample build description with one Zephyr application and a packaging step
#[allow(dead_code)]
pub const SAMPLE_BUILD: &str = r"
desc: Sample firmware
variables:
  ZEPHYR_BOARD: qemu_x86
parameters:
  BOARD:
    desc: Hardware to build for
    default: qemu
    qemu:
      overrides:
        variables:
          ZEPHYR_BOARD: qemu_x86
    nrf:
      overrides:
        variables:
          ZEPHYR_BOARD: nrf52840dk_nrf52840
targets:
  app:
    stamps: [fetch/zephyr.stamp]
    builder:
      type: zephyr
      board: '%{ZEPHYR_BOARD}'
      target: samples/hello_world
      target_images: [build/zephyr/zephyr.elf]
  image:
    depends: [app]
    builder:
      type: custom_script
      script: ./pack.sh
      args: [--out, image.bin]
      target_images: [image.bin]
";
