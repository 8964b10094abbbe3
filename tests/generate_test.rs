//! Integration tests for `rulemill generate`
//!
//! Covers ninja file generation, parameter overrides, state capture and
//! failure cases that must leave no output behind.

mod common;

use common::{stderr, stdout, TestProject, SAMPLE_BUILD};
use proptest::prelude::*;

fn count_lines_starting(text: &str, prefix: &str) -> usize {
    text.lines().filter(|l| l.starts_with(prefix)).count()
}

#[test]
fn test_generate_writes_ninja_file() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&["generate", "build.yaml"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.file_exists("build.ninja"));

    let ninja = project.read_file("build.ninja");
    assert_eq!(count_lines_starting(&ninja, "rule zephyr_build"), 1);
    assert_eq!(count_lines_starting(&ninja, "rule custom_script"), 1);
    assert!(ninja.contains("build app/build/zephyr/zephyr.elf: zephyr_build fetch/zephyr.stamp\n"));
    assert!(ninja.contains(
        "build image/image.bin: custom_script app/build/zephyr/zephyr.elf\n"
    ));
    assert!(ninja.contains("  board = qemu_x86\n"));
    assert!(ninja.contains("build build.ninja: regenerate build.yaml\n"));
    assert!(ninja.contains("default app/build/zephyr/zephyr.elf image/image.bin\n"));
    assert!(stdout(&output).contains("Wrote build.ninja"));
}

#[test]
fn test_generate_applies_parameter_override() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&["generate", "build.yaml", "--BOARD", "nrf"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let ninja = project.read_file("build.ninja");
    assert!(ninja.contains("  board = nrf52840dk_nrf52840\n"));
    assert!(ninja.contains("overrides = --BOARD nrf\n"));
}

#[test]
fn test_generate_rejects_invalid_choice() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&["generate", "build.yaml", "--BOARD=esp32"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("esp32"));
    assert!(!project.file_exists("build.ninja"));
}

#[test]
fn test_generate_rejects_unknown_parameter() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&["generate", "build.yaml", "--", "--FLAVOR", "x"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("FLAVOR"));
}

#[test]
fn test_forward_dependency_leaves_no_output() {
    let project = TestProject::with_build(
        r"
desc: Broken order
targets:
  b:
    depends: [c]
    builder:
      type: custom_script
      script: ./b.sh
      target_images: [b.bin]
  c:
    builder:
      type: custom_script
      script: ./c.sh
      target_images: [c.bin]
",
    );
    let output = project.run(&["generate", "build.yaml"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("'b'"), "stderr: {err}");
    assert!(err.contains("'c'"), "stderr: {err}");
    assert!(!project.file_exists("build.ninja"));
}

#[test]
fn test_failed_run_keeps_previous_ninja_file() {
    let project = TestProject::with_build("desc: x\ntargets:\n  a:\n    builder:\n      type: nope\n");
    project.create_file("build.ninja", "# previous\n");
    let output = project.run(&["generate", "build.yaml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nope"));
    assert_eq!(project.read_file("build.ninja"), "# previous\n");
}

#[test]
fn test_missing_description_file() {
    let project = TestProject::new();
    let output = project.run(&["generate", "missing.yaml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing.yaml"));
}

#[test]
fn test_missing_desc_field() {
    let project = TestProject::with_build("targets: {}\n");
    let output = project.run(&["generate", "build.yaml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("'desc'"));
}

#[test]
fn test_capture_state_writes_toml() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&[
        "generate",
        "build.yaml",
        "--capture-state",
        "state/build-state.toml",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let state: toml::Value = toml::from_str(&project.read_file("state/build-state.toml")).unwrap();
    let app = &state["targets"]["app"];
    assert_eq!(app["kind"].as_str(), Some("zephyr"));
    assert_eq!(app["params"]["board"].as_str(), Some("qemu_x86"));
    assert!(state["targets"].get("image").is_none());
}

#[test]
fn test_regenerate_rule_keeps_capture_state() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&["generate", "build.yaml", "--capture-state", "state.toml"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project
        .read_file("build.ninja")
        .contains("$rulemill generate $conf -o build.ninja --capture-state state.toml -- $overrides"));
}

#[test]
fn test_stamp_cycle_leaves_no_output() {
    let project = TestProject::with_build(
        r"
desc: Hidden cycle
targets:
  a:
    stamps: [b/b.bin]
    builder:
      type: custom_script
      script: ./a.sh
      target_images: [a.bin]
  b:
    stamps: [a/a.bin]
    builder:
      type: custom_script
      script: ./b.sh
      target_images: [b.bin]
",
    );
    let output = project.run(&["generate", "build.yaml"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Target 'a' depends on 'b'"), "stderr: {err}");
    assert!(!project.file_exists("build.ninja"));
}

#[test]
fn test_json_report() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&["--json", "generate", "build.yaml", "-o", "out/fw.ninja", "--no-regenerate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["rules"], 2);
    assert_eq!(report["edges"], 2);
    assert_eq!(report["ninja_file"], "out/fw.ninja");
    assert!(project.file_exists("out/fw.ninja"));
    assert!(!project.read_file("out/fw.ninja").contains("rule regenerate"));
}

#[test]
fn test_quiet_prints_nothing() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&["-q", "generate", "build.yaml"]);
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Property: N custom script targets give N edges and one shared rule
    #[test]
    fn prop_one_rule_per_kind(n in 1usize..6) {
        let mut yaml = String::from("desc: many\ntargets:\n");
        for i in 0..n {
            yaml.push_str(&format!(
                "  t{i}:\n    builder:\n      type: custom_script\n      script: ./s.sh\n      target_images: [o{i}.bin]\n"
            ));
        }
        let project = TestProject::with_build(&yaml);
        let output = project.run(&["generate", "build.yaml", "--no-regenerate"]);
        prop_assert!(output.status.success());

        let ninja = project.read_file("build.ninja");
        prop_assert_eq!(count_lines_starting(&ninja, "rule "), 1);
        prop_assert_eq!(count_lines_starting(&ninja, "build "), n);
    }
}
