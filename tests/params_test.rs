//! Integration tests for `rulemill params`

mod common;

use common::{stderr, stdout, TestProject, SAMPLE_BUILD};

#[test]
fn test_params_lists_choices() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&["params", "build.yaml"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("--BOARD  Hardware to build for"));
    assert!(out.contains("    qemu (default)"));
    assert!(out.contains("    nrf\n"));
}

#[test]
fn test_params_json() {
    let project = TestProject::with_build(SAMPLE_BUILD);
    let output = project.run(&["--json", "params", "build.yaml"]);
    assert!(output.status.success());

    let params: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(params[0]["name"], "BOARD");
    assert_eq!(params[0]["default"], "qemu");
    assert_eq!(params[0]["choices"], serde_json::json!(["qemu", "nrf"]));
}

#[test]
fn test_params_without_declarations() {
    let project = TestProject::with_build("desc: plain\ntargets: {}\n");
    let output = project.run(&["params", "build.yaml"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No parameters declared"));
}

#[test]
fn test_params_rejects_bad_default() {
    let project = TestProject::with_build(
        "desc: x\nparameters:\n  P:\n    default: c\n    a: {}\ntargets: {}\n",
    );
    let output = project.run(&["params", "build.yaml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("'c'"));
}
