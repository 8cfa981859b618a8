//! Integration tests for CLI argument handling
//!
//! Runs the compiled binary to check the argument surface and usage errors;
//! command execution against a server is covered in `http_client.rs`.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_just-weather"))
        .args(args)
        .output()
        .expect("Failed to execute just-weather")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("just-weather"), "Help should mention the binary");
    assert!(stdout.contains("current"), "Help should list the current subcommand");
    assert!(stdout.contains("interactive"), "Help should list the interactive subcommand");
    assert!(stdout.contains("clear-cache"), "Help should list clear-cache");
}

#[test]
fn test_version_flag_exits_successfully() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
}

#[test]
fn test_no_arguments_prints_usage_and_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success(), "Expected missing subcommand to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "Should print usage: {}", stderr);
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = run_cli(&["frobnicate"]);
    assert!(!output.status.success());
}

#[test]
fn test_current_with_non_numeric_coordinates_fails() {
    let output = run_cli(&["current", "north", "west"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid") || stderr.contains("error"),
        "Should complain about the coordinate value: {}",
        stderr
    );
}

#[test]
fn test_current_with_missing_argument_fails() {
    let output = run_cli(&["current", "49.28"]);
    assert!(!output.status.success());
}

#[test]
fn test_cities_requires_a_query() {
    let output = run_cli(&["cities"]);
    assert!(!output.status.success());
}
