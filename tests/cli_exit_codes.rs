use std::fs;
use std::process::{Command, Output};

use tempfile::tempdir;

fn run_bin(bin: &str, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn eval_exits_nonzero_on_zero_byte_artifact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("iris_model.joblib");
    fs::write(&path, b"").unwrap();

    let output = run_bin(
        env!("CARGO_BIN_EXE_irisml-eval"),
        &["--model", path.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("persist stage failed"), "{stderr}");
}

#[test]
fn validate_exits_zero_on_builtin_set() {
    let output = run_bin(env!("CARGO_BIN_EXE_irisml-validate"), &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("shape: 150 x 4"), "{stdout}");
    assert!(stdout.lines().any(|line| line == "OK"), "{stdout}");
}

#[test]
fn unknown_flag_exits_nonzero() {
    let output = run_bin(env!("CARGO_BIN_EXE_irisml-validate"), &["--bogus"]);
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn help_exits_zero() {
    let output = run_bin(env!("CARGO_BIN_EXE_irisml-train"), &["--help"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("irisml-train"));
}
