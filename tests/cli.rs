//! Integration tests for the command-line front end

use std::path::Path;
use std::process::Command;

fn run_tabula(config_dir: &Path, args: &[&str]) -> (String, String, i32) {
    // Tests must not depend on a user's ~/.config/tabula/config.toml.
    let config = config_dir.join("config.toml");
    if !config.exists() {
        std::fs::write(&config, "").expect("write empty config");
    }

    let output = Command::new(env!("CARGO_BIN_EXE_tabula"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute tabula");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

#[test]
fn test_set_and_eval() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_tabula(
        dir.path(),
        &["-s", "A1=3", "-s", "A2=x", "-s", "A3=5", "-e", "=SUM(A1:A3)", "-e", "=COUNT(A1:A3)"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "8\n2");
}

#[test]
fn test_print_lists_cells_row_major() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_tabula(
        dir.path(),
        &["--set", "B1=1234.5", "--set", "A2=hello", "--set", "A1==SUM(B1)", "--print"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "A1: 1234.5\nB1: 1,234.5\nA2: hello");
}

#[test]
fn test_error_tokens_are_values() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_tabula(dir.path(), &["-e", "=AVERAGE(A1:A3)", "-e", "=NOPE(A1)"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "#DIV/0!\n#INVALID!");
}

#[test]
fn test_direct_and_full_recalc_modes() {
    let dir = tempfile::tempdir().unwrap();
    let edits = [
        "-s", "A1=5", "-s", "B1==SUM(A1)", "-s", "C1==SUM(B1)", "-s", "A1=10", "-e", "=SUM(C1)",
    ];

    let (stdout, _, code) = run_tabula(dir.path(), &edits);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let mut full = vec!["--recalc", "full"];
    full.extend_from_slice(&edits);
    let (stdout, _, code) = run_tabula(dir.path(), &full);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "10");
}

#[test]
fn test_copy_and_fill() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_tabula(
        dir.path(),
        &[
            "-s", "A1=1", "-s", "A2=2", "-s", "A3=3", "-s", "C1=2",
            "-s", "B1==POWER(A1, $C$1)",
            "--fill", "B1", "B1:B3",
            "--copy", "B3", "C3",
            "-e", "=CONCATENATE(B1:B3)",
        ],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "149");
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("sheet.json");
    let doc_arg = doc.to_str().unwrap();

    let (_, stderr, code) = run_tabula(dir.path(), &["-s", "A1=2", "-s", "A2==SUM(A1)", "-o", doc_arg]);
    assert_eq!(code, 0);
    assert!(stderr.contains("Saved to"));

    let json = std::fs::read_to_string(&doc).unwrap();
    assert!(json.contains("\"lastModified\""));

    let (stdout, _, code) = run_tabula(dir.path(), &[doc_arg, "-e", "=SUM(A1:A2)"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "4");
}

#[test]
fn test_invalid_usage_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_tabula(dir.path(), &["-s", "1A=3"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid cell reference"));

    let (_, stderr, code) = run_tabula(dir.path(), &["--wat"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown option"));
}
