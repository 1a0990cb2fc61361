use std::process::Command;

#[test]
fn test_scout_version() {
    let output = Command::new("cargo")
        .args(["run", "--bin", "scout", "--", "--version"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_scout_help() {
    let output = Command::new("cargo")
        .args(["run", "--bin", "scout", "--", "--help"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--host"));
    assert!(stdout.contains("--paginate-by"));
}

#[test]
fn test_scout_missing_database_is_configuration_error() {
    let output = Command::new("cargo")
        .args(["run", "--bin", "scout", "--"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
}
