use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `invex` with an isolated config directory.
fn invex(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("invex").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path());
    cmd
}

#[test]
fn test_unsupported_file_type() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("invoice.docx");
    std::fs::write(&input, b"PK").unwrap();

    invex(&home)
        .env("API_KEY", "test-key")
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file type: docx"));
}

#[test]
fn test_missing_credential_is_reported_first() {
    let home = TempDir::new().unwrap();

    invex(&home)
        .env_remove("API_KEY")
        .args(["process", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not found"))
        .stderr(predicate::str::contains("API_KEY"));
}

#[test]
fn test_missing_input_file() {
    let home = TempDir::new().unwrap();

    invex(&home)
        .env("API_KEY", "test-key")
        .args(["process", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_batch_without_matches() {
    let home = TempDir::new().unwrap();
    let pattern = home.path().join("*.pdf");

    invex(&home)
        .env("API_KEY", "test-key")
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn test_config_path_before_init() {
    let home = TempDir::new().unwrap();

    invex(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"))
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn test_config_init_set_get() {
    let home = TempDir::new().unwrap();

    invex(&home).args(["config", "init"]).assert().success();
    assert!(home.path().join("invex").join("config.json").exists());

    invex(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    invex(&home)
        .args(["config", "set", "pdf.render_dpi", "150"])
        .assert()
        .success();

    invex(&home)
        .args(["config", "get", "pdf.render_dpi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("150"));
}

#[test]
fn test_config_set_rejects_bad_type() {
    let home = TempDir::new().unwrap();

    invex(&home)
        .args(["config", "set", "pdf.render_dpi", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}
