use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary with remote flags cleared from the environment and paths
/// pointed into `temp`
fn setup(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("backrest-setup").unwrap();
    cmd.env("BACKREST_SETUP_HOME", temp.path())
        .env("BACKREST_SETUP_CONFIG", temp.path().join("config.json"))
        .env("RUST_LOG", "off")
        .env_remove("BACKREST_REMOTE_TYPE")
        .env_remove("BACKREST_REMOTE_PATH")
        .env_remove("BACKREST_REMOTE_LOGIN")
        .env_remove("BACKREST_REMOTE_PASSWORD");
    cmd
}

#[test]
fn no_arguments_prints_usage() {
    let temp = TempDir::new().unwrap();
    setup(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn help_flags_print_usage() {
    let temp = TempDir::new().unwrap();
    for flag in ["--help", "-h"] {
        setup(&temp)
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::contains("install"))
            .stdout(predicate::str::contains("uninstall"));
    }
}

#[test]
fn unknown_command_fails_with_usage() {
    let temp = TempDir::new().unwrap();
    setup(&temp)
        .arg("frobnicate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown command: frobnicate"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn single_remote_flag_is_incomplete() {
    let temp = TempDir::new().unwrap();
    for flag in [
        "--remote-type",
        "--remote-path",
        "--remote-login",
        "--remote-password",
    ] {
        setup(&temp)
            .args(["install", flag, "webdav"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Incomplete remote configuration"));
    }
}

#[test]
fn remote_flags_from_environment_are_validated() {
    let temp = TempDir::new().unwrap();
    setup(&temp)
        .env("BACKREST_REMOTE_LOGIN", "u")
        .arg("install")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--remote-password"));
}

#[test]
fn unsupported_remote_type_fails_before_installing() {
    let temp = TempDir::new().unwrap();
    setup(&temp)
        .args([
            "install",
            "--remote-type",
            "foo",
            "--remote-path",
            "x",
            "--remote-login",
            "u",
            "--remote-password",
            "p",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Installing").not())
        .stderr(predicate::str::contains("Unsupported remote type: foo"));
}

#[test]
fn unknown_install_option_fails() {
    let temp = TempDir::new().unwrap();
    setup(&temp)
        .args(["install", "--remote-flavour", "x"])
        .assert()
        .failure();
}

#[test]
fn malformed_settings_file_is_reported() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.json"), "{oops").unwrap();
    setup(&temp)
        .args(["install", "--remote-login", "u"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse settings file"));
}

#[test]
fn malformed_settings_file_does_not_break_usage() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.json"), "{oops").unwrap();
    setup(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn status_falls_back_to_default_settings() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.json"), "{oops").unwrap();
    setup(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup plans"));
}

#[test]
fn status_succeeds_without_backrest() {
    let temp = TempDir::new().unwrap();
    setup(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup plans"));
}
