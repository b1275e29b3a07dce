//! Command line behaviour of the release binary.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn release_cmd() -> Command {
    let mut cmd = Command::cargo_bin("prestashop_release").unwrap();
    cmd.env_remove("PRESTASHOP_RELEASE_CONFIG")
        .env_remove("PRESTASHOP_RELEASE_TMP_DIR");
    cmd
}

#[test]
fn help_lists_release_options() {
    release_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-installer"))
        .stdout(predicate::str::contains("--no-zip"))
        .stdout(predicate::str::contains("--keep-tests"))
        .stdout(predicate::str::contains("--destination-dir"));
}

#[test]
fn invalid_version_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    release_cmd()
        .args(["--source", dir.path().to_str().unwrap(), "--version", "eight"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("✗ configuration error"));
}

#[test]
fn missing_config_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    release_cmd()
        .args(["--source", dir.path().to_str().unwrap(), "--version", "8.1.0"])
        .args(["--config", dir.path().join("missing.toml").to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Failed to read config file"));
}

#[test]
fn verbose_and_quiet_are_exclusive() {
    release_cmd()
        .args(["--verbose", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[cfg(unix)]
#[test]
fn directory_release_from_the_command_line() {
    if !common::git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let fixture = common::Fixture::new();
    let config = fixture.out.path().join("release.toml");
    std::fs::write(
        &config,
        "[tools]\ncomposer = \"true\"\nmake = \"true\"\nphp = \"sh\"\n",
    )
    .unwrap();

    release_cmd()
        .arg("--source")
        .arg(fixture.source.path())
        .arg("--temp-dir")
        .arg(fixture.temp.path())
        .arg("--destination-dir")
        .arg(fixture.destination())
        .arg("--config")
        .arg(&config)
        .arg("--no-zip")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Release 8.1.0 created"))
        .stdout(predicate::str::contains("--- Cleaning release tree..."));

    assert!(fixture.destination().join("prestashop/admin/index.php").is_file());
    assert!(fixture.destination().join("prestashop_8.1.0.xml").is_file());
}
