use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("onboard")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("dashboard"))
        .stdout(predicate::str::contains("courses"))
        .stdout(predicate::str::contains("quiz"))
        .stdout(predicate::str::contains("admin"));
}

#[test]
fn test_courses_help_shows_subcommands() {
    cargo_bin_cmd!("onboard")
        .args(["courses", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("browse"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn test_quiz_submit_rejects_malformed_answer() {
    cargo_bin_cmd!("onboard")
        .args(["quiz", "submit", "7", "--answer", "one=two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid question id"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("onboard")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
