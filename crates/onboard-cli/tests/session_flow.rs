//! End-to-end commands against a mock API.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn onboard(home: &Path, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("onboard");
    cmd.env("ONBOARD_HOME", home)
        .env("ONBOARD_API_URL", format!("{}/api", server.uri()))
        .env_remove("RUST_LOG");
    cmd
}

fn write_credentials(home: &Path, access: &str, refresh: &str) {
    let body = json!({"access": access, "refresh": refresh});
    fs::write(home.join("credentials.json"), body.to_string()).unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_stores_credentials() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A1", "refresh": "R1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    onboard(home.path(), &server)
        .args(["login", "-u", "ivan", "-p", "secret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as ivan."));

    let stored: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(home.path().join("credentials.json")).unwrap())
            .unwrap();
    assert_eq!(stored["access"], "A1");
    assert_eq!(stored["refresh"], "R1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_reads_password_from_stdin() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(wiremock::matchers::body_json(
            json!({"username": "ivan", "password": "from-stdin"}),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A1", "refresh": "R1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    onboard(home.path(), &server)
        .args(["login", "-u", "ivan"])
        .write_stdin("from-stdin\n")
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_is_idempotent() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    write_credentials(home.path(), "A1", "R1");

    onboard(home.path(), &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));
    assert!(!home.path().join("credentials.json").exists());

    onboard(home.path(), &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_protected_command_without_login_points_to_login() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    onboard(home.path(), &server)
        .arg("dashboard")
        .assert()
        .failure()
        .stderr(predicate::str::contains("onboard login"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_courses_list_renders_titles_and_status() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    write_credentials(home.path(), "A1", "R1");
    Mock::given(method("GET"))
        .and(path("/api/courses/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "title": "Warehouse safety", "role": "warehouse"},
            {"id": 8, "title": "Sales 101", "role": "seller"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/courses/progress/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "course": {"id": 7, "title": "Warehouse safety"}, "progress": 100.0}
        ])))
        .mount(&server)
        .await;

    onboard(home.path(), &server)
        .args(["courses", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warehouse safety"))
        .stdout(predicate::str::contains("Sales 101"))
        .stdout(predicate::str::contains("completed"))
        .stdout(predicate::str::contains("not_started"));

    onboard(home.path(), &server)
        .args(["courses", "list", "--status", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_session_is_refreshed_transparently() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    write_credentials(home.path(), "A1", "R1");
    Mock::given(method("GET"))
        .and(path("/api/accounts/profile/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/accounts/profile/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "username": "ivan", "first_name": "Ivan", "last_name": "Petrov"
        })))
        .mount(&server)
        .await;

    onboard(home.path(), &server)
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ivan Petrov"));

    let stored = fs::read_to_string(home.path().join("credentials.json")).unwrap();
    assert!(stored.contains("A2"));
    assert!(stored.contains("R1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_admin_progress_denied_for_non_staff() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    write_credentials(home.path(), "A1", "R1");
    Mock::given(method("GET"))
        .and(path("/api/courses/admin/progress/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(
            json!({"detail": "You do not have permission to perform this action."}),
        ))
        .mount(&server)
        .await;

    onboard(home.path(), &server)
        .args(["admin", "progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Access denied"));
}
