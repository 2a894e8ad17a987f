//! Authenticated request pipeline against a mock API.

use std::sync::Arc;

use onboard_core::api::{ApiClient, ApiErrorKind, AuthEvent, REQUEST_ID_HEADER};
use onboard_core::session::Session;
use onboard_core::store::{CredentialPair, CredentialStore, MemoryCredentialStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn profile_body() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "ivan",
        "first_name": "Ivan",
        "last_name": "Petrov",
        "email": "ivan@example.com",
        "is_staff": false,
        "profile": {"department": "Sales", "city": "Kazan"}
    })
}

fn client_with(server: &MockServer, pair: CredentialPair) -> (ApiClient, Arc<dyn CredentialStore>) {
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::with_pair(pair));
    let client = ApiClient::new(&format!("{}/api", server.uri()), Arc::clone(&store)).unwrap();
    (client, store)
}

#[tokio::test]
async fn test_expired_access_is_refreshed_once_and_retried() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, CredentialPair::new("A1", "R1"));
    let mut events = client.subscribe_events();

    Mock::given(method("GET"))
        .and(path("/api/accounts/profile/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/accounts/profile/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&server)
        .await;

    let profile = client.profile().await.unwrap();

    assert_eq!(profile.username, "ivan");
    assert_eq!(store.load().unwrap(), CredentialPair::new("A2", "R1"));
    assert_eq!(events.try_recv().unwrap(), AuthEvent::Refreshed);
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, CredentialPair::new("A1", "R1"));

    Mock::given(method("GET"))
        .and(path("/api/courses/progress/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A2", "refresh": "R2"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/courses/progress/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(client.progress().await.unwrap().is_empty());
    assert_eq!(store.load().unwrap(), CredentialPair::new("A2", "R2"));
}

#[tokio::test]
async fn test_401_without_refresh_token_clears_store() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, CredentialPair::new("A1", ""));
    let mut events = client.subscribe_events();

    Mock::given(method("GET"))
        .and(path("/api/accounts/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.profile().await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Unauthorized);
    assert!(err.requires_login());
    assert!(store.load().unwrap().is_empty());
    assert_eq!(events.try_recv().unwrap(), AuthEvent::LoginRequired);
}

#[tokio::test]
async fn test_failed_refresh_clears_both_tokens() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, CredentialPair::new("A1", "R1"));
    let mut events = client.subscribe_events();

    Mock::given(method("GET"))
        .and(path("/api/accounts/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Token is invalid or expired"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client.profile().await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::LoginRequired);
    assert!(err.message.contains("Token is invalid or expired"));
    assert!(store.load().unwrap().is_empty());
    assert_eq!(events.try_recv().unwrap(), AuthEvent::LoginRequired);
}

#[tokio::test]
async fn test_refreshed_token_rejected_again_is_not_refreshed_twice() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, CredentialPair::new("A1", "R1"));

    Mock::given(method("GET"))
        .and(path("/api/courses/admin/progress/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.admin_progress().await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Unauthorized);
    // The refresh itself succeeded, so the session is kept.
    assert_eq!(store.load().unwrap(), CredentialPair::new("A2", "R1"));
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, CredentialPair::new("A1", "R1"));

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/courses/activities/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/courses/achievements/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (activities, achievements) = tokio::join!(client.activities(), client.achievements());

    assert!(activities.unwrap().is_empty());
    assert!(achievements.unwrap().is_empty());
    assert_eq!(store.load().unwrap().access.as_deref(), Some("A2"));
}

#[tokio::test]
async fn test_login_stores_pair_and_next_request_uses_it() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, CredentialPair::default());
    let session = Session::new(Arc::clone(&store));

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"username": "ivan", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A1", "refresh": "R1"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/accounts/profile/"))
        .and(header("authorization", "Bearer A1"))
        .and(header_exists(REQUEST_ID_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&server)
        .await;

    session.authenticate(&client, "ivan", "secret").await.unwrap();

    assert_eq!(store.load().unwrap(), CredentialPair::new("A1", "R1"));
    assert!(session.state().is_authenticated());
    client.profile().await.unwrap();
}

#[tokio::test]
async fn test_bad_credentials_do_not_touch_store() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, CredentialPair::default());
    let session = Session::new(Arc::clone(&store));

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"detail": "No active account found with the given credentials"}),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = session
        .authenticate(&client, "ivan", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Unauthorized);
    assert!(err.message.contains("No active account"));
    assert!(store.load().unwrap().is_empty());
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let server = MockServer::start().await;
    let (client, _store) = client_with(&server, CredentialPair::new("A1", "R1"));

    Mock::given(method("GET"))
        .and(path("/api/courses/admin/progress/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(
            json!({"detail": "You do not have permission to perform this action."}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/courses/9/quiz/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/courses/recommended/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert_eq!(
        client.admin_progress().await.unwrap_err().kind,
        ApiErrorKind::Forbidden
    );
    assert_eq!(client.quiz(9).await.unwrap_err().kind, ApiErrorKind::NotFound);
    let err = client.recommended().await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::HttpStatus);
    assert_eq!(err.status, Some(503));
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    // Nothing listens on the discard port.
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
    let client = ApiClient::new("http://127.0.0.1:9/api", store).unwrap();

    let err = client.courses(&Default::default()).await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Network);
}
