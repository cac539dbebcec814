//! Integration tests for login, registration, logout and session persistence.

use std::sync::Arc;

use libris_core::auth::{FileStore, RegisterOutcome};
use libris_core::models::RegisterRequest;
use libris_core::{ApiClient, ApiError, CredentialStore, Role};
use mockito::{Matcher, Server};
use serde_json::json;

const LOGIN_BODY: &str = r#"{"accessToken":"T1","refreshToken":"R1","userId":7,"name":"Ada","email":"ada@example.com","role":"ADMIN"}"#;

fn client(server: &Server, credentials: &CredentialStore) -> ApiClient {
    ApiClient::builder()
        .base_url(server.url())
        .credentials(credentials.clone())
        .build()
        .expect("Failed to build client")
}

#[tokio::test]
async fn login_stores_tokens_and_identity() {
    //* Given
    let mut server = Server::new_async().await;
    let login_mock = server
        .mock("POST", "/auth/login")
        .match_body(Matcher::Json(json!({"email": "ada@example.com", "password": "secret"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LOGIN_BODY)
        .expect(1)
        .create_async()
        .await;
    let credentials = CredentialStore::in_memory();
    let client = client(&server, &credentials);

    //* When
    let identity = client
        .login("ada@example.com", "secret")
        .await
        .expect("Failed to log in");

    //* Then
    login_mock.assert_async().await;
    assert_eq!(identity.user_id, 7);
    assert_eq!(identity.role, Role::Admin);
    assert_eq!(credentials.access_token().unwrap().as_deref(), Some("T1"));
    assert_eq!(credentials.refresh_token().unwrap().as_deref(), Some("R1"));
    assert_eq!(client.current_session().unwrap(), Some(identity));
}

#[tokio::test]
async fn bad_credentials_do_not_trigger_refresh() {
    //* Given
    let mut server = Server::new_async().await;
    let login_mock = server
        .mock("POST", "/auth/login")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/auth/refresh-token")
        .expect(0)
        .create_async()
        .await;
    let credentials = CredentialStore::in_memory();
    credentials.set_tokens("OLD", Some("R0")).unwrap();
    let client = client(&server, &credentials);

    //* When
    let result = client.login("ada@example.com", "wrong").await;

    //* Then
    login_mock.assert_async().await;
    refresh_mock.assert_async().await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(credentials.refresh_token().unwrap().as_deref(), Some("R0"));
}

#[tokio::test]
async fn register_without_tokens_requires_login() {
    //* Given
    let mut server = Server::new_async().await;
    let register_mock = server
        .mock("POST", "/auth/register")
        .match_body(Matcher::PartialJson(json!({"email": "new@example.com"})))
        .with_status(200)
        .with_body(r#"{"userId":8,"name":"New","email":"new@example.com","role":"USER"}"#)
        .expect(1)
        .create_async()
        .await;
    let credentials = CredentialStore::in_memory();
    let client = client(&server, &credentials);

    //* When
    let outcome = client
        .register(&RegisterRequest {
            name: "New".to_string(),
            email: "new@example.com".to_string(),
            password: "longenough".to_string(),
        })
        .await
        .expect("Failed to register");

    //* Then
    register_mock.assert_async().await;
    assert_eq!(outcome, RegisterOutcome::PendingLogin);
    assert!(!credentials.is_authenticated());
}

#[tokio::test]
async fn register_with_tokens_logs_in() {
    //* Given
    let mut server = Server::new_async().await;
    let register_mock = server
        .mock("POST", "/auth/register")
        .with_status(200)
        .with_body(LOGIN_BODY)
        .expect(1)
        .create_async()
        .await;
    let credentials = CredentialStore::in_memory();
    let client = client(&server, &credentials);

    //* When
    let outcome = client
        .register(&RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "longenough".to_string(),
        })
        .await
        .expect("Failed to register");

    //* Then
    register_mock.assert_async().await;
    assert!(matches!(outcome, RegisterOutcome::LoggedIn(ref identity) if identity.user_id == 7));
    assert!(credentials.is_authenticated());
}

#[tokio::test]
async fn register_validation_errors_surface_per_field() {
    //* Given
    let mut server = Server::new_async().await;
    let register_mock = server
        .mock("POST", "/auth/register")
        .with_status(422)
        .with_body(r#"{"message":"Validation failed","timestamp":"2024-05-01T10:00:00","errors":{"email":"Email is already taken","password":"Password too short"}}"#)
        .expect(1)
        .create_async()
        .await;
    let client = client(&server, &CredentialStore::in_memory());

    //* When
    let result = client
        .register(&RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "short".to_string(),
        })
        .await;

    //* Then
    register_mock.assert_async().await;
    let err = result.expect_err("422 must surface");
    assert_eq!(err.status(), 422);
    let fields = err.field_errors().expect("field errors");
    assert_eq!(fields["email"], "Email is already taken");
    assert_eq!(err.notifications().len(), 2);
}

#[tokio::test]
async fn logout_clears_credentials_even_when_server_fails() {
    //* Given
    let mut server = Server::new_async().await;
    let logout_mock = server
        .mock("POST", "/auth/logout")
        .match_header("authorization", "Bearer T1")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    let credentials = CredentialStore::in_memory();
    let client = client(&server, &credentials);
    let (pair, identity) = serde_json::from_str::<libris_core::auth::AuthResponse>(LOGIN_BODY)
        .unwrap()
        .into_session()
        .unwrap();
    credentials.save_session(&pair, &identity).unwrap();

    //* When
    client.logout().await.expect("Logout must succeed locally");

    //* Then
    logout_mock.assert_async().await;
    assert_eq!(credentials.access_token().unwrap(), None);
    assert_eq!(credentials.refresh_token().unwrap(), None);
    assert_eq!(credentials.identity().unwrap(), None);
}

#[tokio::test]
async fn file_backed_session_survives_restart() {
    //* Given
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    let mut server = Server::new_async().await;
    let _login_mock = server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_body(LOGIN_BODY)
        .create_async()
        .await;

    let first = client(&server, &CredentialStore::new(Arc::new(FileStore::new(&path))));
    first
        .login("ada@example.com", "secret")
        .await
        .expect("Failed to log in");

    //* When
    let restarted = client(&server, &CredentialStore::new(Arc::new(FileStore::new(&path))));

    //* Then
    let identity = restarted
        .current_session()
        .unwrap()
        .expect("session restored from disk");
    assert_eq!(identity.email, "ada@example.com");
    assert_eq!(
        restarted.credentials().refresh_token().unwrap().as_deref(),
        Some("R1")
    );
}

#[tokio::test]
async fn corrupt_credential_file_does_not_lock_out_user() {
    //* Given
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{truncated").unwrap();

    let mut server = Server::new_async().await;
    let _logout_mock = server
        .mock("POST", "/auth/logout")
        .with_status(200)
        .create_async()
        .await;
    let login_mock = server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_body(LOGIN_BODY)
        .expect(1)
        .create_async()
        .await;
    let credentials = CredentialStore::new(Arc::new(FileStore::new(&path)));
    let client = client(&server, &credentials);

    //* When
    let logout = client.logout().await;
    let login = client.login("ada@example.com", "secret").await;

    //* Then
    assert!(logout.is_ok(), "logout must clear a corrupt store: {:?}", logout);
    assert!(login.is_ok(), "login must overwrite a corrupt store: {:?}", login);
    login_mock.assert_async().await;
    assert_eq!(credentials.access_token().unwrap().as_deref(), Some("T1"));
    assert_eq!(credentials.refresh_token().unwrap().as_deref(), Some("R1"));
}
