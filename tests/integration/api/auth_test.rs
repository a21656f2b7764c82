//! Authentication API integration tests
//!
//! Tests for signup, login and the bearer token check in front of the
//! protected routes.

use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{create_test_user, generate_test_token, spawn_app, spawn_app_without_db, TestDatabase};
use crate::{assert_api_error, assert_contains};

#[tokio::test]
async fn test_greeting_needs_no_database() {
    let app = spawn_app_without_db();

    let response = app.server.get("/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_contains!(response.text(), "JustJio");
}

#[tokio::test]
async fn test_unknown_route_uses_fallback_body() {
    let app = spawn_app_without_db();

    let response = app.server.get("/v1/nowhere").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], 404);
    assert_eq!(body["message"], "404: Endpoint Not Found");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = spawn_app_without_db();

    let response = app.server.get("/v1/rooms").await;

    assert_api_error!(response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_forged_token() {
    let app = spawn_app_without_db();

    let response = app
        .server
        .get("/v1/rooms")
        .authorization_bearer("not-a-jwt")
        .await;

    assert_api_error!(response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_database_unavailable_is_503() {
    let app = spawn_app_without_db();
    let token = generate_test_token(1, "alice", "alice@example.com");

    let response = app.server.get("/v1/rooms").authorization_bearer(token).await;

    assert_api_error!(response, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
#[serial]
async fn test_signup_success() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());

    let response = app
        .server
        .post("/v1/auth/signup")
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "password123"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["isEmailValid"], false);
    assert!(body.get("passwordHash").is_none(), "hash must never be serialized");
}

#[tokio::test]
#[serial]
async fn test_signup_duplicate_username() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    create_test_user(db.pool(), "alice", "password123").await.unwrap();

    let response = app
        .server
        .post("/v1/auth/signup")
        .json(&json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "password123"
        }))
        .await;

    assert_api_error!(response, StatusCode::CONFLICT);
}

#[tokio::test]
#[serial]
async fn test_signup_rejects_short_password() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());

    let response = app
        .server
        .post("/v1/auth/signup")
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "short"
        }))
        .await;

    assert_api_error!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_login_success_creates_user_topic() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();

    let response = app
        .server
        .post("/v1/auth")
        .json(&json!({ "username": "alice", "password": "password123" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["id"], alice.id);
    assert_eq!(body["user"]["isOnline"], true);

    // The topic is created in the background
    let topic = app.state.publisher.names().user_topic(alice.id);
    for _ in 0..50 {
        if app.broker.has_topic(&topic) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("topic {} was never created", topic);
}

#[tokio::test]
#[serial]
async fn test_login_by_email() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    create_test_user(db.pool(), "alice", "password123").await.unwrap();

    let response = app
        .server
        .post("/v1/auth")
        .json(&json!({ "username": "alice@example.com", "password": "password123" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn test_login_invalid_credentials() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    create_test_user(db.pool(), "alice", "password123").await.unwrap();

    let response = app
        .server
        .post("/v1/auth")
        .json(&json!({ "username": "alice", "password": "wrongpassword" }))
        .await;

    assert_api_error!(response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_token_of_deleted_user_is_rejected() {
    let Some(db) = TestDatabase::try_new().await else { return };
    let app = spawn_app(db.pool().clone());
    let alice = create_test_user(db.pool(), "alice", "password123").await.unwrap();

    let response = app
        .server
        .delete(&format!("/v1/users/{}", alice.id))
        .authorization_bearer(&alice.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = app
        .server
        .get(&format!("/v1/users/{}", alice.id))
        .authorization_bearer(&alice.token)
        .await;
    assert_api_error!(response, StatusCode::UNAUTHORIZED);
}
