/// HTTP-level tests for the session endpoints
///
/// Run with: cargo test -p authkeep-api --test auth_routes_test

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_health_without_database() {
    let ctx = TestContext::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "not_configured");
}

#[tokio::test]
async fn test_register_returns_token_pair() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .post_json(
            "/v1/auth/register",
            json!({ "login": "alice", "password": "password-1" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["expires_in"].as_i64().unwrap() > 590);
    assert_eq!(ctx.store.len().await, 1);
}

#[tokio::test]
async fn test_register_duplicate_is_conflict() {
    let ctx = TestContext::new();
    ctx.register("alice", "password-1").await;

    let (status, body) = ctx
        .post_json(
            "/v1/auth/register",
            json!({ "login": "alice", "password": "password-2" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(ctx.store.len().await, 1);
}

#[tokio::test]
async fn test_register_length_policy() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .post_json("/v1/auth/register", json!({ "login": "al", "password": "short" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
    assert!(ctx.directory.is_empty().await);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    // Well-formed JSON with the wrong shape is also a 400
    let (status, _) = ctx
        .post_json("/v1/auth/refresh", json!({ "token": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_flow() {
    let ctx = TestContext::new();
    ctx.register("alice", "password-1").await;

    let (status, body) = ctx
        .post_json("/v1/auth/login", json!({ "login": "alice", "password": "password-1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["refresh_token"].is_string());

    let (status, body) = ctx
        .post_json("/v1/auth/login", json!({ "login": "alice", "password": "wrong-pass" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid login or password");

    let (status, _) = ctx
        .post_json("/v1/auth/login", json!({ "login": "", "password": "password-1" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let ctx = TestContext::new();
    let (_, refresh_token) = ctx.register("alice", "password-1").await;

    let (status, body) = ctx
        .post_json("/v1/auth/refresh", json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh_token);

    let (status, body) = ctx
        .post_json("/v1/auth/refresh", json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");

    let (status, _) = ctx
        .post_json("/v1/auth/refresh", json!({ "refresh_token": rotated }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_with_access_token_is_unauthorized() {
    let ctx = TestContext::new();
    let (access_token, _) = ctx.register("alice", "password-1").await;

    let (status, body) = ctx
        .post_json("/v1/auth/refresh", json!({ "refresh_token": access_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Wrong token type");
}

#[tokio::test]
async fn test_refresh_storage_failure_is_internal_error() {
    let ctx = TestContext::new();
    let (_, refresh_token) = ctx.register("alice", "password-1").await;

    ctx.store.set_fail_saves(true);
    let (status, body) = ctx
        .post_json("/v1/auth/refresh", json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An internal error occurred");
}

#[tokio::test]
async fn test_logout() {
    let ctx = TestContext::new();
    let (access_token, refresh_token) = ctx.register("alice", "password-1").await;

    let (status, body) = ctx
        .post_json("/v1/auth/logout", json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = ctx
        .post_json("/v1/auth/refresh", json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Access tokens are not accepted for logout
    let (status, _) = ctx
        .post_json("/v1/auth/logout", json!({ "refresh_token": access_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_succeeds_when_store_fails() {
    let ctx = TestContext::new();
    let (_, refresh_token) = ctx.register("alice", "password-1").await;

    ctx.store.set_fail_revokes(true);
    let (status, _) = ctx
        .post_json("/v1/auth/logout", json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_me_requires_access_token() {
    let ctx = TestContext::new();
    let (access_token, refresh_token) = ctx.register("alice", "password-1").await;

    let (status, body) = ctx.get_with_bearer("/v1/auth/me", &access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "alice");

    let (status, _) = ctx.get_with_bearer("/v1/auth/me", &refresh_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/auth/me")
        .body(Body::empty())
        .unwrap();
    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing authorization header");
}

#[tokio::test]
async fn test_me_after_user_removed() {
    let ctx = TestContext::new();
    let (access_token, _) = ctx.register("alice", "password-1").await;

    let identity = ctx
        .state
        .auth
        .authenticate(&access_token)
        .await
        .unwrap();
    assert!(ctx.directory.remove(identity.id).await);

    let (status, body) = ctx.get_with_bearer("/v1/auth/me", &access_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unknown token subject");
}
