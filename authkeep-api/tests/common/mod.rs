/// Shared harness for API tests
///
/// Builds the router over in-memory collaborators so no database is needed.

use authkeep_api::app::{build_router, AppState};
use authkeep_api::config::{ApiConfig, Config, CredentialsPolicy, DatabaseConfig, JwtConfig};
use authkeep_shared::store::{MemoryCredentialStore, MemoryUserDirectory};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "api-test-secret-key-at-least-32-bytes";

pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryCredentialStore>,
    pub directory: Arc<MemoryUserDirectory>,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_ttl_seconds: 600,
            refresh_ttl_seconds: 172_800,
        },
        credentials: CredentialsPolicy::default(),
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryCredentialStore::new());
        let directory = Arc::new(MemoryUserDirectory::new());
        let state = AppState::new(test_config(), store.clone(), directory.clone());

        Self {
            app: build_router(state.clone()),
            state,
            store,
            directory,
        }
    }

    /// Sends a request and returns status plus JSON body (`Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get_with_bearer(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Registers a login and returns `(access_token, refresh_token)`
    pub async fn register(&self, login: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .post_json(
                "/v1/auth/register",
                serde_json::json!({ "login": login, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);

        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}
