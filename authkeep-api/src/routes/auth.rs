/// Session endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a login and get a token pair
/// - `POST /v1/auth/login` - Login and get a token pair
/// - `POST /v1/auth/refresh` - Rotate a refresh token
/// - `POST /v1/auth/logout` - Revoke a refresh token
/// - `GET /v1/auth/me` - Identity behind a Bearer access token
///
/// Unreadable bodies and validation failures are `400`, credential and token
/// failures `401`, a taken login `409`.

use crate::{
    app::AppState,
    config::CredentialsPolicy,
    error::{ApiError, ApiResult},
};
use authkeep_shared::{auth::service::TokenPair, store::Identity};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidateLength, ValidationError, ValidationErrors};

/// Register / login request
#[derive(Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl CredentialsRequest {
    /// Applies the configured length bounds (counted in characters)
    fn check_policy(&self, policy: &CredentialsPolicy) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.login.validate_length(
            Some(policy.login_min_len),
            Some(policy.login_max_len),
            None,
        ) {
            errors.add(
                "login",
                length_error(
                    "Login",
                    policy.login_min_len,
                    policy.login_max_len,
                ),
            );
        }

        if !self.password.validate_length(
            Some(policy.password_min_len),
            Some(policy.password_max_len),
            None,
        ) {
            errors.add(
                "password",
                length_error(
                    "Password",
                    policy.password_min_len,
                    policy.password_max_len,
                ),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn length_error(field: &str, min: u64, max: u64) -> ValidationError {
    let mut error = ValidationError::new("length");
    error.message = Some(Cow::Owned(format!(
        "{} must be between {} and {} characters",
        field, min, max
    )));
    error
}

/// Refresh / logout request
#[derive(Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token pair response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,

    pub refresh_token: String,

    /// Always `"Bearer"`
    pub token_type: String,

    /// Seconds until the access token expires
    pub expires_in: i64,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            expires_in: (pair.access.expires_at - Utc::now()).num_seconds().max(0),
            access_token: pair.access.raw_value,
            refresh_token: pair.refresh.raw_value,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Identity response for `/me`
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub login: String,
}

/// Register a new login
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// { "login": "alice", "password": "correct horse" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: unreadable body or length policy violated
/// - `409 Conflict`: login already taken
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPairResponse>> {
    let Json(req) = payload?;
    req.validate()?;
    req.check_policy(&state.config.credentials)?;

    let pair = state.auth.register(&req.login, &req.password).await?;

    Ok(Json(pair.into()))
}

/// Login with an existing login
///
/// Only presence is checked here; length bounds apply at registration.
///
/// # Errors
///
/// - `400 Bad Request`: unreadable body or empty fields
/// - `401 Unauthorized`: unknown login or wrong password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPairResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let pair = state.auth.login(&req.login, &req.password).await?;

    Ok(Json(pair.into()))
}

/// Exchange a refresh token for a new pair
///
/// The presented refresh token is revoked. If revocation fails on the
/// storage side the new pair is still returned and the failure is logged.
///
/// # Errors
///
/// - `400 Bad Request`: unreadable body
/// - `401 Unauthorized`: expired, malformed, revoked, or unknown refresh token
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPairResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let outcome = state.auth.refresh(&req.refresh_token).await?;

    if let Some(warning) = &outcome.revoke_warning {
        tracing::warn!(
            user_id = %outcome.pair.refresh.subject_id,
            error = %warning,
            "Refresh succeeded but previous token is still active"
        );
    }

    Ok(Json(outcome.pair.into()))
}

/// Revoke a refresh token
///
/// Returns `204 No Content` once the token validates, even if the store
/// could not record the revocation.
pub async fn logout(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = payload?;
    req.validate()?;

    state.auth.logout(&req.refresh_token).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Identity behind the Bearer access token
pub async fn me(Extension(identity): Extension<Identity>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: identity.id,
        login: identity.login,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(login: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_policy_accepts_bounds() {
        let policy = CredentialsPolicy::default();
        assert!(request("abc", "12345678").check_policy(&policy).is_ok());
        assert!(request(&"a".repeat(64), &"p".repeat(128))
            .check_policy(&policy)
            .is_ok());
    }

    #[test]
    fn test_policy_reports_each_field() {
        let policy = CredentialsPolicy::default();
        let errors = request("ab", "short").check_policy(&policy).unwrap_err();

        let fields = errors.field_errors();
        assert!(fields.contains_key("login"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_policy_counts_characters() {
        let policy = CredentialsPolicy::default();
        // Three characters, nine bytes
        assert!(request("日本語", "12345678").check_policy(&policy).is_ok());
    }

    #[test]
    fn test_presence_validation() {
        assert!(request("", "x").validate().is_err());
        assert!(request("x", "").validate().is_err());
        assert!(request("x", "y").validate().is_ok());
    }
}
