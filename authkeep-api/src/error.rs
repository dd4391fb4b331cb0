/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`; [`ApiError`] renders as a JSON body with
/// a stable `error` code:
///
/// ```json
/// { "error": "unauthorized", "message": "Token expired" }
/// ```
///
/// Core errors are mapped by [`ErrorKind`], never by message text. Details of
/// server-side failures are logged and replaced with a generic message.

use authkeep_shared::auth::error::{AuthError, ErrorKind};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400): unreadable body
    BadRequest(String),

    /// Bad request (400): field-level validation failures
    ValidationError(Vec<ValidationErrorDetail>),

    /// Unauthorized (401): bad credentials or unusable token
    Unauthorized(String),

    /// Conflict (409): login already taken
    Conflict(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert core errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = match err.kind() {
            ErrorKind::InvalidCredentials => "Invalid login or password",
            ErrorKind::LoginTaken => return ApiError::Conflict("Login already taken".to_string()),
            ErrorKind::TokenExpired => "Token expired",
            ErrorKind::TokenTypeMismatch => "Wrong token type",
            ErrorKind::MalformedToken | ErrorKind::UnsupportedTokenType => "Malformed token",
            ErrorKind::InvalidToken => "Invalid token",
            ErrorKind::UserNotFound => "Unknown token subject",
            ErrorKind::SigningFailure | ErrorKind::StorageFailure | ErrorKind::HashingFailure => {
                return ApiError::InternalError(err.to_string())
            }
        };

        tracing::debug!(error = %err, "Request rejected");
        ApiError::Unauthorized(message.to_string())
    }
}

/// Body extraction failures are always 400, whatever axum's default would be
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authkeep_shared::auth::error::Operation;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");
    }

    #[test]
    fn test_auth_error_status_mapping() {
        let cases = vec![
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::LoginTaken, StatusCode::CONFLICT),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (
                AuthError::TokenTypeMismatch {
                    expected: "refresh".to_string(),
                    actual: "access".to_string(),
                },
                StatusCode::UNAUTHORIZED,
            ),
            (AuthError::MalformedToken("bad".to_string()), StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::UserNotFound, StatusCode::UNAUTHORIZED),
            (AuthError::StorageFailure("down".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::SigningFailure("empty".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::HashingFailure("oom".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let wrapped = err.during(Operation::Refresh);
            assert_eq!(ApiError::from(wrapped).status(), expected);
        }
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = ApiError::from(AuthError::StorageFailure("password=hunter2".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_error_display() {
        let err = ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "login".to_string(),
            message: "Login is required".to_string(),
        }]);
        assert_eq!(err.to_string(), "Validation failed: 1 errors");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
