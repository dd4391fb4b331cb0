/// Error taxonomy for the token lifecycle
///
/// Every fallible operation in the auth core returns [`AuthError`]. Callers
/// decide what to do by matching on [`AuthError::kind`], never on the rendered
/// message: the orchestrator wraps collaborator failures with the operation
/// that was running ("refresh failed: ..."), but the wrapped kind survives.
///
/// # Example
///
/// ```
/// use authkeep_shared::auth::error::{AuthError, ErrorKind, Operation};
///
/// let err = AuthError::LoginTaken.during(Operation::Register);
/// assert_eq!(err.kind(), ErrorKind::LoginTaken);
/// assert_eq!(err.to_string(), "registration failed: login already taken");
/// ```

use std::fmt;

/// Result alias used across the auth core
pub type AuthResult<T> = Result<T, AuthError>;

/// Coarse error classification, stable across wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Login unknown or password mismatch
    InvalidCredentials,

    /// Login already registered
    LoginTaken,

    /// Token `exp` is in the past
    TokenExpired,

    /// Token type differs from the one required by the caller
    TokenTypeMismatch,

    /// Signature, algorithm, or claim set is unacceptable
    MalformedToken,

    /// Refresh credential unknown, revoked, or bound to another subject
    InvalidToken,

    /// Token type outside `access` / `refresh`
    UnsupportedTokenType,

    /// Token could not be signed
    SigningFailure,

    /// Credential or user storage failed
    StorageFailure,

    /// Password hashing or verification failed
    HashingFailure,

    /// Subject referenced by a token does not exist
    UserNotFound,
}

/// High-level operations of the orchestrator, used as error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Login,
    Refresh,
    Logout,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Register => "registration",
            Operation::Login => "login",
            Operation::Refresh => "refresh",
            Operation::Logout => "logout",
        };
        f.write_str(name)
    }
}

/// Error type for the auth core
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("login already taken")]
    LoginTaken,

    #[error("token has expired")]
    TokenExpired,

    #[error("token type mismatch: expected {expected}, got {actual}")]
    TokenTypeMismatch { expected: String, actual: String },

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("invalid token")]
    InvalidToken,

    #[error("unsupported token type: {0}")]
    UnsupportedTokenType(String),

    #[error("failed to sign token: {0}")]
    SigningFailure(String),

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("hashing failure: {0}")]
    HashingFailure(String),

    #[error("user not found")]
    UserNotFound,

    /// A collaborator error annotated with the operation that was running
    #[error("{operation} failed: {source}")]
    Operation {
        operation: Operation,
        #[source]
        source: Box<AuthError>,
    },
}

impl AuthError {
    /// Returns the underlying kind, looking through operation context
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::LoginTaken => ErrorKind::LoginTaken,
            AuthError::TokenExpired => ErrorKind::TokenExpired,
            AuthError::TokenTypeMismatch { .. } => ErrorKind::TokenTypeMismatch,
            AuthError::MalformedToken(_) => ErrorKind::MalformedToken,
            AuthError::InvalidToken => ErrorKind::InvalidToken,
            AuthError::UnsupportedTokenType(_) => ErrorKind::UnsupportedTokenType,
            AuthError::SigningFailure(_) => ErrorKind::SigningFailure,
            AuthError::StorageFailure(_) => ErrorKind::StorageFailure,
            AuthError::HashingFailure(_) => ErrorKind::HashingFailure,
            AuthError::UserNotFound => ErrorKind::UserNotFound,
            AuthError::Operation { source, .. } => source.kind(),
        }
    }

    /// Wraps the error with operation context
    ///
    /// Already-wrapped errors are returned untouched so context never nests.
    pub fn during(self, operation: Operation) -> Self {
        match self {
            wrapped @ AuthError::Operation { .. } => wrapped,
            other => AuthError::Operation {
                operation,
                source: Box::new(other),
            },
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::StorageFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_survives_wrapping() {
        let err = AuthError::InvalidToken.during(Operation::Refresh);
        assert_eq!(err.kind(), ErrorKind::InvalidToken);
        assert!(matches!(err, AuthError::Operation { operation: Operation::Refresh, .. }));
    }

    #[test]
    fn test_context_does_not_nest() {
        let err = AuthError::StorageFailure("disk full".to_string())
            .during(Operation::Login)
            .during(Operation::Refresh);

        assert_eq!(err.to_string(), "login failed: storage failure: disk full");
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = AuthError::TokenTypeMismatch {
            expected: "refresh".to_string(),
            actual: "access".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "token type mismatch: expected refresh, got access"
        );
    }
}
