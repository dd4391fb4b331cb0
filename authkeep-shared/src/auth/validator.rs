/// Token validation pipeline
///
/// [`TokenValidator::validate`] runs a fixed sequence of checks and stops at
/// the first failure:
///
/// 1. Signature and algorithm (HMAC family only) -> `MalformedToken`
/// 2. Claim extraction (`subject_id`, `type`, `exp`) -> `MalformedToken`
/// 3. Expiration, always -> `TokenExpired`
/// 4. Token type, if [`ValidationOptions::required_type`] is set -> `TokenTypeMismatch`
/// 5. Subject existence, if [`ValidationOptions::check_identity_exists`] is set;
///    directory errors propagate unchanged
///
/// Optional checks are selected with an immutable [`ValidationOptions`] value
/// rather than separate validation functions, so expiration can never be
/// skipped by picking the wrong entry point.
///
/// # Example
///
/// ```
/// use authkeep_shared::auth::jwt::{TokenConfig, TokenIssuer, TokenType};
/// use authkeep_shared::auth::validator::{TokenValidator, ValidationOptions};
/// use authkeep_shared::store::{MemoryUserDirectory, UserDirectory};
/// use chrono::Duration;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TokenConfig::new("secret-key-at-least-32-bytes-long!", Duration::minutes(10), Duration::hours(48));
/// let directory = Arc::new(MemoryUserDirectory::new());
/// let identity = directory.create("alice", "password").await?;
///
/// let issuer = TokenIssuer::new(config.clone());
/// let validator = TokenValidator::new(&config, directory);
///
/// let refresh = issuer.issue(&identity, TokenType::Refresh)?;
/// let result = validator.validate(&refresh.raw_value, ValidationOptions::refresh()).await?;
/// assert_eq!(result.subject_id, identity.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::error::{AuthError, AuthResult};
use super::jwt::{Claims, TokenConfig, TokenType};
use crate::store::{UserDirectory, UserFilter};

/// Accepted signing algorithms
const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Optional checks applied on top of signature, claims and expiration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Token type the caller insists on
    pub required_type: Option<TokenType>,

    /// Whether the subject must still exist in the user directory
    pub check_identity_exists: bool,
}

impl ValidationOptions {
    /// Profile for refresh tokens: type must be `refresh`, subject must exist
    pub fn refresh() -> Self {
        Self {
            required_type: Some(TokenType::Refresh),
            check_identity_exists: true,
        }
    }

    /// Profile for access tokens: type must be `access`, subject must exist
    pub fn access() -> Self {
        Self {
            required_type: Some(TokenType::Access),
            check_identity_exists: true,
        }
    }

    pub fn with_type(mut self, token_type: TokenType) -> Self {
        self.required_type = Some(token_type);
        self
    }

    pub fn with_identity_check(mut self) -> Self {
        self.check_identity_exists = true;
        self
    }
}

/// Facts extracted from a token that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub subject_id: Uuid,
    pub token_type: TokenType,
    pub expires_at: DateTime<Utc>,
}

/// Verifies inbound token values
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    directory: Arc<dyn UserDirectory>,
}

impl TokenValidator {
    /// Creates a validator sharing `config.secret` with the issuer
    pub fn new(config: &TokenConfig, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            directory,
        }
    }

    /// Validates a raw token value
    ///
    /// # Errors
    ///
    /// - `MalformedToken`: bad signature, foreign algorithm, or missing/ill-typed claims
    /// - `TokenExpired`: `exp` is in the past
    /// - `TokenTypeMismatch`: type differs from `options.required_type`
    /// - any error of [`UserDirectory::find`] when the identity check is enabled
    pub async fn validate(
        &self,
        raw_value: &str,
        options: ValidationOptions,
    ) -> AuthResult<ValidationResult> {
        let claims = self.decode_claims(raw_value)?;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::MalformedToken("exp out of range".to_string()))?;

        if expires_at < Utc::now() {
            tracing::debug!(subject_id = %claims.subject_id, "Rejected expired token");
            return Err(AuthError::TokenExpired);
        }

        if let Some(expected) = options.required_type {
            if claims.token_type != expected {
                return Err(AuthError::TokenTypeMismatch {
                    expected: expected.to_string(),
                    actual: claims.token_type.to_string(),
                });
            }
        }

        if options.check_identity_exists {
            self.directory
                .find(&UserFilter::by_id(claims.subject_id))
                .await?;
        }

        Ok(ValidationResult {
            subject_id: claims.subject_id,
            token_type: claims.token_type,
            expires_at,
        })
    }

    /// Verifies signature and algorithm, then deserializes the claims
    ///
    /// Expiration is deliberately not checked by the JWT library; step 3 of
    /// the pipeline owns it so the error kind and ordering stay fixed.
    fn decode_claims(&self, raw_value: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(raw_value, &self.key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::MalformedToken(e.to_string()))
    }
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator").finish_non_exhaustive()
    }
}
