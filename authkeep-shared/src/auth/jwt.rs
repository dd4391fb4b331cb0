/// Token minting
///
/// This module defines the signed token format and the [`TokenIssuer`] that
/// produces it. Tokens are JWTs signed with HS256 over a small claim set:
///
/// ```json
/// {
///   "subject_id": "0b6c3a52-...",
///   "exp": 1735689600,
///   "type": "refresh",
///   "jti": "6f1e0c9a-..."
/// }
/// ```
///
/// # Token Types
///
/// - **Access Token**: short-lived, stateless bearer credential
/// - **Refresh Token**: long-lived, persisted by digest, exchanged for a new pair
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256), secret shared with the validator
/// - **Uniqueness**: every token carries a random `jti`, so two tokens minted in
///   the same second for the same subject still differ
/// - **Secret Management**: secrets should be at least 32 bytes
///
/// # Example
///
/// ```
/// use authkeep_shared::auth::jwt::{TokenConfig, TokenIssuer, TokenType};
/// use authkeep_shared::store::Identity;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new(TokenConfig::new(
///     "your-secret-key-at-least-32-bytes-long",
///     Duration::minutes(10),
///     Duration::hours(48),
/// ));
///
/// let identity = Identity::new(Uuid::new_v4(), "alice");
/// let refresh = issuer.issue(&identity, TokenType::Refresh)?;
/// assert_eq!(refresh.subject_id, identity.id);
/// assert_eq!(refresh.hashed_value.len(), 64);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::digest::hash_token;
use super::error::{AuthError, AuthResult};
use crate::store::Identity;

/// Longest lifetime accepted for either token type (ten years)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived, never persisted)
    Access,

    /// Refresh token (long-lived, persisted as a digest)
    Refresh,
}

impl TokenType {
    /// Gets token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenType::Access),
            "refresh" => Ok(TokenType::Refresh),
            other => Err(AuthError::UnsupportedTokenType(other.to_string())),
        }
    }
}

/// JWT claims structure
///
/// `subject_id`, `exp` and `type` are required when decoding. `jti` is always
/// written but tolerated as absent on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub subject_id: Uuid,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Token type
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Unique token nonce
    #[serde(default)]
    pub jti: String,
}

impl Claims {
    /// Creates claims expiring at `expires_at` with a fresh `jti`
    pub fn new(subject_id: Uuid, token_type: TokenType, expires_at: DateTime<Utc>) -> Self {
        Self {
            subject_id,
            exp: expires_at.timestamp(),
            token_type,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

/// Signing configuration shared by issuer and validator
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret
    pub secret: String,

    /// Lifetime of access tokens
    pub access_ttl: Duration,

    /// Lifetime of refresh tokens
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Lifetime configured for a token type
    pub fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// A minted token together with its at-rest digest
///
/// `raw_value` is only ever held in memory and handed back to the caller;
/// stores receive `hashed_value`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Signed token string
    pub raw_value: String,

    /// SHA-256 hex digest of `raw_value`
    pub hashed_value: String,

    /// User the token was issued for
    pub subject_id: Uuid,

    /// Token type
    pub token_type: TokenType,

    /// Expiration, truncated to whole seconds to match the `exp` claim
    pub expires_at: DateTime<Utc>,

    /// Revocation time, always `None` for freshly minted credentials
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Credential {
    fn minted(raw_value: String, claims: &Claims, expires_at: DateTime<Utc>) -> Self {
        Self {
            hashed_value: hash_token(&raw_value),
            raw_value,
            subject_id: claims.subject_id,
            token_type: claims.token_type,
            expires_at,
            revoked_at: None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("raw_value", &"<redacted>")
            .field("hashed_value", &self.hashed_value)
            .field("subject_id", &self.subject_id)
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("revoked_at", &self.revoked_at)
            .finish()
    }
}

/// Mints signed tokens for identities
///
/// Pure function of identity, clock and secret: nothing is persisted here.
#[derive(Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Signing configuration
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issues a token of the given type for `identity`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SigningFailure` if the secret is unusable or encoding fails
    pub fn issue(&self, identity: &Identity, token_type: TokenType) -> AuthResult<Credential> {
        self.issue_for(identity.id, token_type)
    }

    /// Issues a token for a subject already known to exist
    ///
    /// Used during rotation, where the validator has just confirmed the subject.
    pub fn issue_for(&self, subject_id: Uuid, token_type: TokenType) -> AuthResult<Credential> {
        let expires_at = Utc::now()
            .checked_add_signed(self.config.ttl(token_type))
            .ok_or_else(|| {
                AuthError::SigningFailure(format!("{} token lifetime out of range", token_type))
            })?
            .trunc_subsecs(0);
        let claims = Claims::new(subject_id, token_type, expires_at);
        let raw_value = self.sign(&claims)?;

        tracing::debug!(
            subject_id = %subject_id,
            token_type = %token_type,
            expires_at = %expires_at,
            "Issued token"
        );

        Ok(Credential::minted(raw_value, &claims, expires_at))
    }

    /// Signs an arbitrary claim set with HS256
    ///
    /// Exposed for callers that need full control over the claims, such as
    /// tests producing already-expired tokens.
    pub fn sign(&self, claims: &Claims) -> AuthResult<String> {
        if self.config.secret.is_empty() {
            return Err(AuthError::SigningFailure(
                "signing secret is empty".to_string(),
            ));
        }

        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(self.config.secret.as_bytes());

        encode(&header, claims, &key)
            .map_err(|e| AuthError::SigningFailure(format!("token encoding failed: {}", e)))
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::error::ErrorKind;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(TokenConfig::new(
            "test-secret-key-at-least-32-bytes-long",
            Duration::minutes(10),
            Duration::hours(48),
        ))
    }

    #[test]
    fn test_token_type_parsing() {
        assert_eq!("access".parse::<TokenType>().unwrap(), TokenType::Access);
        assert_eq!("refresh".parse::<TokenType>().unwrap(), TokenType::Refresh);

        let err = "session".parse::<TokenType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedTokenType);
        assert_eq!(TokenType::Refresh.to_string(), "refresh");
    }

    #[test]
    fn test_claims_wire_format() {
        let subject_id = Uuid::new_v4();
        let claims = Claims::new(subject_id, TokenType::Access, Utc::now());
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["subject_id"], subject_id.to_string());
        assert_eq!(json["type"], "access");
        assert!(json["exp"].is_i64());
        assert!(json["jti"].is_string());
    }

    #[test]
    fn test_issue_uses_configured_ttl() {
        let identity = Identity::new(Uuid::new_v4(), "alice");
        let before = Utc::now();

        let access = issuer().issue(&identity, TokenType::Access).unwrap();
        let refresh = issuer().issue(&identity, TokenType::Refresh).unwrap();

        let access_left = access.expires_at - before;
        assert!(access_left <= Duration::minutes(10));
        assert!(access_left > Duration::minutes(10) - Duration::seconds(5));

        let refresh_left = refresh.expires_at - before;
        assert!(refresh_left <= Duration::hours(48));
        assert!(refresh_left > Duration::hours(48) - Duration::seconds(5));
    }

    #[test]
    fn test_issue_fills_credential() {
        let identity = Identity::new(Uuid::new_v4(), "alice");
        let credential = issuer().issue(&identity, TokenType::Refresh).unwrap();

        assert_eq!(credential.subject_id, identity.id);
        assert_eq!(credential.token_type, TokenType::Refresh);
        assert_eq!(credential.hashed_value, hash_token(&credential.raw_value));
        assert!(credential.revoked_at.is_none());
        assert_eq!(credential.raw_value.split('.').count(), 3);
    }

    #[test]
    fn test_tokens_are_unique() {
        let identity = Identity::new(Uuid::new_v4(), "alice");
        let first = issuer().issue(&identity, TokenType::Refresh).unwrap();
        let second = issuer().issue(&identity, TokenType::Refresh).unwrap();

        assert_ne!(first.raw_value, second.raw_value);
        assert_ne!(first.hashed_value, second.hashed_value);
    }

    #[test]
    fn test_empty_secret_is_signing_failure() {
        let issuer = TokenIssuer::new(TokenConfig::new(
            "",
            Duration::minutes(10),
            Duration::hours(48),
        ));
        let identity = Identity::new(Uuid::new_v4(), "alice");

        let err = issuer.issue(&identity, TokenType::Access).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SigningFailure);
    }

    #[test]
    fn test_unrepresentable_expiry_is_signing_failure() {
        let issuer = TokenIssuer::new(TokenConfig::new(
            "test-secret-key-at-least-32-bytes-long",
            Duration::minutes(10),
            Duration::days(365 * 1_000_000),
        ));

        let err = issuer
            .issue_for(Uuid::new_v4(), TokenType::Refresh)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SigningFailure);
        assert!(issuer.issue_for(Uuid::new_v4(), TokenType::Access).is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let identity = Identity::new(Uuid::new_v4(), "alice");
        let credential = issuer().issue(&identity, TokenType::Access).unwrap();

        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains(&credential.raw_value));
        assert!(rendered.contains("<redacted>"));

        let rendered = format!("{:?}", issuer());
        assert!(!rendered.contains("test-secret-key"));
    }
}
