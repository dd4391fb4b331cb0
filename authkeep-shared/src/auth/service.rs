/// Session orchestration
///
/// [`AuthService`] composes the issuer, the validator and the two injected
/// collaborators into the four session operations: register, login, refresh
/// and logout.
///
/// # Refresh Rotation
///
/// A refresh credential moves `Active -> Revoked` or `Active -> Expired`; both
/// are terminal. Rotation mints and persists the replacement first and only
/// then revokes the presented credential through
/// [`CredentialStore::revoke_if_active`]. That call is the serialization point
/// for concurrent refreshes of the same value: exactly one caller flips the
/// old record and keeps its new pair. A caller that loses revokes the
/// replacement it just persisted and fails with `InvalidToken`.
///
/// | Step | Failure | Outcome |
/// |------|---------|---------|
/// | validate (refresh profile) | any | error, nothing changed |
/// | lookup by digest | unknown, revoked, other subject | `InvalidToken` |
/// | lookup by digest | stored expiry passed | `TokenExpired` |
/// | mint pair / persist new digest | any | error, old credential still active |
/// | revoke old digest | lost race | `InvalidToken`, new digest revoked |
/// | revoke old digest | store error | new pair plus `revoke_warning` |

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::digest::{digest_prefix, hash_token};
use super::error::{AuthError, AuthResult, Operation};
use super::jwt::{Credential, TokenIssuer, TokenType};
use super::validator::{TokenValidator, ValidationOptions};
use crate::store::{CredentialStore, Identity, UserDirectory, UserFilter};

/// Access and refresh credentials minted together
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: Credential,
    pub refresh: Credential,
}

/// Result of a successful rotation
#[derive(Debug)]
pub struct RefreshOutcome {
    /// The new pair, usable immediately
    pub pair: TokenPair,

    /// Set when the old credential could not be revoked because the store
    /// failed. The new pair is still valid; the old one stays usable until it
    /// expires or a later revoke succeeds.
    pub revoke_warning: Option<AuthError>,
}

impl RefreshOutcome {
    pub fn is_clean(&self) -> bool {
        self.revoke_warning.is_none()
    }
}

/// Register / login / refresh / logout over injected collaborators
pub struct AuthService {
    issuer: TokenIssuer,
    validator: TokenValidator,
    store: Arc<dyn CredentialStore>,
    directory: Arc<dyn UserDirectory>,
}

impl AuthService {
    pub fn new(
        issuer: TokenIssuer,
        validator: TokenValidator,
        store: Arc<dyn CredentialStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            issuer,
            validator,
            store,
            directory,
        }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Registers a login and opens a session for it
    ///
    /// # Errors
    ///
    /// - `LoginTaken` if the login exists; nothing is minted or stored
    /// - `SigningFailure` / `StorageFailure` from minting or persisting
    pub async fn register(&self, login: &str, password: &str) -> AuthResult<TokenPair> {
        let identity = self
            .directory
            .create(login, password)
            .await
            .map_err(|e| e.during(Operation::Register))?;

        let pair = self
            .open_session(identity.id)
            .await
            .map_err(|e| e.during(Operation::Register))?;

        tracing::info!(user_id = %identity.id, login = %identity.login, "User registered");

        Ok(pair)
    }

    /// Verifies a login/password pair and opens a session
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for an unknown login or wrong password; nothing is minted
    /// - `SigningFailure` / `StorageFailure` from minting or persisting
    pub async fn login(&self, login: &str, password: &str) -> AuthResult<TokenPair> {
        if let Err(e) = self.directory.check_password(login, password).await {
            tracing::debug!(login = %login, error = %e, "Login rejected");
            return Err(e.during(Operation::Login));
        }

        let identity = self
            .directory
            .find(&UserFilter::by_login(login))
            .await
            .map_err(|e| e.during(Operation::Login))?;

        let pair = self
            .open_session(identity.id)
            .await
            .map_err(|e| e.during(Operation::Login))?;

        tracing::info!(user_id = %identity.id, "User logged in");

        Ok(pair)
    }

    /// Exchanges a refresh token for a new pair, revoking the old one
    ///
    /// # Errors
    ///
    /// - any validation error for the refresh profile
    /// - `InvalidToken` for an unknown, revoked or foreign credential, and for
    ///   the loser of a concurrent rotation
    /// - `TokenExpired` if the stored record has expired
    /// - `SigningFailure` / `StorageFailure` before the old credential was touched
    pub async fn refresh(&self, old_raw: &str) -> AuthResult<RefreshOutcome> {
        let claims = self
            .validator
            .validate(old_raw, ValidationOptions::refresh())
            .await
            .map_err(|e| e.during(Operation::Refresh))?;

        let old_hash = hash_token(old_raw);
        let stored = self
            .store
            .find(&old_hash)
            .await
            .map_err(|e| e.during(Operation::Refresh))?;

        let stored = match stored {
            Some(stored) if stored.subject_id == claims.subject_id && !stored.is_revoked() => {
                stored
            }
            _ => {
                tracing::warn!(
                    user_id = %claims.subject_id,
                    token = %digest_prefix(&old_hash),
                    "Refresh with unknown or revoked credential"
                );
                return Err(AuthError::InvalidToken.during(Operation::Refresh));
            }
        };

        if stored.is_expired() {
            return Err(AuthError::TokenExpired.during(Operation::Refresh));
        }

        let pair = self
            .open_session(claims.subject_id)
            .await
            .map_err(|e| e.during(Operation::Refresh))?;

        match self.store.revoke_if_active(&old_hash).await {
            Ok(true) => {
                tracing::info!(
                    user_id = %claims.subject_id,
                    revoked = %digest_prefix(&old_hash),
                    issued = %digest_prefix(&pair.refresh.hashed_value),
                    "Refresh token rotated"
                );
                Ok(RefreshOutcome {
                    pair,
                    revoke_warning: None,
                })
            }
            Ok(false) => {
                tracing::warn!(
                    user_id = %claims.subject_id,
                    token = %digest_prefix(&old_hash),
                    "Refresh token already rotated by a concurrent request"
                );
                if let Err(e) = self.store.revoke(&pair.refresh.hashed_value).await {
                    tracing::error!(
                        error = %e,
                        token = %digest_prefix(&pair.refresh.hashed_value),
                        "Failed to revoke orphaned refresh token"
                    );
                }
                Err(AuthError::InvalidToken.during(Operation::Refresh))
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %claims.subject_id,
                    error = %e,
                    token = %digest_prefix(&old_hash),
                    "Old refresh token not revoked after rotation"
                );
                Ok(RefreshOutcome {
                    pair,
                    revoke_warning: Some(e.during(Operation::Refresh)),
                })
            }
        }
    }

    /// Ends a session by revoking its refresh credential
    ///
    /// Validation errors propagate. Revocation failures are logged and
    /// swallowed: once the token has been shown to be a genuine refresh token
    /// the caller is considered logged out.
    pub async fn logout(&self, refresh_raw: &str) -> AuthResult<()> {
        let claims = self
            .validator
            .validate(refresh_raw, ValidationOptions::refresh())
            .await
            .map_err(|e| e.during(Operation::Logout))?;

        let token_hash = hash_token(refresh_raw);
        match self.store.revoke(&token_hash).await {
            Ok(()) => {
                tracing::info!(user_id = %claims.subject_id, "User logged out");
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %claims.subject_id,
                    error = %e,
                    token = %digest_prefix(&token_hash),
                    "Logout could not revoke refresh token"
                );
            }
        }

        Ok(())
    }

    /// Resolves a bearer access token to its identity
    ///
    /// Equivalent to the access profile, returning the directory entry that
    /// the existence check fetched.
    pub async fn authenticate(&self, access_raw: &str) -> AuthResult<Identity> {
        let claims = self
            .validator
            .validate(
                access_raw,
                ValidationOptions::default().with_type(TokenType::Access),
            )
            .await?;

        self.directory.find(&UserFilter::by_id(claims.subject_id)).await
    }

    /// Mints a pair and persists the refresh digest
    async fn open_session(&self, subject_id: Uuid) -> AuthResult<TokenPair> {
        let access = self.issuer.issue_for(subject_id, TokenType::Access)?;
        let refresh = self.issuer.issue_for(subject_id, TokenType::Refresh)?;

        self.store
            .save(&refresh.hashed_value, subject_id, refresh.expires_at)
            .await?;

        Ok(TokenPair { access, refresh })
    }
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}
