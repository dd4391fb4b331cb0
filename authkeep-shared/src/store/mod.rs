/// Collaborator contracts for the auth core
///
/// The orchestrator never talks to a database directly. It depends on two
/// capability traits that are injected through constructors:
///
/// - [`UserDirectory`]: identities and password checks
/// - [`CredentialStore`]: refresh credentials, keyed by their SHA-256 digest
///
/// PostgreSQL implementations live in [`crate::models`]; in-memory
/// implementations for tests and local experiments live in [`memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthResult;

pub mod memory;

pub use memory::{MemoryCredentialStore, MemoryUserDirectory};

/// A user identity as seen by the auth core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique user ID
    pub id: Uuid,

    /// Login name
    pub login: String,
}

impl Identity {
    pub fn new(id: Uuid, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
        }
    }
}

/// Lookup criteria for [`UserDirectory::find`]
///
/// All present fields must match. A filter with no fields is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub id: Option<Uuid>,
    pub login: Option<String>,
}

impl UserFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            login: None,
        }
    }

    pub fn by_login(login: impl Into<String>) -> Self {
        Self {
            id: None,
            login: Some(login.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.login.is_none()
    }

    /// Checks an identity against every present criterion
    pub fn matches(&self, identity: &Identity) -> bool {
        self.id.map_or(true, |id| id == identity.id)
            && self
                .login
                .as_deref()
                .map_or(true, |login| login == identity.login)
    }
}

/// Persisted view of a refresh credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub subject_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Neither revoked nor expired
    pub fn is_active(&self) -> bool {
        !self.is_revoked() && !self.is_expired()
    }
}

/// Identity provider consulted by the orchestrator and the validator
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Registers a new login
    ///
    /// Fails with `AuthError::LoginTaken` if the login already exists.
    async fn create(&self, login: &str, password: &str) -> AuthResult<Identity>;

    /// Finds the identity matching `filter`
    ///
    /// Fails with `AuthError::UserNotFound` when nothing matches.
    async fn find(&self, filter: &UserFilter) -> AuthResult<Identity>;

    /// Verifies a login/password combination
    ///
    /// Fails with `AuthError::InvalidCredentials` for an unknown login or a wrong password.
    async fn check_password(&self, login: &str, password: &str) -> AuthResult<()>;
}

/// Hash-at-rest storage of refresh credentials
///
/// Every method is keyed by the hex SHA-256 digest of the raw token value.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persists a new, active credential
    async fn save(
        &self,
        token_hash: &str,
        subject_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Looks up a credential by digest
    async fn find(&self, token_hash: &str) -> AuthResult<Option<StoredCredential>>;

    /// Marks a credential revoked
    ///
    /// Idempotent: revoking an already-revoked or unknown digest succeeds and
    /// never moves an existing `revoked_at`.
    async fn revoke(&self, token_hash: &str) -> AuthResult<()>;

    /// Atomically revokes the credential iff it is currently active
    ///
    /// Returns `true` only for the single caller that performed the
    /// `Active -> Revoked` transition. Concurrent callers racing on the same
    /// digest observe `false`.
    async fn revoke_if_active(&self, token_hash: &str) -> AuthResult<bool>;

    /// Deletes credentials that expired or were revoked before `cutoff`
    ///
    /// Returns the number of deleted records.
    async fn purge_stale(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}
