/// In-memory collaborators
///
/// Process-local implementations of [`UserDirectory`] and [`CredentialStore`].
/// They honour the same contracts as the PostgreSQL implementations, including
/// the atomic `revoke_if_active` gate, and expose switches that make calls
/// fail so error paths can be exercised.
///
/// # Example
///
/// ```
/// use authkeep_shared::store::{CredentialStore, MemoryCredentialStore};
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryCredentialStore::new();
/// store.save("digest", Uuid::new_v4(), Utc::now() + Duration::hours(1)).await?;
///
/// assert!(store.revoke_if_active("digest").await?);
/// assert!(!store.revoke_if_active("digest").await?);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CredentialStore, Identity, StoredCredential, UserDirectory, UserFilter};
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::password;

struct UserRecord {
    identity: Identity,
    password_hash: String,
}

/// In-memory [`UserDirectory`] with Argon2id password hashes
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<HashMap<String, UserRecord>>,
    unavailable: AtomicBool,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StorageFailure`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Removes a user, as an administrator deleting an account would
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|_, record| record.identity.id != id);
        users.len() != before
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }

    fn check_available(&self) -> AuthResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::StorageFailure(
                "user directory unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn create(&self, login: &str, password: &str) -> AuthResult<Identity> {
        self.check_available()?;

        if self.users.lock().await.contains_key(login) {
            return Err(AuthError::LoginTaken);
        }

        // Hash outside the lock; the insert below re-checks the login.
        let password_hash = password::hash_password_blocking(password).await?;
        let identity = Identity::new(Uuid::new_v4(), login);

        let mut users = self.users.lock().await;
        if users.contains_key(login) {
            return Err(AuthError::LoginTaken);
        }
        users.insert(
            login.to_string(),
            UserRecord {
                identity: identity.clone(),
                password_hash,
            },
        );

        Ok(identity)
    }

    async fn find(&self, filter: &UserFilter) -> AuthResult<Identity> {
        self.check_available()?;

        if filter.is_empty() {
            return Err(AuthError::StorageFailure(
                "user filter has no criteria".to_string(),
            ));
        }

        self.users
            .lock()
            .await
            .values()
            .map(|record| &record.identity)
            .find(|identity| filter.matches(identity))
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    async fn check_password(&self, login: &str, password: &str) -> AuthResult<()> {
        self.check_available()?;

        let password_hash = self
            .users
            .lock()
            .await
            .get(login)
            .map(|record| record.password_hash.clone())
            .ok_or(AuthError::InvalidCredentials)?;

        if password::verify_password_blocking(password, &password_hash).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// In-memory [`CredentialStore`]
#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<HashMap<String, StoredCredential>>,
    fail_saves: AtomicBool,
    fail_finds: AtomicBool,
    fail_revokes: AtomicBool,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `save` fail with `StorageFailure`
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Makes `find` fail with `StorageFailure`
    pub fn set_fail_finds(&self, fail: bool) {
        self.fail_finds.store(fail, Ordering::SeqCst);
    }

    /// Makes `revoke` and `revoke_if_active` fail with `StorageFailure`
    pub fn set_fail_revokes(&self, fail: bool) {
        self.fail_revokes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.credentials.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.credentials.lock().await.is_empty()
    }

    /// Number of records that are neither revoked nor expired
    pub async fn active_count(&self) -> usize {
        self.credentials
            .lock()
            .await
            .values()
            .filter(|c| c.is_active())
            .count()
    }

    fn injected(flag: &AtomicBool, operation: &str) -> AuthResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(AuthError::StorageFailure(format!(
                "injected {} failure",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(
        &self,
        token_hash: &str,
        subject_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        Self::injected(&self.fail_saves, "save")?;

        let mut credentials = self.credentials.lock().await;
        if credentials.contains_key(token_hash) {
            return Err(AuthError::StorageFailure(
                "duplicate token hash".to_string(),
            ));
        }
        credentials.insert(
            token_hash.to_string(),
            StoredCredential {
                subject_id,
                expires_at,
                revoked_at: None,
            },
        );
        Ok(())
    }

    async fn find(&self, token_hash: &str) -> AuthResult<Option<StoredCredential>> {
        Self::injected(&self.fail_finds, "find")?;
        Ok(self.credentials.lock().await.get(token_hash).cloned())
    }

    async fn revoke(&self, token_hash: &str) -> AuthResult<()> {
        Self::injected(&self.fail_revokes, "revoke")?;

        if let Some(credential) = self.credentials.lock().await.get_mut(token_hash) {
            credential.revoked_at.get_or_insert_with(Utc::now);
        }
        Ok(())
    }

    async fn revoke_if_active(&self, token_hash: &str) -> AuthResult<bool> {
        Self::injected(&self.fail_revokes, "revoke")?;

        let mut credentials = self.credentials.lock().await;
        match credentials.get_mut(token_hash) {
            Some(credential) if credential.is_active() => {
                credential.revoked_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_stale(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let mut credentials = self.credentials.lock().await;
        let before = credentials.len();
        credentials.retain(|_, c| {
            c.expires_at >= cutoff && c.revoked_at.map_or(true, |at| at >= cutoff)
        });
        Ok((before - credentials.len()) as u64)
    }
}
