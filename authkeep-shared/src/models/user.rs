/// User accounts
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     login VARCHAR(64) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::password;
use crate::store::{Identity, UserDirectory, UserFilter};

/// Width of the `login` column
pub const MAX_LOGIN_LEN: u64 = 64;

/// A row of the `users` table
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    pub login: String,

    /// Argon2id PHC string; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Inserts a user with an already-hashed password
    ///
    /// # Errors
    ///
    /// A duplicate login surfaces as a unique violation from PostgreSQL.
    pub async fn create(
        pool: &PgPool,
        login: &str,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, login, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, login, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(login)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, login, password_hash, created_at, updated_at FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(pool)
        .await
    }

    /// Looks up a user matching every criterion of `filter`
    pub async fn find_by_filter(
        pool: &PgPool,
        filter: &UserFilter,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, password_hash, created_at, updated_at
            FROM users
            WHERE ($1::uuid IS NULL OR id = $1)
              AND ($2::text IS NULL OR login = $2)
            "#,
        )
        .bind(filter.id)
        .bind(filter.login.as_deref())
        .fetch_optional(pool)
        .await
    }

    /// Deletes a user; their refresh tokens cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.login.clone())
    }
}

/// [`UserDirectory`] over the `users` table
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn create(&self, login: &str, password: &str) -> AuthResult<Identity> {
        let password_hash = password::hash_password_blocking(password).await?;

        match User::create(&self.pool, login, &password_hash).await {
            Ok(user) => Ok(user.identity()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AuthError::LoginTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, filter: &UserFilter) -> AuthResult<Identity> {
        if filter.is_empty() {
            return Err(AuthError::StorageFailure(
                "user filter has no criteria".to_string(),
            ));
        }

        User::find_by_filter(&self.pool, filter)
            .await?
            .map(|user| user.identity())
            .ok_or(AuthError::UserNotFound)
    }

    async fn check_password(&self, login: &str, password: &str) -> AuthResult<()> {
        let user = User::find_by_login(&self.pool, login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if password::verify_password_blocking(password, &user.password_hash).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
