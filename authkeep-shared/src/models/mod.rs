/// PostgreSQL-backed collaborators
///
/// - `user`: the `users` table and [`user::PgUserDirectory`]
/// - `refresh_token`: the `refresh_tokens` table and [`refresh_token::PgCredentialStore`]
///
/// # Example
///
/// ```no_run
/// use authkeep_shared::db::pool::{create_pool, DatabaseConfig};
/// use authkeep_shared::models::{PgCredentialStore, PgUserDirectory};
/// use authkeep_shared::store::UserDirectory;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new("postgresql://localhost/authkeep")).await?;
/// let directory = PgUserDirectory::new(pool.clone());
/// let store = PgCredentialStore::new(pool);
///
/// let identity = directory.create("alice", "password-1").await?;
/// # Ok(())
/// # }
/// ```

pub mod refresh_token;
pub mod user;

pub use refresh_token::PgCredentialStore;
pub use user::PgUserDirectory;
