/// Token lifecycle
///
/// # Modules
///
/// - [`error`]: error taxonomy shared by every component
/// - [`digest`]: SHA-256 digests of refresh tokens (hash-at-rest)
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: claims, signing configuration and the [`jwt::TokenIssuer`]
/// - [`validator`]: the ordered validation pipeline
/// - [`service`]: register, login, refresh rotation and logout
///
/// # Security Features
///
/// - **Tokens**: HS256 JWTs with a random `jti`, HMAC family enforced on decode
/// - **Refresh Tokens**: stored only as hex SHA-256 digests
/// - **Rotation**: old refresh credential revoked through an atomic gate
/// - **Passwords**: Argon2id PHC strings
///
/// # Example
///
/// ```
/// use authkeep_shared::auth::jwt::{TokenConfig, TokenIssuer};
/// use authkeep_shared::auth::service::AuthService;
/// use authkeep_shared::auth::validator::TokenValidator;
/// use authkeep_shared::store::{MemoryCredentialStore, MemoryUserDirectory};
/// use chrono::Duration;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TokenConfig::new("secret-key-at-least-32-bytes-long!", Duration::minutes(10), Duration::hours(48));
/// let directory = Arc::new(MemoryUserDirectory::new());
/// let store = Arc::new(MemoryCredentialStore::new());
///
/// let service = AuthService::new(
///     TokenIssuer::new(config.clone()),
///     TokenValidator::new(&config, directory.clone()),
///     store,
///     directory,
/// );
///
/// let pair = service.register("alice", "password-1").await?;
/// let rotated = service.refresh(&pair.refresh.raw_value).await?;
/// service.logout(&rotated.pair.refresh.raw_value).await?;
/// # Ok(())
/// # }
/// ```

pub mod digest;
pub mod error;
pub mod jwt;
pub mod password;
pub mod service;
pub mod validator;
