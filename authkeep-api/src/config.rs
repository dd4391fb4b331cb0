/// Configuration management for the API server
///
/// Configuration is read from environment variables; a `.env` file is loaded
/// first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: HMAC signing secret, at least 32 characters (required)
/// - `ACCESS_TOKEN_TTL_SECONDS`: Access token lifetime (default: 900)
/// - `REFRESH_TOKEN_TTL_SECONDS`: Refresh token lifetime (default: 2592000)
/// - `LOGIN_MIN_LEN` / `LOGIN_MAX_LEN`: Login length policy (default: 3 / 64)
/// - `PASSWORD_MIN_LEN` / `PASSWORD_MAX_LEN`: Password length policy (default: 8 / 128)
/// - `RUST_LOG`: Log filter (default: authkeep_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use authkeep_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use authkeep_shared::auth::jwt::{TokenConfig, MAX_TOKEN_TTL_SECONDS};
use authkeep_shared::models::user::MAX_LOGIN_LEN;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub credentials: CredentialsPolicy,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Token signing configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret shared by issuer and validator
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub access_ttl_seconds: i64,

    pub refresh_ttl_seconds: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

/// Length bounds applied to registration requests, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsPolicy {
    pub login_min_len: u64,
    pub login_max_len: u64,
    pub password_min_len: u64,
    pub password_max_len: u64,
}

impl Default for CredentialsPolicy {
    fn default() -> Self {
        Self {
            login_min_len: 3,
            login_max_len: 64,
            password_min_len: 8,
            password_max_len: 128,
        }
    }
}

/// Reads an optional variable, falling back to `default`
fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or the values are inconsistent (see [`Config::validate`])
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        let defaults = CredentialsPolicy::default();

        let config = Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("API_PORT", 8080)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_ttl_seconds: env_or("ACCESS_TOKEN_TTL_SECONDS", 900)?,
                refresh_ttl_seconds: env_or("REFRESH_TOKEN_TTL_SECONDS", 2_592_000)?,
            },
            credentials: CredentialsPolicy {
                login_min_len: env_or("LOGIN_MIN_LEN", defaults.login_min_len)?,
                login_max_len: env_or("LOGIN_MAX_LEN", defaults.login_max_len)?,
                password_min_len: env_or("PASSWORD_MIN_LEN", defaults.password_min_len)?,
                password_max_len: env_or("PASSWORD_MAX_LEN", defaults.password_max_len)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        if self.jwt.access_ttl_seconds <= 0 {
            anyhow::bail!("ACCESS_TOKEN_TTL_SECONDS must be positive");
        }
        if self.jwt.refresh_ttl_seconds <= self.jwt.access_ttl_seconds {
            anyhow::bail!("REFRESH_TOKEN_TTL_SECONDS must exceed ACCESS_TOKEN_TTL_SECONDS");
        }
        if self.jwt.refresh_ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            anyhow::bail!(
                "REFRESH_TOKEN_TTL_SECONDS must be at most {}",
                MAX_TOKEN_TTL_SECONDS
            );
        }

        let policy = &self.credentials;
        if policy.login_min_len == 0 || policy.login_min_len > policy.login_max_len {
            anyhow::bail!("LOGIN_MIN_LEN must be between 1 and LOGIN_MAX_LEN");
        }
        if policy.login_max_len > MAX_LOGIN_LEN {
            anyhow::bail!("LOGIN_MAX_LEN must be at most {}", MAX_LOGIN_LEN);
        }
        if policy.password_min_len == 0 || policy.password_min_len > policy.password_max_len {
            anyhow::bail!("PASSWORD_MIN_LEN must be between 1 and PASSWORD_MAX_LEN");
        }

        Ok(())
    }

    /// Signing configuration for the issuer and validator
    ///
    /// Lifetimes are clamped to `MAX_TOKEN_TTL_SECONDS` for configs that
    /// skipped [`Config::validate`].
    pub fn token_config(&self) -> TokenConfig {
        let ttl = |seconds: i64| chrono::Duration::seconds(seconds.min(MAX_TOKEN_TTL_SECONDS));

        TokenConfig::new(
            self.jwt.secret.clone(),
            ttl(self.jwt.access_ttl_seconds),
            ttl(self.jwt.refresh_ttl_seconds),
        )
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
