/// Refresh token janitor
///
/// Revoked and expired refresh records are terminal: they can never become
/// usable again, so keeping them only serves auditing. The janitor deletes
/// records that left the `Active` state more than `retention` ago.
///
/// The first sweep runs immediately, then every `interval`. A failed sweep is
/// logged and retried on the next tick.
///
/// # Example
///
/// ```no_run
/// use authkeep_janitor::janitor::{Janitor, JanitorConfig};
/// use authkeep_shared::store::MemoryCredentialStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let janitor = Janitor::new(Arc::new(MemoryCredentialStore::new()), JanitorConfig::default());
/// let shutdown = janitor.shutdown_token();
///
/// let handle = tokio::spawn(async move { janitor.run().await });
/// shutdown.cancel();
/// handle.await??;
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use authkeep_shared::{auth::error::AuthResult, store::CredentialStore};
use chrono::Utc;
use std::env;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Retention is capped at roughly a century
const MAX_RETENTION_SECS: u64 = 100 * 365 * 24 * 3600;

/// Janitor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JanitorConfig {
    /// Seconds between sweeps
    pub interval_secs: u64,

    /// Seconds a dead record is kept before deletion
    pub retention_secs: u64,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        JanitorConfig {
            interval_secs: 3600,
            retention_secs: 604_800,
        }
    }
}

impl JanitorConfig {
    /// Reads `JANITOR_INTERVAL_SECONDS` and `JANITOR_RETENTION_SECONDS`
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let interval_secs = match env::var("JANITOR_INTERVAL_SECONDS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("JANITOR_INTERVAL_SECONDS must be a whole number of seconds")?,
            Err(_) => defaults.interval_secs,
        };
        let retention_secs = match env::var("JANITOR_RETENTION_SECONDS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("JANITOR_RETENTION_SECONDS must be a whole number of seconds")?,
            Err(_) => defaults.retention_secs,
        };

        if interval_secs == 0 {
            anyhow::bail!("JANITOR_INTERVAL_SECONDS must be positive");
        }

        Ok(Self {
            interval_secs,
            retention_secs,
        })
    }
}

/// Sweeps stale refresh records until cancelled
pub struct Janitor {
    store: Arc<dyn CredentialStore>,
    config: JanitorConfig,
    shutdown_token: CancellationToken,
}

impl Janitor {
    pub fn new(store: Arc<dyn CredentialStore>, config: JanitorConfig) -> Self {
        Janitor {
            store,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token that stops [`Janitor::run`] when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs one sweep, returning the number of deleted records
    pub async fn sweep_once(&self) -> AuthResult<u64> {
        let retention_secs = self.config.retention_secs.min(MAX_RETENTION_SECS) as i64;
        let retention = chrono::Duration::seconds(retention_secs);
        let cutoff = Utc::now() - retention;

        let purged = self.store.purge_stale(cutoff).await?;
        if purged > 0 {
            tracing::info!(purged, cutoff = %cutoff, "Purged stale refresh tokens");
        } else {
            tracing::debug!(cutoff = %cutoff, "No stale refresh tokens");
        }

        Ok(purged)
    }

    /// Sweeps on every tick until the shutdown token is cancelled
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            retention_secs = self.config.retention_secs,
            "Janitor starting"
        );

        let mut ticker = interval(Duration::from_secs(self.config.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Janitor shut down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!(error = %e, "Sweep failed");
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authkeep_shared::store::MemoryCredentialStore;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    async fn seeded_store() -> Arc<MemoryCredentialStore> {
        let store = Arc::new(MemoryCredentialStore::new());
        let subject = Uuid::new_v4();
        let now = Utc::now();

        store.save("live", subject, now + ChronoDuration::hours(1)).await.unwrap();
        store.save("recently-expired", subject, now - ChronoDuration::hours(1)).await.unwrap();
        store.save("long-expired", subject, now - ChronoDuration::days(30)).await.unwrap();
        store
    }

    #[test]
    fn test_config_default() {
        let config = JanitorConfig::default();
        assert_eq!(config.interval_secs, 3600);
        assert_eq!(config.retention_secs, 604_800);
    }

    #[tokio::test]
    async fn test_sweep_once_respects_retention() {
        let store = seeded_store().await;
        let janitor = Janitor::new(store.clone(), JanitorConfig::default());

        assert_eq!(janitor.sweep_once().await.unwrap(), 1);
        assert!(store.find("long-expired").await.unwrap().is_none());
        assert!(store.find("recently-expired").await.unwrap().is_some());
        assert!(store.find("live").await.unwrap().is_some());

        assert_eq!(janitor.sweep_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_retention_purges_all_dead_records() {
        let store = seeded_store().await;
        store.revoke("live").await.unwrap();

        let janitor = Janitor::new(
            store.clone(),
            JanitorConfig {
                interval_secs: 60,
                retention_secs: 0,
            },
        );

        // revoked_at was set a moment ago, so it sits right at the cutoff
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(janitor.sweep_once().await.unwrap(), 3);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sweeps_and_stops_on_cancel() {
        let store = seeded_store().await;
        let janitor = Janitor::new(store.clone(), JanitorConfig::default());
        let shutdown = janitor.shutdown_token();

        let handle = tokio::spawn(async move { janitor.run().await });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(store.len().await, 2);

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }
}
