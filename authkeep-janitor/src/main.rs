//! # AuthKeep Janitor
//!
//! Deletes refresh token records that expired or were revoked longer ago than
//! the retention window.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... cargo run -p authkeep-janitor
//! ```

use authkeep_janitor::janitor::{Janitor, JanitorConfig};
use authkeep_shared::{
    db::pool::{close_pool, create_pool, DatabaseConfig},
    models::PgCredentialStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authkeep_janitor=debug,authkeep_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "AuthKeep Janitor v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
    let config = JanitorConfig::from_env()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: 2,
        ..DatabaseConfig::new(database_url)
    })
    .await?;

    let janitor = Janitor::new(Arc::new(PgCredentialStore::new(pool.clone())), config);
    let shutdown = janitor.shutdown_token();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
        shutdown.cancel();
    });

    janitor.run().await?;
    close_pool(pool).await;

    Ok(())
}
