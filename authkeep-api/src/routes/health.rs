/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 4, "total_connections": 5 }
/// }
/// ```
///
/// `database` is `"not_configured"` when the server runs without a pool.

use crate::app::AppState;
use authkeep_shared::db::pool::{get_pool_stats, health_check as ping, PoolStats};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,

    #[serde(skip_serializing_if = "Option::is_none", skip_deserializing)]
    pub pool: Option<PoolStats>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (database, pool) = match &state.db {
        Some(db) => match ping(db).await {
            Ok(()) => ("connected", Some(get_pool_stats(db))),
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                ("disconnected", None)
            }
        },
        None => ("not_configured", None),
    };

    Json(HealthResponse {
        status: if database == "disconnected" {
            "degraded".to_string()
        } else {
            "healthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        pool,
    })
}
