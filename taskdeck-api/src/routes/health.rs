/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active": 1, "idle": 4, "total": 5 }
/// }
/// ```
///
/// Always answers 200; a failed database ping reports `degraded`.

use axum::{extract::State, Json};
use serde::Serialize;
use taskdeck_shared::db::pool::{health_check as ping, pool_stats, PoolStats};
use tracing::warn;

use crate::app::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub pool: PoolStats,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, database) = match ping(&state.db).await {
        Ok(()) => ("healthy", "connected"),
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            ("degraded", "disconnected")
        }
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database,
        pool: pool_stats(&state.db),
    })
}
