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
///   "timestamp": "2025-01-01T00:00:00Z"
/// }
/// ```
///
/// Always answers 200; a failed database probe reports `degraded`.

use crate::{app::AppState, extract::Json};
use axum::extract::State;
use chrono::{DateTime, Utc};
use qconvert_shared::db::pool::{get_pool_stats, health_check as db_health_check};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    /// Open pool connections
    pub connections: usize,

    pub timestamp: DateTime<Utc>,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match db_health_check(&state.db).await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            "disconnected"
        }
    };

    let stats = get_pool_stats(&state.db);

    Json(HealthResponse {
        status: if database == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        connections: stats.active_connections + stats.idle_connections,
        timestamp: Utc::now(),
    })
}
