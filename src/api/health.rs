//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::AppState;
use crate::db;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub error_requests: u64,
    pub avg_response_time_ms: f64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /api/v1/health
///
/// Always 200; `status` is "degraded" when the database does not answer.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = match db::ping(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Health check database ping failed: {:#}", e);
            false
        }
    };
    let stats = &state.request_stats;

    Json(HealthResponse {
        status: if database_ok { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if database_ok { "ok" } else { "unavailable" },
        uptime_seconds: stats.uptime_seconds(),
        total_requests: stats.total_requests(),
        error_requests: stats.error_requests(),
        avg_response_time_ms: stats.avg_response_time_us() / 1000.0,
    })
}
