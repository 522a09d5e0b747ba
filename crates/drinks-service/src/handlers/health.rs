//! Health check handlers.
//!
//! Provides endpoints for liveness and readiness probes.

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::instrument;

/// Liveness probe.
///
/// Returns "OK" whenever the process is serving requests; does not touch the
/// database.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe.
///
/// Pings the database through the repository.
///
/// ## Response
///
/// - 200 `{"status": "ready", "database": "healthy"}`
/// - 503 `{"status": "not_ready", "database": "unhealthy"}`
#[instrument(skip_all, name = "drinks.health.ready")]
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    match state.repository.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready".to_string(),
                database: "healthy".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "drinks.health", error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready".to_string(),
                    database: "unhealthy".to_string(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_is_ok() {
        assert_eq!(health_check().await, "OK");
    }
}
