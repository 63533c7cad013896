//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Store**: PING against the backing store
/// 2. **Queue**: Lane depths
/// 3. **Provider**: Which image provider is active (informational)
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "store": { "status": "ok", "message": "Store reachable" },
///     "queue": {
///       "status": "ok",
///       "depth": { "priority": 0, "normal": 42, "total": 42 }
///     },
///     "provider": { "status": "ok", "message": "unsplash" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_check = check_store(&state).await;

    let queue_check = check_queue(&state).await;

    let provider_check = CheckStatus::ok(state.pipeline.provider_name());

    let all_healthy = store_check.is_ok() && queue_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            store: store_check,
            queue: queue_check,
            provider: provider_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks store connectivity via PING.
async fn check_store(state: &AppState) -> CheckStatus {
    if state.pipeline.store().health_check().await {
        CheckStatus::ok("Store reachable")
    } else {
        CheckStatus::error("Store connection failed")
    }
}

/// Reports lane depths.
async fn check_queue(state: &AppState) -> CheckStatus {
    match state.pipeline.queue().length().await {
        Ok(depth) => CheckStatus {
            depth: Some(depth),
            ..CheckStatus::ok(format!("{} jobs waiting", depth.total))
        },
        Err(e) => CheckStatus::error(format!("Queue error: {}", e)),
    }
}
