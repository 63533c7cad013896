//! Handlers for the operator endpoints.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::images::ClearCacheResponse;
use crate::application::services::{CacheStats, QueueStatus};
use crate::error::AppError;
use crate::state::AppState;

/// Queue depth, quota use and worker activity.
///
/// # Endpoint
///
/// `GET /api/images/status`
///
/// # Response
///
/// ```json
/// {
///   "priority_len": 1,
///   "normal_len": 97,
///   "requests_this_hour": 12,
///   "max_per_hour": 25,
///   "seconds_until_reset": 1804,
///   "is_lock_held": true
/// }
/// ```
///
/// `requests_this_hour` is `18446744073709551615` when the counter cannot be
/// read; the worker treats that state as exhausted.
pub async fn status_handler(State(state): State<AppState>) -> Result<Json<QueueStatus>, AppError> {
    Ok(Json(state.admin.queue_status().await?))
}

/// Entry count and size, with the success/failure split estimated from a sample.
///
/// # Endpoint
///
/// `GET /api/images/cache/stats`
pub async fn cache_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<CacheStats>, AppError> {
    Ok(Json(state.admin.cache_stats().await?))
}

/// Evicts every cached outcome.
///
/// # Endpoint
///
/// `DELETE /api/images/cache`
pub async fn clear_cache_handler(
    State(state): State<AppState>,
) -> Result<Json<ClearCacheResponse>, AppError> {
    let removed = state.admin.clear_cache(None).await?;
    Ok(Json(ClearCacheResponse { removed }))
}

/// Evicts the cached outcome for one word, making it eligible again.
///
/// # Endpoint
///
/// `DELETE /api/images/cache/{word}`
///
/// Returns `removed: 0` when nothing was cached for the word.
pub async fn clear_cache_word_handler(
    Path(word): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ClearCacheResponse>, AppError> {
    let removed = state.admin.clear_cache(Some(&word)).await?;
    Ok(Json(ClearCacheResponse { removed }))
}
