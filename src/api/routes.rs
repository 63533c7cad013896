//! API route configuration.
//!
//! Routes are relative to the `/api` prefix applied in [`crate::routes`].

use crate::api::handlers::{
    cache_stats_handler, clear_cache_handler, clear_cache_word_handler, enqueue_handler,
    get_image_handler, status_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Image reads, open to every client.
///
/// - `GET /images/{word}` - Cached image, or `202` and a priority enqueue
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/images/{word}", get(get_image_handler))
}

/// Operator routes, protected by the admin bearer token.
///
/// # Endpoints
///
/// - `POST   /images/enqueue`      - Queue a word
/// - `GET    /images/status`       - Queue depth, quota and lock state
/// - `GET    /images/cache/stats`  - Cache size summary
/// - `DELETE /images/cache`        - Evict every cached outcome
/// - `DELETE /images/cache/{word}` - Evict one word
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/images/enqueue", post(enqueue_handler))
        .route("/images/status", get(status_handler))
        .route("/images/cache/stats", get(cache_stats_handler))
        .route("/images/cache", delete(clear_cache_handler))
        .route("/images/cache/{word}", delete(clear_cache_word_handler))
}
