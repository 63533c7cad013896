//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`              - Store connectivity and queue depth (public)
//! - `GET  /api/images/{word}`   - Image read (public, per-IP throttled)
//! - `/api/images/*`             - Operator API (admin bearer token required)
//!
//! Static segments win over `{word}`, so `/api/images/status` always reaches
//! the admin route.
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket, stricter on admin routes
//! - **Authentication** - Admin bearer token
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// Rate limiting keys on the peer socket address, so the router must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let admin = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::admin_layer());

    let public = api::routes::public_routes().layer(rate_limit::public_layer());

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", Router::new().merge(admin).merge(public))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
