//! Per-IP request throttling for the HTTP surface.
//!
//! This protects the service itself. The upstream provider quota is enforced
//! separately by the pipeline's shared rate limiter.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

pub type IpRateLimitLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Token bucket for the public image read route.
///
/// # Limits
///
/// - **Rate**: 1 token every 100ms per client IP
/// - **Burst**: 60 requests
///
/// A vocabulary page loads many images at once, hence the generous burst.
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Example
///
/// ```rust,ignore
/// let public = Router::new()
///     .route("/images/{word}", get(get_image_handler))
///     .layer(rate_limit::public_layer());
/// ```
pub fn public_layer() -> IpRateLimitLayer {
    build(100, 60)
}

/// Stricter bucket for the admin routes.
///
/// # Limits
///
/// - **Rate**: 1 token per second per client IP
/// - **Burst**: 10 requests
///
/// Cache stats and eviction scan the whole keyspace, so they stay cheap to
/// call only when called rarely.
pub fn admin_layer() -> IpRateLimitLayer {
    build(1000, 10)
}

fn build(replenish_ms: u64, burst: u32) -> IpRateLimitLayer {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_ms)
            .burst_size(burst)
            .finish()
            .expect("governor quota is non-zero"),
    );

    GovernorLayer::new(governor_conf)
}
