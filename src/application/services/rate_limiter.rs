//! Global upstream request ceiling shared by every worker process.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::domain::clock::Clock;
use crate::infrastructure::store::StateStore;

/// Prefix of the per-bucket counter keys.
pub const RATE_KEY_PREFIX: &str = "image_rate:";

/// Value reported by [`RateLimiter::current_count`] when the store cannot be
/// read. Anything comparing it against the ceiling sees "saturated".
pub const UNKNOWN_COUNT: u64 = u64::MAX;

/// Fixed-window counter of upstream search requests.
///
/// Each window gets its own key (`image_rate:<bucket>`, where the bucket is
/// `unix_time / window`), so rollover needs no reset. The first increment
/// in a bucket sets the key to expire after two windows to tolerate clock
/// skew between processes.
///
/// Every failure mode fails closed.
pub struct RateLimiter {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        max_requests: u64,
        window: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            max_requests,
            window: window.max(Duration::from_secs(1)),
        }
    }

    pub fn max_per_hour(&self) -> u64 {
        self.max_requests
    }

    fn window_secs(&self) -> i64 {
        self.window.as_secs() as i64
    }

    fn bucket_key(&self) -> String {
        let bucket = self.clock.now().timestamp().div_euclid(self.window_secs());
        format!("{}{}", RATE_KEY_PREFIX, bucket)
    }

    /// Requests made in the current window; [`UNKNOWN_COUNT`] on store errors.
    pub async fn current_count(&self) -> u64 {
        let key = self.bucket_key();
        match self.store.get(&key).await {
            Ok(None) => 0,
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|e| {
                warn!(key, raw, error = %e, "Unparseable rate counter");
                UNKNOWN_COUNT
            }),
            Err(e) => {
                error!(error = %e, "Rate counter read failed, assuming saturated");
                UNKNOWN_COUNT
            }
        }
    }

    /// Reserves one upstream request in the current window.
    ///
    /// Returns false when the ceiling is reached or the store fails. A
    /// rejected reservation does not consume quota.
    pub async fn try_reserve(&self) -> bool {
        let key = self.bucket_key();
        match self
            .store
            .increment_within_limit(&key, self.max_requests, self.window * 2)
            .await
        {
            Ok(Some(count)) => {
                debug!(count, max = self.max_requests, "Rate limit reservation granted");
                true
            }
            Ok(None) => {
                debug!(max = self.max_requests, "Rate limit reached");
                false
            }
            Err(e) => {
                error!(error = %e, "Rate limit reservation failed, refusing request");
                false
            }
        }
    }

    /// Seconds until the current window rolls over.
    pub fn seconds_until_reset(&self) -> u64 {
        let window = self.window_secs();
        let elapsed = self.clock.now().timestamp().rem_euclid(window);
        (window - elapsed) as u64
    }
}
