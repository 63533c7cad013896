//! Shared state store trait and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur while talking to the backing store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    ConnectionError(String),
    #[error("Store operation error: {0}")]
    OperationError(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Shared key/value state used by every pipeline process.
///
/// The cache, the work queue, the rate limiter and both locks live here.
/// Every operation that must appear atomic to concurrent processes is a
/// single method, so implementations can map it onto one atomic primitive
/// (a conditional set, or a server-side script) instead of a read-then-write.
///
/// Unlike a read-through cache, implementations must surface errors: the
/// callers decide whether to fail open or closed.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::RedisStore`] - Redis, shared across processes
/// - [`crate::infrastructure::store::MemoryStore`] - process-local, for tests and development
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads a string value.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a string value with an expiry, replacing any previous value.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Writes `value` only if `key` does not exist. Returns whether it was written.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    /// Deletes a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Deletes `key` only while it still holds `expected`.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> StoreResult<bool>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Increments a counter unless it already reached `limit`.
    ///
    /// Returns the new value, or `None` when the limit was reached (in which
    /// case the counter is left untouched). The first increment of a fresh
    /// counter sets its expiry to `ttl`.
    async fn increment_within_limit(
        &self,
        key: &str,
        limit: u64,
        ttl: Duration,
    ) -> StoreResult<Option<u64>>;

    /// Adds `member` to `set_key` and, only if it was not already present,
    /// pushes `payload` onto `list_key`. Both writes happen atomically.
    ///
    /// Returns `true` if the payload was pushed.
    async fn push_unique(
        &self,
        set_key: &str,
        list_key: &str,
        member: &str,
        payload: &str,
    ) -> StoreResult<bool>;

    /// Pops the oldest payload from the first non-empty list in `list_keys`
    /// and removes the member named by its `member_field` JSON field from
    /// `set_key`, atomically.
    async fn pop_unique(
        &self,
        set_key: &str,
        list_keys: &[String],
        member_field: &str,
    ) -> StoreResult<Option<String>>;

    async fn list_len(&self, key: &str) -> StoreResult<u64>;

    async fn set_contains(&self, set_key: &str, member: &str) -> StoreResult<bool>;

    /// Lists keys starting with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Byte length of a string value, 0 if absent.
    async fn value_len(&self, key: &str) -> StoreResult<u64>;

    /// Checks if the store backend is healthy.
    async fn health_check(&self) -> bool;
}
