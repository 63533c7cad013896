//! Shared state store for cache entries, queue lanes, counters and locks.
//!
//! Provides a [`StateStore`] trait with two implementations:
//! - [`RedisStore`] - Production Redis-backed store shared by all processes
//! - [`MemoryStore`] - Process-local implementation for tests and development

mod memory_store;
mod redis_store;
mod service;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
pub use service::{StateStore, StoreError, StoreResult};

#[cfg(test)]
pub use service::MockStateStore;
