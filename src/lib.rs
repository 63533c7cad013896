//! # Image Pipeline
//!
//! Background acquisition of illustrative images for vocabulary words,
//! shared by any number of processes through Redis.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Cache entries, queue jobs, clock and repository traits
//! - **Application Layer** ([`application`]) - Cache, rate limiter, queue, locks, worker, populator
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis/in-memory store, image providers, Postgres
//! - **API Layer** ([`api`]) - REST handlers, DTOs, and middleware
//!
//! ## How it fits together
//!
//! Words enter a two-lane queue (priority before normal) from the HTTP API,
//! from image reads that miss the cache, and from the populator, which sweeps
//! the vocabulary. A single worker at a time, elected through a lock in the
//! store, dequeues a word, searches the provider within a shared hourly
//! quota, downsizes the first usable image to JPEG and caches the outcome.
//! Failures are cached too, and become eligible for another attempt after a
//! retry window.
//!
//! ## Quick Start
//!
//! ```bash
//! export REDIS_URL="redis://localhost:6379"
//! export ADMIN_TOKEN="$(cargo run -q --bin admin -- token generate | grep ADMIN_TOKEN | cut -d= -f2)"
//! export UNSPLASH_ACCESS_KEY="..."   # Optional, placeholder images otherwise
//!
//! # Service with embedded worker
//! cargo run
//!
//! # Or a separate worker process
//! IMAGE_WORKER_EMBEDDED=false cargo run &
//! cargo run --bin image-worker
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod bootstrap;
pub mod config;
pub mod logging;
pub mod server;

pub mod routes;

pub use error::{AppError, PipelineError};
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        CycleOutcome, ImageCache, ImageWorker, JobOutcome, Populator, RateLimiter, WorkQueue,
    };
    pub use crate::application::{Pipeline, PipelineSettings};
    pub use crate::domain::clock::{Clock, ManualClock, SystemClock};
    pub use crate::domain::entities::{CacheEntry, EnqueueOutcome, ImageResult, QueueJob};
    pub use crate::error::{AppError, PipelineError};
    pub use crate::infrastructure::store::{MemoryStore, RedisStore, StateStore};
    pub use crate::state::AppState;
}
