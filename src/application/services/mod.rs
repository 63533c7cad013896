//! Pipeline components and the services built on top of them.

pub mod admin_service;
pub mod auth_service;
pub mod distributed_lock;
pub mod image_cache;
pub mod image_worker;
pub mod populator;
pub mod rate_limiter;
pub mod work_queue;

pub use admin_service::{AdminService, QueueStatus};
pub use auth_service::AuthService;
pub use distributed_lock::{DistributedLock, POPULATOR_LOCK_KEY, WORKER_LOCK_KEY};
pub use image_cache::{CachePolicy, CacheStats, ImageCache};
pub use image_worker::{CycleOutcome, ImageWorker, JobOutcome, NO_IMAGE_REASON, WorkerSettings};
pub use populator::{PopulateReport, Populator};
pub use rate_limiter::RateLimiter;
pub use work_queue::WorkQueue;
