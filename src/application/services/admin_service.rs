//! Operator view of the pipeline: status, stats and eviction.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::distributed_lock::DistributedLock;
use super::image_cache::{CacheStats, ImageCache};
use super::rate_limiter::RateLimiter;
use super::work_queue::WorkQueue;
use crate::error::PipelineError;

/// Entries decoded when estimating the success/failure split.
pub const STATS_SAMPLE_SIZE: usize = 100;

/// Snapshot of queue depth, quota use and worker activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub priority_len: u64,
    pub normal_len: u64,
    /// [`super::rate_limiter::UNKNOWN_COUNT`] when the counter is unreadable.
    pub requests_this_hour: u64,
    pub max_per_hour: u64,
    pub seconds_until_reset: u64,
    pub is_lock_held: bool,
}

pub struct AdminService {
    queue: Arc<WorkQueue>,
    cache: Arc<ImageCache>,
    limiter: Arc<RateLimiter>,
    worker_lock: DistributedLock,
}

impl AdminService {
    pub fn new(
        queue: Arc<WorkQueue>,
        cache: Arc<ImageCache>,
        limiter: Arc<RateLimiter>,
        worker_lock: DistributedLock,
    ) -> Self {
        Self {
            queue,
            cache,
            limiter,
            worker_lock,
        }
    }

    pub async fn queue_status(&self) -> Result<QueueStatus, PipelineError> {
        let length = self.queue.length().await?;
        Ok(QueueStatus {
            priority_len: length.priority,
            normal_len: length.normal,
            requests_this_hour: self.limiter.current_count().await,
            max_per_hour: self.limiter.max_per_hour(),
            seconds_until_reset: self.limiter.seconds_until_reset(),
            is_lock_held: self.worker_lock.is_held().await?,
        })
    }

    pub async fn cache_stats(&self) -> Result<CacheStats, PipelineError> {
        self.cache.stats(STATS_SAMPLE_SIZE).await
    }

    /// Evicts one word, or everything when `word` is `None`.
    ///
    /// Returns the number of entries removed.
    pub async fn clear_cache(&self, word: Option<&str>) -> Result<u64, PipelineError> {
        let removed = match word {
            Some(word) => u64::from(self.cache.clear(word).await?),
            None => self.cache.clear_all().await?,
        };
        info!(word, removed, "Cache cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::distributed_lock::WORKER_LOCK_KEY;
    use crate::application::services::image_cache::CachePolicy;
    use crate::domain::clock::{Clock, SystemClock};
    use crate::domain::entities::sources;
    use crate::infrastructure::store::MemoryStore;
    use std::time::Duration;

    fn build() -> (AdminService, Arc<WorkQueue>, Arc<ImageCache>, Arc<MemoryStore>) {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(ImageCache::new(
            store.clone(),
            clock.clone(),
            CachePolicy::default(),
        ));
        let queue = Arc::new(WorkQueue::new(store.clone(), cache.clone(), clock.clone()));
        let limiter = Arc::new(RateLimiter::new(
            store.clone(),
            clock,
            25,
            Duration::from_secs(3600),
        ));
        let lock = DistributedLock::new(store.clone(), WORKER_LOCK_KEY, Duration::from_secs(300));
        (
            AdminService::new(queue.clone(), cache.clone(), limiter, lock),
            queue,
            cache,
            store,
        )
    }

    #[tokio::test]
    async fn test_queue_status_reports_lanes_and_quota() {
        let (admin, queue, _, store) = build();
        queue.enqueue("hitno", None, sources::PRIORITY, true).await.unwrap();
        queue.enqueue("pas", None, sources::TOP_100, false).await.unwrap();
        queue.enqueue("mačka", None, sources::TOP_100, false).await.unwrap();
        let other = DistributedLock::new(store, WORKER_LOCK_KEY, Duration::from_secs(300));
        other.try_acquire().await.unwrap();

        let status = admin.queue_status().await.unwrap();

        assert_eq!(status.priority_len, 1);
        assert_eq!(status.normal_len, 2);
        assert_eq!(status.requests_this_hour, 0);
        assert_eq!(status.max_per_hour, 25);
        assert!(status.is_lock_held);
    }

    #[tokio::test]
    async fn test_clear_cache_single_and_all() {
        let (admin, _, cache, _) = build();
        cache.put_failure("pas", "nothing").await.unwrap();
        cache.put_failure("mačka", "nothing").await.unwrap();

        assert_eq!(admin.clear_cache(Some("Pas")).await.unwrap(), 1);
        assert_eq!(admin.clear_cache(Some("pas")).await.unwrap(), 0);
        assert_eq!(admin.clear_cache(None).await.unwrap(), 1);
        assert_eq!(admin.cache_stats().await.unwrap().count, 0);
    }
}
