//! Wiring of the pipeline components around one shared store.

use std::sync::Arc;
use std::time::Duration;

use super::services::{
    AdminService, CachePolicy, DistributedLock, ImageCache, ImageWorker, POPULATOR_LOCK_KEY,
    Populator, RateLimiter, WORKER_LOCK_KEY, WorkQueue, WorkerSettings,
};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::repositories::VocabularyRepository;
use crate::infrastructure::provider::ImageProvider;
use crate::infrastructure::store::StateStore;

/// Tunables for every pipeline component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_requests_per_hour: u64,
    pub rate_window: Duration,
    pub cache: CachePolicy,
    pub worker: WorkerSettings,
    pub lock_ttl: Duration,
    pub populate_lock_ttl: Duration,
    pub populate_recent_window: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_requests_per_hour: 25,
            rate_window: Duration::from_secs(3600),
            cache: CachePolicy::default(),
            worker: WorkerSettings::default(),
            lock_ttl: Duration::from_secs(300),
            populate_lock_ttl: Duration::from_secs(300),
            populate_recent_window: Duration::from_secs(7 * 24 * 3600),
        }
    }
}

/// Shared handles to the cache, queue and limiter, plus factories for the
/// long-running components.
///
/// Each process builds one `Pipeline`. Processes coordinate only through the
/// store, so a worker built here and one built in another process share the
/// same queue, quota and lock.
pub struct Pipeline {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    provider: Arc<dyn ImageProvider>,
    vocabulary: Arc<dyn VocabularyRepository>,
    settings: PipelineSettings,
    cache: Arc<ImageCache>,
    queue: Arc<WorkQueue>,
    limiter: Arc<RateLimiter>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn StateStore>,
        provider: Arc<dyn ImageProvider>,
        vocabulary: Arc<dyn VocabularyRepository>,
        settings: PipelineSettings,
    ) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), provider, vocabulary, settings)
    }

    pub fn with_clock(
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        provider: Arc<dyn ImageProvider>,
        vocabulary: Arc<dyn VocabularyRepository>,
        settings: PipelineSettings,
    ) -> Self {
        let cache = Arc::new(ImageCache::new(store.clone(), clock.clone(), settings.cache));
        let queue = Arc::new(WorkQueue::new(store.clone(), cache.clone(), clock.clone()));
        let limiter = Arc::new(RateLimiter::new(
            store.clone(),
            clock.clone(),
            settings.max_requests_per_hour,
            settings.rate_window,
        ));

        Self {
            store,
            clock,
            provider,
            vocabulary,
            settings,
            cache,
            queue,
            limiter,
        }
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    pub fn queue(&self) -> &Arc<WorkQueue> {
        &self.queue
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    fn worker_lock(&self) -> DistributedLock {
        DistributedLock::new(self.store.clone(), WORKER_LOCK_KEY, self.settings.lock_ttl)
    }

    /// A worker with its own lock holder token.
    pub fn worker(&self) -> ImageWorker {
        ImageWorker::new(
            self.queue.clone(),
            self.cache.clone(),
            self.limiter.clone(),
            self.worker_lock(),
            self.provider.clone(),
            self.settings.worker,
        )
    }

    pub fn populator(&self) -> Populator {
        Populator::new(
            self.queue.clone(),
            self.vocabulary.clone(),
            DistributedLock::new(
                self.store.clone(),
                POPULATOR_LOCK_KEY,
                self.settings.populate_lock_ttl,
            ),
            self.clock.clone(),
            self.settings.populate_recent_window,
        )
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(
            self.queue.clone(),
            self.cache.clone(),
            self.limiter.clone(),
            self.worker_lock(),
        )
    }
}
