//! Single-job-at-a-time image acquisition worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::distributed_lock::DistributedLock;
use super::image_cache::ImageCache;
use super::rate_limiter::RateLimiter;
use super::work_queue::WorkQueue;
use crate::domain::entities::{ImageCandidate, ImageResult, QueueJob};
use crate::error::PipelineError;
use crate::infrastructure::provider::ImageProvider;
use crate::utils::image_transform::transform;
use crate::utils::search_queries::build_queries;

/// Reason recorded when every query came back empty.
pub const NO_IMAGE_REASON: &str = "no suitable image found";

/// Longest a worker waits for the rate window to roll over before checking again.
const MAX_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(300);

/// Timing and image settings for a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Sleep after a job that produced a cache entry.
    pub pace_interval: Duration,
    /// Sleep when the queue is empty or another worker holds the lock.
    pub idle_interval: Duration,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            pace_interval: Duration::from_secs(60),
            idle_interval: Duration::from_secs(30),
            max_dimension: 400,
            jpeg_quality: 85,
        }
    }
}

/// Result of processing one dequeued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// An image was stored.
    Cached,
    /// Every query was tried; a failure entry was stored.
    NoImageFound,
    /// The hourly ceiling was hit mid-job; nothing was stored.
    RateLimited,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::NoImageFound => "no_image_found",
            Self::RateLimited => "rate_limited",
        }
    }
}

/// Result of one pass through the worker state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another worker is processing.
    LockBusy,
    QueueEmpty,
    /// The word was cached between enqueue and dequeue.
    Skipped { word: String },
    Processed { word: String, outcome: JobOutcome },
}

pub struct ImageWorker {
    queue: Arc<WorkQueue>,
    cache: Arc<ImageCache>,
    limiter: Arc<RateLimiter>,
    lock: DistributedLock,
    provider: Arc<dyn ImageProvider>,
    settings: WorkerSettings,
}

impl ImageWorker {
    pub fn new(
        queue: Arc<WorkQueue>,
        cache: Arc<ImageCache>,
        limiter: Arc<RateLimiter>,
        lock: DistributedLock,
        provider: Arc<dyn ImageProvider>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            cache,
            limiter,
            lock,
            provider,
            settings,
        }
    }

    /// Runs one cycle: lock, dequeue, process, release.
    ///
    /// The lock is always released before returning, including on errors.
    ///
    /// # Errors
    ///
    /// Store failures while taking the lock, dequeuing, or writing the result.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, PipelineError> {
        if !self.lock.try_acquire().await? {
            debug!("Worker lock held elsewhere");
            return Ok(CycleOutcome::LockBusy);
        }

        let result = self.process_next().await;
        self.lock.release().await;
        result
    }

    async fn process_next(&self) -> Result<CycleOutcome, PipelineError> {
        let Some(job) = self.queue.dequeue().await? else {
            return Ok(CycleOutcome::QueueEmpty);
        };

        match self.cache.get(&job.key).await {
            Ok(Some(entry)) if self.cache.blocks_enqueue(&entry) => {
                debug!(word = %job.key, "Already cached, skipping job");
                return Ok(CycleOutcome::Skipped { word: job.key });
            }
            Ok(_) => {}
            Err(PipelineError::Serialization(e)) => {
                warn!(word = %job.key, error = %e, "Cached entry unreadable, processing job");
            }
            Err(e) => {
                warn!(word = %job.key, error = %e, "Cache unreadable, dropping job");
                return Err(e);
            }
        }

        let outcome = self.process_job(&job).await?;
        metrics::counter!("image_jobs_total", "outcome" => outcome.as_str()).increment(1);
        Ok(CycleOutcome::Processed {
            word: job.key,
            outcome,
        })
    }

    /// Searches, downloads and caches an image for one job.
    ///
    /// Queries are tried in order, each after reserving quota. The first
    /// candidate that downloads and transforms cleanly wins. Provider and
    /// content errors only skip to the next query.
    ///
    /// # Errors
    ///
    /// Only store failures on the final cache write.
    pub async fn process_job(&self, job: &QueueJob) -> Result<JobOutcome, PipelineError> {
        let queries = build_queries(&job.word, job.translation.as_deref());

        for query in &queries {
            if !self.limiter.try_reserve().await {
                info!(word = %job.key, query, "Rate limit reached, dropping job without cache write");
                return Ok(JobOutcome::RateLimited);
            }

            metrics::counter!("image_provider_requests_total", "provider" => self.provider.name())
                .increment(1);

            let candidates = match self.provider.search(query).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(word = %job.key, query, error = %e, "Search failed");
                    continue;
                }
            };

            let Some(candidate) = candidates.into_iter().next() else {
                debug!(word = %job.key, query, "No candidates");
                continue;
            };

            match self.fetch(&candidate, query).await {
                Ok(image) => {
                    info!(
                        word = %job.key,
                        query,
                        width = image.width,
                        height = image.height,
                        bytes = image.size_bytes,
                        "Image cached"
                    );
                    self.cache.put_success(&job.word, image).await?;
                    return Ok(JobOutcome::Cached);
                }
                Err(e) => {
                    warn!(word = %job.key, query, error = %e, "Candidate rejected");
                }
            }
        }

        info!(word = %job.key, queries = queries.len(), "No image found");
        self.cache.put_failure(&job.word, NO_IMAGE_REASON).await?;
        Ok(JobOutcome::NoImageFound)
    }

    async fn fetch(
        &self,
        candidate: &ImageCandidate,
        query: &str,
    ) -> Result<ImageResult, PipelineError> {
        let downloaded = self.provider.download(&candidate.download_url).await?;

        let max_dimension = self.settings.max_dimension;
        let quality = self.settings.jpeg_quality;
        let transformed = tokio::task::spawn_blocking(move || {
            transform(
                &downloaded.bytes,
                downloaded.content_type.as_deref(),
                max_dimension,
                quality,
            )
        })
        .await
        .map_err(|e| PipelineError::InvalidContent(format!("transform task failed: {}", e)))?
        .map_err(|e| PipelineError::InvalidContent(e.to_string()))?;

        Ok(ImageResult {
            size_bytes: transformed.bytes.len(),
            image_data: transformed.bytes,
            content_type: transformed.content_type.to_string(),
            width: transformed.width,
            height: transformed.height,
            search_query: query.to_string(),
            photo_id: Some(candidate.id.clone()),
            photographer: candidate.photographer.clone(),
            description: candidate.description.clone(),
        })
    }

    /// How long to wait after a cycle before starting the next one.
    fn delay_after(&self, outcome: &Result<CycleOutcome, PipelineError>) -> Duration {
        match outcome {
            Ok(CycleOutcome::Skipped { .. }) => Duration::ZERO,
            Ok(CycleOutcome::Processed {
                outcome: JobOutcome::RateLimited,
                ..
            }) => Duration::from_secs(self.limiter.seconds_until_reset())
                .min(MAX_RATE_LIMIT_BACKOFF)
                .max(self.settings.idle_interval),
            Ok(CycleOutcome::Processed { .. }) => self.settings.pace_interval,
            Ok(CycleOutcome::LockBusy) | Ok(CycleOutcome::QueueEmpty) | Err(_) => {
                self.settings.idle_interval
            }
        }
    }

    /// Processes jobs until `shutdown` flips to true or its sender is dropped.
    ///
    /// Shutdown is observed between cycles and during sleeps; a job that has
    /// been dequeued always runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            provider = self.provider.name(),
            pace_secs = self.settings.pace_interval.as_secs(),
            max_per_hour = self.limiter.max_per_hour(),
            "Image worker started"
        );

        while !*shutdown.borrow() {
            let outcome = self.run_cycle().await;
            if let Err(e) = &outcome {
                error!(error = %e, "Worker cycle failed");
            }

            let delay = self.delay_after(&outcome);
            if delay.is_zero() {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Image worker stopped");
    }
}
