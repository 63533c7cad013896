//! Two-lane job queue with per-word deduplication.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::image_cache::ImageCache;
use crate::domain::clock::Clock;
use crate::domain::entities::{EnqueueOutcome, JOB_KEY_FIELD, Lane, QueueJob, QueueLength};
use crate::error::PipelineError;
use crate::infrastructure::store::StateStore;
use crate::utils::normalize::normalize_word;

pub const PRIORITY_LANE_KEY: &str = "image_queue:priority";
pub const NORMAL_LANE_KEY: &str = "image_queue:normal";
/// Set of normalized words currently waiting in either lane.
pub const MEMBERS_KEY: &str = "image_queue:members";

/// Producer and consumer side of the image job queue.
///
/// A word is in the membership set exactly as long as its job sits in a
/// lane: the push and the set-add are one atomic store call, and so are the
/// pop and the set-remove. Dequeue drains the priority lane before the normal
/// one; within a lane jobs come out oldest first.
pub struct WorkQueue {
    store: Arc<dyn StateStore>,
    cache: Arc<ImageCache>,
    clock: Arc<dyn Clock>,
}

impl WorkQueue {
    pub fn new(store: Arc<dyn StateStore>, cache: Arc<ImageCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache,
            clock,
        }
    }

    fn lane_key(lane: Lane) -> &'static str {
        match lane {
            Lane::Priority => PRIORITY_LANE_KEY,
            Lane::Normal => NORMAL_LANE_KEY,
        }
    }

    /// Requests an image for `word`.
    ///
    /// Returns [`EnqueueOutcome::Duplicate`] when the cache already answers
    /// the word (a success, or a failure still inside its retry window) or a
    /// job for it is already waiting.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidInput`] for a blank word
    /// - [`PipelineError::StoreUnavailable`] if the atomic push fails; the
    ///   membership set and the lanes are left unchanged
    pub async fn enqueue(
        &self,
        word: &str,
        translation: Option<&str>,
        source: &str,
        priority: bool,
    ) -> Result<EnqueueOutcome, PipelineError> {
        let key = normalize_word(word);
        if key.is_empty() {
            return Err(PipelineError::InvalidInput("word must not be empty".into()));
        }

        if let Some(entry) = self.cache.lookup(&key).await
            && self.cache.blocks_enqueue(&entry)
        {
            debug!(word = %key, source, "Already cached, skipping enqueue");
            return Ok(Self::count(EnqueueOutcome::Duplicate));
        }

        let job = QueueJob::new(word, translation, source, self.clock.now());
        let payload = serde_json::to_string(&job)?;
        let lane = Lane::from_priority(priority);

        let pushed = self
            .store
            .push_unique(MEMBERS_KEY, Self::lane_key(lane), &job.key, &payload)
            .await
            .inspect_err(|e| error!(word = %key, error = %e, "Enqueue failed"))?;

        if pushed {
            info!(word = %key, source, ?lane, "Job enqueued");
            Ok(Self::count(EnqueueOutcome::Enqueued))
        } else {
            debug!(word = %key, source, "Already queued");
            Ok(Self::count(EnqueueOutcome::Duplicate))
        }
    }

    fn count(outcome: EnqueueOutcome) -> EnqueueOutcome {
        metrics::counter!("image_enqueue_total", "outcome" => outcome.as_str()).increment(1);
        outcome
    }

    /// Takes the next job, priority lane first.
    ///
    /// # Errors
    ///
    /// [`PipelineError::StoreUnavailable`] if the pop fails, or
    /// [`PipelineError::Serialization`] if the popped payload is corrupt (the
    /// payload is discarded either way).
    pub async fn dequeue(&self) -> Result<Option<QueueJob>, PipelineError> {
        let lanes = [PRIORITY_LANE_KEY.to_string(), NORMAL_LANE_KEY.to_string()];
        let Some(payload) = self
            .store
            .pop_unique(MEMBERS_KEY, &lanes, JOB_KEY_FIELD)
            .await?
        else {
            return Ok(None);
        };

        let job: QueueJob = serde_json::from_str(&payload).inspect_err(|e| {
            error!(payload, error = %e, "Discarding undecodable queue payload");
        })?;
        debug!(word = %job.key, source = %job.source, "Job dequeued");
        Ok(Some(job))
    }

    pub async fn length(&self) -> Result<QueueLength, PipelineError> {
        let priority = self.store.list_len(PRIORITY_LANE_KEY).await?;
        let normal = self.store.list_len(NORMAL_LANE_KEY).await?;
        Ok(QueueLength {
            priority,
            normal,
            total: priority + normal,
        })
    }

    /// True while a job for the word waits in either lane.
    pub async fn is_queued(&self, word: &str) -> Result<bool, PipelineError> {
        Ok(self
            .store
            .set_contains(MEMBERS_KEY, &normalize_word(word))
            .await?)
    }
}
