//! Batch pre-warming of the image queue from the vocabulary.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::distributed_lock::DistributedLock;
use super::work_queue::WorkQueue;
use crate::domain::clock::{Clock, saturating_before};
use crate::domain::entities::{EnqueueOutcome, VocabWord, sources};
use crate::domain::repositories::VocabularyRepository;
use crate::error::PipelineError;
use crate::utils::top_words::TOP_WORDS;

/// Summary of one populator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PopulateReport {
    pub added: u64,
    pub duplicates: u64,
    /// Another run held the populator lock; nothing was attempted.
    pub lock_busy: bool,
}

pub struct Populator {
    queue: Arc<WorkQueue>,
    vocabulary: Arc<dyn VocabularyRepository>,
    lock: DistributedLock,
    clock: Arc<dyn Clock>,
    recent_window: Duration,
}

impl Populator {
    pub fn new(
        queue: Arc<WorkQueue>,
        vocabulary: Arc<dyn VocabularyRepository>,
        lock: DistributedLock,
        clock: Arc<dyn Clock>,
        recent_window: Duration,
    ) -> Self {
        Self {
            queue,
            vocabulary,
            lock,
            clock,
            recent_window,
        }
    }

    /// Enqueues every known word that is neither cached nor already queued.
    ///
    /// Sources, in order: all users' vocabulary, the curated top-100 list,
    /// and words created within the recent window. A source that cannot be
    /// read is logged and skipped. Returns immediately with
    /// `lock_busy = true` if another run is in progress.
    ///
    /// # Errors
    ///
    /// [`PipelineError::StoreUnavailable`] from the lock or from an enqueue;
    /// the lock is released before the error is returned.
    pub async fn run_cycle(&self) -> Result<PopulateReport, PipelineError> {
        if !self.lock.try_acquire().await? {
            info!("Populator already running elsewhere");
            return Ok(PopulateReport {
                lock_busy: true,
                ..Default::default()
            });
        }

        let result = self.populate().await;
        self.lock.release().await;

        if let Ok(report) = &result {
            info!(
                added = report.added,
                duplicates = report.duplicates,
                "Populator cycle complete"
            );
        }
        result
    }

    async fn populate(&self) -> Result<PopulateReport, PipelineError> {
        let mut report = PopulateReport::default();

        match self.vocabulary.all_user_words().await {
            Ok(words) => {
                self.enqueue_all(&words, sources::USER_VOCABULARY, &mut report)
                    .await?
            }
            Err(e) => warn!(error = %e, "Skipping user vocabulary"),
        }

        let top: Vec<VocabWord> = TOP_WORDS
            .iter()
            .map(|(word, translation)| VocabWord::new(*word, Some(translation.to_string())))
            .collect();
        self.enqueue_all(&top, sources::TOP_100, &mut report).await?;

        let since = saturating_before(self.clock.now(), self.recent_window);
        match self.vocabulary.words_created_since(since).await {
            Ok(words) => self.enqueue_all(&words, sources::RECENT, &mut report).await?,
            Err(e) => warn!(error = %e, "Skipping recent words"),
        }

        Ok(report)
    }

    async fn enqueue_all(
        &self,
        words: &[VocabWord],
        source: &str,
        report: &mut PopulateReport,
    ) -> Result<(), PipelineError> {
        let before = report.added;
        for vocab in words {
            match self
                .queue
                .enqueue(&vocab.word, vocab.translation.as_deref(), source, false)
                .await
            {
                Ok(EnqueueOutcome::Enqueued) => report.added += 1,
                Ok(EnqueueOutcome::Duplicate) => report.duplicates += 1,
                Err(PipelineError::InvalidInput(reason)) => {
                    debug!(source, reason, "Skipping unusable vocabulary row");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(source, seen = words.len(), added = report.added - before, "Source done");
        Ok(())
    }

    /// Runs a cycle every `interval` until shutdown.
    pub async fn run_periodic(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "Populator schedule started");

        while !*shutdown.borrow() {
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "Populator cycle failed");
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Populator schedule stopped");
    }
}
