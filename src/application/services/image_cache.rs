//! Cache of image acquisition outcomes keyed by normalized word.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::clock::{Clock, to_time_delta};
use crate::domain::entities::{CacheEntry, ImageResult};
use crate::error::PipelineError;
use crate::infrastructure::store::StateStore;
use crate::utils::normalize::cache_key;

/// Prefix of every cache entry key.
pub const CACHE_KEY_PREFIX: &str = "image_cache:";

/// Expiry and retry windows for cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub success_ttl: Duration,
    pub failure_ttl: Duration,
    /// Age after which a failure no longer blocks a new attempt.
    pub failure_retry_after: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            success_ttl: Duration::from_secs(30 * 24 * 3600),
            failure_ttl: Duration::from_secs(30 * 24 * 3600),
            failure_retry_after: Duration::from_secs(24 * 3600),
        }
    }
}

/// Cache size summary for the admin surface.
///
/// `count` and `estimated_size_bytes` cover every key; the success/failure
/// split is extrapolated from a bounded sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub count: u64,
    pub estimated_size_bytes: u64,
    pub success_count: u64,
    pub failure_count: u64,
}

pub struct ImageCache {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    policy: CachePolicy,
}

impl ImageCache {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>, policy: CachePolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    fn key(word: &str) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, cache_key(word))
    }

    fn retry_window(&self) -> TimeDelta {
        to_time_delta(self.policy.failure_retry_after)
    }

    /// Reads the entry for a word.
    ///
    /// # Errors
    ///
    /// [`PipelineError::StoreUnavailable`] if the store fails,
    /// [`PipelineError::Serialization`] if the stored payload is corrupt.
    pub async fn get(&self, word: &str) -> Result<Option<CacheEntry>, PipelineError> {
        let Some(raw) = self.store.get(&Self::key(word)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Reads the entry for a word, treating any error as a miss.
    pub async fn lookup(&self, word: &str) -> Option<CacheEntry> {
        match self.get(word).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(word, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Stores a successful result, replacing any prior entry.
    pub async fn put_success(&self, word: &str, image: ImageResult) -> Result<(), PipelineError> {
        let entry = CacheEntry::success(word.trim(), image, self.clock.now());
        self.write(word, &entry, self.policy.success_ttl).await
    }

    /// Records that no image could be produced.
    ///
    /// An existing success entry is kept; only an explicit clear removes it.
    ///
    /// # Errors
    ///
    /// [`PipelineError::StoreUnavailable`] if the current entry cannot be read
    /// or the failure cannot be written. Nothing is written in the first case.
    pub async fn put_failure(&self, word: &str, reason: &str) -> Result<(), PipelineError> {
        match self.get(word).await {
            Ok(Some(existing)) if existing.is_success() => {
                debug!(word, "Keeping cached image over new failure");
                return Ok(());
            }
            Ok(_) | Err(PipelineError::Serialization(_)) => {}
            Err(e) => return Err(e),
        }

        let entry = CacheEntry::failure(word.trim(), reason, self.clock.now());
        self.write(word, &entry, self.policy.failure_ttl).await
    }

    async fn write(
        &self,
        word: &str,
        entry: &CacheEntry,
        ttl: Duration,
    ) -> Result<(), PipelineError> {
        let payload = serde_json::to_string(entry)?;
        self.store
            .set_with_ttl(&Self::key(word), &payload, ttl)
            .await?;

        debug!(word, success = entry.is_success(), "Cache entry written");
        Ok(())
    }

    pub fn is_retry_eligible(&self, entry: &CacheEntry) -> bool {
        entry.is_retry_eligible(self.clock.now(), self.retry_window())
    }

    /// True when the entry makes a new job for the word pointless.
    pub fn blocks_enqueue(&self, entry: &CacheEntry) -> bool {
        entry.blocks_enqueue(self.clock.now(), self.retry_window())
    }

    /// Evicts one word. Returns whether an entry existed.
    pub async fn clear(&self, word: &str) -> Result<bool, PipelineError> {
        Ok(self.store.delete(&Self::key(word)).await?)
    }

    /// Evicts every entry. Returns the number removed.
    pub async fn clear_all(&self) -> Result<u64, PipelineError> {
        let keys = self.store.scan_prefix(CACHE_KEY_PREFIX).await?;
        let mut removed = 0;
        for key in keys {
            if self.store.delete(&key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Counts entries and sizes, classifying up to `sample` of them.
    pub async fn stats(&self, sample: usize) -> Result<CacheStats, PipelineError> {
        let keys = self.store.scan_prefix(CACHE_KEY_PREFIX).await?;
        let count = keys.len() as u64;

        let mut estimated_size_bytes = 0;
        for key in &keys {
            estimated_size_bytes += self.store.value_len(key).await?;
        }

        let mut sampled = 0u64;
        let mut sampled_success = 0u64;
        for key in keys.iter().take(sample) {
            let Some(raw) = self.store.get(key).await? else {
                continue;
            };
            match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) => {
                    sampled += 1;
                    if entry.is_success() {
                        sampled_success += 1;
                    }
                }
                Err(e) => debug!(key, error = %e, "Skipping undecodable cache entry"),
            }
        }

        let success_count = if sampled == 0 {
            0
        } else if sampled == count {
            sampled_success
        } else {
            ((sampled_success as f64 / sampled as f64) * count as f64).round() as u64
        };

        Ok(CacheStats {
            count,
            estimated_size_bytes,
            success_count,
            failure_count: if sampled == 0 {
                0
            } else {
                count.saturating_sub(success_count)
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::infrastructure::store::{MemoryStore, MockStateStore, StoreError};
    use chrono::{TimeZone, Utc};

    fn sample_image() -> ImageResult {
        ImageResult {
            image_data: vec![0xFF, 0xD8, 0xFF, 0xE0],
            content_type: "image/jpeg".to_string(),
            width: 400,
            height: 300,
            size_bytes: 4,
            search_query: "house".to_string(),
            photo_id: Some("p1".to_string()),
            photographer: None,
            description: None,
        }
    }

    fn cache_with_clock() -> (ImageCache, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
        let cache = ImageCache::new(store, Arc::new(clock.clone()), CachePolicy::default());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_normalized_forms_share_one_entry() {
        let (cache, _) = cache_with_clock();

        cache.put_success("Kuća", sample_image()).await.unwrap();

        for form in ["kuća", "  kuća  ", "KUĆA"] {
            let entry = cache.get(form).await.unwrap().unwrap();
            assert!(entry.is_success());
        }
        assert_eq!(cache.stats(10).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_failure_blocks_until_retry_window() {
        let (cache, clock) = cache_with_clock();

        cache
            .put_failure("xyzzy", "no suitable image found")
            .await
            .unwrap();

        clock.advance(Duration::from_secs(3600));
        let entry = cache.get("xyzzy").await.unwrap().unwrap();
        assert!(cache.blocks_enqueue(&entry));
        assert!(!cache.is_retry_eligible(&entry));

        clock.advance(Duration::from_secs(24 * 3600));
        let entry = cache.get("xyzzy").await.unwrap().unwrap();
        assert!(!cache.blocks_enqueue(&entry));
        assert!(cache.is_retry_eligible(&entry));
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let (cache, clock) = cache_with_clock();

        cache.put_success("pas", sample_image()).await.unwrap();
        clock.advance(Duration::from_secs(31 * 24 * 3600));

        assert!(cache.get("pas").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_and_clear_all() {
        let (cache, _) = cache_with_clock();

        cache.put_success("pas", sample_image()).await.unwrap();
        cache.put_success("mačka", sample_image()).await.unwrap();
        cache.put_failure("xyzzy", "nothing").await.unwrap();

        assert!(cache.clear("PAS").await.unwrap());
        assert!(!cache.clear("pas").await.unwrap());
        assert_eq!(cache.clear_all().await.unwrap(), 2);
        assert!(cache.get("mačka").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_counts_by_status() {
        let (cache, _) = cache_with_clock();

        cache.put_success("pas", sample_image()).await.unwrap();
        cache.put_success("mačka", sample_image()).await.unwrap();
        cache.put_failure("xyzzy", "nothing").await.unwrap();

        let stats = cache.stats(100).await.unwrap();

        assert_eq!(stats.count, 3);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failure_count, 1);
        assert!(stats.estimated_size_bytes > 0);
    }

    #[tokio::test]
    async fn test_failure_never_replaces_success() {
        let (cache, _) = cache_with_clock();

        cache.put_success("pas", sample_image()).await.unwrap();
        cache.put_failure("pas", "no suitable image found").await.unwrap();

        assert!(cache.get("pas").await.unwrap().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_failure_not_written_when_current_entry_unreadable() {
        let mut store = MockStateStore::new();
        store
            .expect_get()
            .returning(|_| Err(StoreError::ConnectionError("refused".into())));
        store.expect_set_with_ttl().never();

        let cache = ImageCache::new(
            Arc::new(store),
            Arc::new(crate::domain::clock::SystemClock),
            CachePolicy::default(),
        );

        assert!(matches!(
            cache.put_failure("pas", "no suitable image found").await,
            Err(PipelineError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_treats_store_error_as_miss() {
        let mut store = MockStateStore::new();
        store
            .expect_get()
            .returning(|_| Err(StoreError::ConnectionError("refused".into())));

        let cache = ImageCache::new(
            Arc::new(store),
            Arc::new(crate::domain::clock::SystemClock),
            CachePolicy::default(),
        );

        assert!(cache.lookup("pas").await.is_none());
        assert!(matches!(
            cache.get("pas").await,
            Err(PipelineError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_serialization_error() {
        let mut store = MockStateStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some("not json".to_string())));

        let cache = ImageCache::new(
            Arc::new(store),
            Arc::new(crate::domain::clock::SystemClock),
            CachePolicy::default(),
        );

        assert!(matches!(
            cache.get("pas").await,
            Err(PipelineError::Serialization(_))
        ));
    }
}
