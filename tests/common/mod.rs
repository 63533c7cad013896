#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use image_pipeline::application::services::AuthService;
use image_pipeline::application::{Pipeline, PipelineSettings};
use image_pipeline::domain::clock::{Clock, ManualClock};
use image_pipeline::domain::entities::{DownloadedImage, ImageCandidate, VocabWord};
use image_pipeline::domain::repositories::VocabularyRepository;
use image_pipeline::error::PipelineError;
use image_pipeline::infrastructure::provider::{
    ImageProvider, PlaceholderProvider, ProviderResult,
};
use image_pipeline::infrastructure::store::{MemoryStore, RedisStore, StateStore};
use image_pipeline::state::AppState;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 15, 0).unwrap()
}

/// Provider that only answers the queries it was told about.
///
/// Answers come from [`PlaceholderProvider`], so downloads produce real PNG
/// bytes that go through the transform. Every search is recorded.
pub struct ScriptedProvider {
    answers: HashSet<String>,
    inner: PlaceholderProvider,
    searches: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn answering(queries: &[&str]) -> Self {
        Self {
            answers: queries.iter().map(|q| q.to_string()).collect(),
            inner: PlaceholderProvider::with_dimensions(800, 600),
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::answering(&[])
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<ImageCandidate>> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.answers.contains(query) {
            self.inner.search(query).await
        } else {
            Ok(Vec::new())
        }
    }

    async fn download(&self, url: &str) -> ProviderResult<DownloadedImage> {
        self.inner.download(url).await
    }
}

/// In-memory vocabulary with a fixed word list.
#[derive(Default)]
pub struct StaticVocabulary {
    pub user_words: Vec<VocabWord>,
    pub recent_words: Vec<VocabWord>,
}

#[async_trait]
impl VocabularyRepository for StaticVocabulary {
    async fn all_user_words(&self) -> Result<Vec<VocabWord>, PipelineError> {
        Ok(self.user_words.clone())
    }

    async fn words_created_since(
        &self,
        _since: DateTime<Utc>,
    ) -> Result<Vec<VocabWord>, PipelineError> {
        Ok(self.recent_words.clone())
    }
}

/// A pipeline over a [`MemoryStore`] driven by a [`ManualClock`].
pub struct TestPipeline {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub provider: Arc<ScriptedProvider>,
}

impl TestPipeline {
    pub fn new(provider: ScriptedProvider) -> Self {
        Self::with_vocabulary(provider, StaticVocabulary::default())
    }

    pub fn with_vocabulary(provider: ScriptedProvider, vocabulary: StaticVocabulary) -> Self {
        let clock = ManualClock::new(start_time());
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let store = Arc::new(MemoryStore::with_clock(shared.clone()));
        let provider = Arc::new(provider);

        let pipeline = Pipeline::with_clock(
            store.clone(),
            shared,
            provider.clone(),
            Arc::new(vocabulary),
            test_settings(),
        );

        Self {
            pipeline: Arc::new(pipeline),
            store,
            clock,
            provider,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn app_state(&self) -> AppState {
        let auth = AuthService::new(TEST_ADMIN_TOKEN).unwrap();
        AppState::new(self.pipeline.clone(), Arc::new(auth))
    }
}

/// Default settings with no pacing, so loops in tests never sleep long.
pub fn test_settings() -> PipelineSettings {
    let mut settings = PipelineSettings::default();
    settings.worker.pace_interval = Duration::ZERO;
    settings.worker.idle_interval = Duration::from_millis(10);
    settings
}

/// Connects to the Redis named by `REDIS_URL`, or `None` when it is unset.
///
/// Redis-backed tests return early without it, so the suite runs anywhere.
pub async fn redis_store() -> Option<RedisStore> {
    let url = std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty())?;
    Some(
        RedisStore::connect(&url)
            .await
            .expect("REDIS_URL is set but Redis is unreachable"),
    )
}

/// A key namespace no other test run shares.
pub fn unique_prefix(test: &str) -> String {
    let mut nonce = [0u8; 8];
    getrandom::fill(&mut nonce).unwrap();
    format!("test:{}:{}:", test, hex::encode(nonce))
}

/// Deletes every key under `prefix`.
pub async fn clear_prefix(store: &dyn StateStore, prefix: &str) {
    for key in store.scan_prefix(prefix).await.unwrap() {
        store.delete(&key).await.unwrap();
    }
}
