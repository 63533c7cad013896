//! Construction of pipeline components from [`Config`].
//!
//! Shared by the service, the standalone worker and the admin CLI so every
//! process talks to the same store with the same settings.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::application::Pipeline;
use crate::config::{Config, mask_connection_string};
use crate::domain::repositories::VocabularyRepository;
use crate::infrastructure::persistence::{NullVocabularyRepository, PgVocabularyRepository};
use crate::infrastructure::provider::{ImageProvider, PlaceholderProvider, UnsplashProvider};
use crate::infrastructure::store::{MemoryStore, RedisStore, StateStore};

const STORE_CONNECT_ATTEMPTS: usize = 5;

/// Connects to Redis, retrying with exponential backoff.
///
/// Without a configured Redis URL a process-local [`MemoryStore`] is used.
/// A configured but unreachable Redis is an error: falling back would give
/// this process a private queue and quota.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn StateStore>> {
    let Some(redis_url) = config.redis_url.as_deref() else {
        tracing::warn!("REDIS_URL not set, using in-memory store (single process only)");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let strategy = ExponentialBackoff::from_millis(200)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(STORE_CONNECT_ATTEMPTS);

    let store = Retry::start(strategy, || async {
        RedisStore::connect(redis_url).await.inspect_err(|e| {
            tracing::warn!(error = %e, "Redis connection attempt failed");
        })
    })
    .await
    .with_context(|| {
        format!(
            "Failed to connect to Redis at {}",
            mask_connection_string(redis_url)
        )
    })?;

    Ok(Arc::new(store))
}

/// Unsplash when an access key is configured, generated placeholders otherwise.
pub fn build_provider(config: &Config) -> Result<Arc<dyn ImageProvider>> {
    match config.unsplash_access_key.as_deref() {
        Some(key) => {
            let provider = UnsplashProvider::new(key, &config.unsplash_api_url)
                .context("Failed to build Unsplash client")?;
            Ok(Arc::new(provider))
        }
        None => {
            tracing::warn!("UNSPLASH_ACCESS_KEY not set, serving placeholder images");
            Ok(Arc::new(PlaceholderProvider::new()))
        }
    }
}

/// Postgres vocabulary when a database is configured, an empty source otherwise.
pub async fn build_vocabulary(config: &Config) -> Result<Arc<dyn VocabularyRepository>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::info!("No database configured, populator limited to curated words");
        return Ok(Arc::new(NullVocabularyRepository));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database at {}",
                mask_connection_string(database_url)
            )
        })?;
    tracing::info!("Connected to vocabulary database");

    Ok(Arc::new(PgVocabularyRepository::new(Arc::new(pool))))
}

/// Builds a fully wired pipeline.
///
/// # Errors
///
/// Returns an error if a configured backend is unreachable.
pub async fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let store = connect_store(config).await?;
    let provider = build_provider(config)?;
    let vocabulary = build_vocabulary(config).await?;

    let pipeline = Pipeline::new(store, provider, vocabulary, config.pipeline_settings());
    tracing::info!(provider = pipeline.provider_name(), "Pipeline ready");

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn config_with_redis(url: Option<&str>) -> Config {
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            match url {
                Some(url) => env::set_var("REDIS_URL", url),
                None => env::remove_var("REDIS_URL"),
            }
            env::remove_var("REDIS_HOST");
        }
        let config = Config::from_env().unwrap();
        unsafe {
            env::remove_var("REDIS_URL");
        }
        config
    }

    #[tokio::test]
    #[serial]
    async fn test_memory_store_without_redis() {
        let config = config_with_redis(None);

        let store = connect_store(&config).await.unwrap();

        assert!(store.health_check().await);
    }

    #[tokio::test]
    #[serial]
    async fn test_unusable_redis_url_fails_after_retries() {
        let config = config_with_redis(Some("redis://localhost:notaport/0"));

        let Err(err) = connect_store(&config).await else {
            panic!("expected connection error");
        };

        assert!(format!("{:#}", err).contains("Failed to connect to Redis"));
    }
}
