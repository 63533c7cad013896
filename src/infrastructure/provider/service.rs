//! Image provider trait and error types.

use async_trait::async_trait;

use crate::domain::entities::{DownloadedImage, ImageCandidate};

/// Errors raised while talking to an image provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
    #[error("provider error: {0}")]
    Other(String),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Upstream image search and download.
///
/// # Implementations
///
/// - [`crate::infrastructure::provider::UnsplashProvider`] - Unsplash search API
/// - [`crate::infrastructure::provider::PlaceholderProvider`] - deterministic generated images
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Searches for images matching a text query, best match first.
    async fn search(&self, query: &str) -> ProviderResult<Vec<ImageCandidate>>;

    /// Fetches the raw bytes behind a candidate's download URL.
    async fn download(&self, url: &str) -> ProviderResult<DownloadedImage>;
}
