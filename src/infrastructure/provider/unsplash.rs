//! Unsplash search API client.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::service::{ImageProvider, ProviderError, ProviderResult};
use crate::domain::entities::{DownloadedImage, ImageCandidate};

const RESULTS_PER_QUERY: u32 = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Largest image body accepted from the CDN.
pub const MAX_DOWNLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: String,
    width: u32,
    height: u32,
    description: Option<String>,
    alt_description: Option<String>,
    urls: PhotoUrls,
    user: Option<PhotoUser>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    small: String,
}

#[derive(Debug, Deserialize)]
struct PhotoUser {
    name: Option<String>,
    username: Option<String>,
}

impl From<Photo> for ImageCandidate {
    fn from(photo: Photo) -> Self {
        let photographer = photo.user.and_then(|u| u.name.or(u.username));
        Self {
            id: photo.id,
            download_url: photo.urls.small,
            width: photo.width,
            height: photo.height,
            photographer,
            description: photo.description.or(photo.alt_description),
        }
    }
}

/// Provider backed by `GET /search/photos`.
///
/// The access key travels as `Authorization: Client-ID <key>` on search
/// requests only; downloads hit the public image CDN. Searches always ask for
/// `content_filter=high`.
pub struct UnsplashProvider {
    client: reqwest::Client,
    api_url: String,
    auth: HeaderValue,
    max_download_bytes: usize,
}

impl UnsplashProvider {
    /// Builds a client for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Other`] if the key is not a valid header value,
    /// or [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(access_key: &str, api_url: &str) -> ProviderResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Client-ID {}", access_key))
            .map_err(|e| ProviderError::Other(format!("invalid access key: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("Accept-Version", HeaderValue::from_static("v1"));

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_url: format!("{}/search/photos", api_url.trim_end_matches('/')),
            auth,
            max_download_bytes: MAX_DOWNLOAD_BYTES,
        })
    }
}

#[async_trait]
impl ImageProvider for UnsplashProvider {
    fn name(&self) -> &'static str {
        "unsplash"
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<ImageCandidate>> {
        let per_page = RESULTS_PER_QUERY.to_string();
        let body = self
            .client
            .get(&self.api_url)
            .header(AUTHORIZATION, self.auth.clone())
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("content_filter", "high"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let candidates = parse_search_response(&body)?;

        debug!(query, results = candidates.len(), "Unsplash search");
        Ok(candidates)
    }

    async fn download(&self, url: &str) -> ProviderResult<DownloadedImage> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let limit = self.max_download_bytes;
        if let Some(declared) = response.content_length()
            && declared > limit as u64
        {
            return Err(too_large(declared, limit));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            append_within_limit(&mut bytes, &chunk, limit)?;
        }

        Ok(DownloadedImage {
            bytes,
            content_type,
        })
    }
}

fn too_large(size: u64, limit: usize) -> ProviderError {
    ProviderError::InvalidResponse(format!(
        "image body of {} bytes exceeds the {} byte limit",
        size, limit
    ))
}

/// Appends a body chunk, failing once the body would exceed `limit`.
fn append_within_limit(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> ProviderResult<()> {
    let size = buf.len() + chunk.len();
    if size > limit {
        return Err(too_large(size as u64, limit));
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

/// Maps a raw search body into candidates, preserving provider order.
fn parse_search_response(body: &str) -> ProviderResult<Vec<ImageCandidate>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("search body: {}", e)))?;
    Ok(response
        .results
        .into_iter()
        .map(ImageCandidate::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"{
        "total": 2,
        "total_pages": 1,
        "results": [
            {
                "id": "dog-1",
                "width": 4000,
                "height": 3000,
                "description": null,
                "alt_description": "brown dog on grass",
                "urls": { "raw": "r", "full": "f", "regular": "g", "small": "https://images.example/dog-1?w=400", "thumb": "t" },
                "user": { "name": "Jane Doe", "username": "jdoe" }
            },
            {
                "id": "dog-2",
                "width": 800,
                "height": 600,
                "description": "A puppy",
                "urls": { "small": "https://images.example/dog-2?w=400" },
                "user": { "name": null, "username": "pup" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_search_response_maps_candidates() {
        let candidates = parse_search_response(SEARCH_BODY).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "dog-1");
        assert_eq!(
            candidates[0].download_url,
            "https://images.example/dog-1?w=400"
        );
        assert_eq!(candidates[0].photographer.as_deref(), Some("Jane Doe"));
        assert_eq!(
            candidates[0].description.as_deref(),
            Some("brown dog on grass")
        );
        assert_eq!(candidates[1].photographer.as_deref(), Some("pup"));
        assert_eq!(candidates[1].description.as_deref(), Some("A puppy"));
    }

    #[test]
    fn test_parse_search_response_empty() {
        let candidates = parse_search_response(r#"{"total":0,"results":[]}"#).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_parse_search_response_rejects_garbage() {
        let result = parse_search_response("<html>rate limited</html>");
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_append_within_limit_stops_at_limit() {
        let mut buf = Vec::new();

        append_within_limit(&mut buf, &[0u8; 6], 10).unwrap();
        append_within_limit(&mut buf, &[0u8; 4], 10).unwrap();
        let overflow = append_within_limit(&mut buf, &[0u8; 1], 10);

        assert!(matches!(overflow, Err(ProviderError::InvalidResponse(_))));
        assert_eq!(buf.len(), 10);
    }

    async fn serve_image(body: Vec<u8>) -> String {
        use axum::{Router, http::header, routing::get};

        let app = Router::new().route(
            "/image",
            get(move || {
                let body = body.clone();
                async move { ([(header::CONTENT_TYPE, "image/png")], body) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/image", addr)
    }

    #[tokio::test]
    async fn test_download_reads_body_within_limit() {
        let url = serve_image(vec![7u8; 64]).await;
        let provider = UnsplashProvider::new("key", "https://api.unsplash.com").unwrap();

        let image = provider.download(&url).await.unwrap();

        assert_eq!(image.bytes.len(), 64);
        assert_eq!(image.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_download_rejects_oversized_body() {
        let url = serve_image(vec![7u8; 64]).await;
        let mut provider = UnsplashProvider::new("key", "https://api.unsplash.com").unwrap();
        provider.max_download_bytes = 16;

        let result = provider.download(&url).await;

        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_new_builds_search_url() {
        let provider = UnsplashProvider::new("key", "https://api.unsplash.com/").unwrap();
        assert_eq!(provider.api_url, "https://api.unsplash.com/search/photos");
    }
}
