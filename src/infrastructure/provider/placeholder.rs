//! Deterministic placeholder images.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;

use super::service::{ImageProvider, ProviderError, ProviderResult};
use crate::domain::entities::{DownloadedImage, ImageCandidate};

const URL_SCHEME: &str = "placeholder://";

/// Generates a solid-colour PNG per query instead of calling a real API.
///
/// The colour is derived from the query hash, so the same query always
/// yields the same image. Used when no provider credential is configured and
/// in tests, where it exercises the full download and transform path without
/// network access.
#[derive(Debug, Clone)]
pub struct PlaceholderProvider {
    width: u32,
    height: u32,
}

impl PlaceholderProvider {
    pub fn new() -> Self {
        Self::with_dimensions(640, 480)
    }

    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn colour_for(seed: &str) -> Rgb<u8> {
        let digest = Sha256::digest(seed.as_bytes());
        Rgb([digest[0], digest[1], digest[2]])
    }
}

impl Default for PlaceholderProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProvider for PlaceholderProvider {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<ImageCandidate>> {
        Ok(vec![ImageCandidate {
            id: format!("placeholder-{}", hex::encode(&Sha256::digest(query.as_bytes())[..6])),
            download_url: format!("{}{}", URL_SCHEME, query),
            width: self.width,
            height: self.height,
            photographer: None,
            description: Some(format!("Placeholder for '{}'", query)),
        }])
    }

    async fn download(&self, url: &str) -> ProviderResult<DownloadedImage> {
        let seed = url
            .strip_prefix(URL_SCHEME)
            .ok_or_else(|| ProviderError::Other(format!("not a placeholder URL: {}", url)))?;

        let canvas = RgbImage::from_pixel(self.width, self.height, Self::colour_for(seed));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| ProviderError::Other(format!("placeholder encoding failed: {}", e)))?;

        Ok(DownloadedImage {
            bytes,
            content_type: Some("image/png".to_string()),
        })
    }
}
