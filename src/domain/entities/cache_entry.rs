//! Cached outcome of an image acquisition attempt.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

/// A processed image ready to be served.
///
/// `image_data` is always the re-encoded payload (JPEG), never the raw
/// upstream download. It travels through the store as base64.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    #[serde_as(as = "Base64")]
    pub image_data: Vec<u8>,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    /// The search query that produced this image.
    pub search_query: String,
    pub photo_id: Option<String>,
    pub photographer: Option<String>,
    pub description: Option<String>,
}

/// Cached outcome for one normalized word.
///
/// Serialized with a `status` tag so readers in other processes can tell the
/// two shapes apart without guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CacheEntry {
    Success {
        word: String,
        image: ImageResult,
        cached_at: DateTime<Utc>,
    },
    Failure {
        word: String,
        reason: String,
        failed_at: DateTime<Utc>,
    },
}

impl CacheEntry {
    pub fn success(word: impl Into<String>, image: ImageResult, cached_at: DateTime<Utc>) -> Self {
        Self::Success {
            word: word.into(),
            image,
            cached_at,
        }
    }

    pub fn failure(
        word: impl Into<String>,
        reason: impl Into<String>,
        failed_at: DateTime<Utc>,
    ) -> Self {
        Self::Failure {
            word: word.into(),
            reason: reason.into(),
            failed_at,
        }
    }

    pub fn word(&self) -> &str {
        match self {
            Self::Success { word, .. } | Self::Failure { word, .. } => word,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { cached_at, .. } => *cached_at,
            Self::Failure { failed_at, .. } => *failed_at,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn image(&self) -> Option<&ImageResult> {
        match self {
            Self::Success { image, .. } => Some(image),
            Self::Failure { .. } => None,
        }
    }

    /// Returns true if the entry permits a fresh acquisition attempt.
    ///
    /// Success entries always report `true`; failures only once they are at
    /// least `retry_after` old.
    pub fn is_retry_eligible(&self, now: DateTime<Utc>, retry_after: TimeDelta) -> bool {
        match self {
            Self::Success { .. } => true,
            Self::Failure { failed_at, .. } => now - *failed_at >= retry_after,
        }
    }

    /// Returns true if the entry already satisfies a request for this word.
    ///
    /// A success always does. A failure does until its retry window elapses.
    pub fn blocks_enqueue(&self, now: DateTime<Utc>, retry_after: TimeDelta) -> bool {
        match self {
            Self::Success { .. } => true,
            Self::Failure { .. } => !self.is_retry_eligible(now, retry_after),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_image() -> ImageResult {
        ImageResult {
            image_data: vec![0xFF, 0xD8, 0xFF],
            content_type: "image/jpeg".to_string(),
            width: 400,
            height: 300,
            size_bytes: 3,
            search_query: "dog".to_string(),
            photo_id: Some("abc".to_string()),
            photographer: Some("Jane Doe".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_failure_retry_window() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let entry = CacheEntry::failure("xyzzy", "no suitable image found", t);
        let window = TimeDelta::hours(24);

        assert!(!entry.is_retry_eligible(t + TimeDelta::hours(1), window));
        assert!(entry.blocks_enqueue(t + TimeDelta::hours(1), window));

        assert!(entry.is_retry_eligible(t + TimeDelta::hours(25), window));
        assert!(!entry.blocks_enqueue(t + TimeDelta::hours(25), window));
    }

    #[test]
    fn test_success_always_blocks_enqueue() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let entry = CacheEntry::success("pas", sample_image(), t);
        let later = t + TimeDelta::days(29);

        assert!(entry.is_retry_eligible(later, TimeDelta::hours(24)));
        assert!(entry.blocks_enqueue(later, TimeDelta::hours(24)));
    }

    #[test]
    fn test_serialized_form_is_tagged_and_base64() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let entry = CacheEntry::success("pas", sample_image(), t);

        let json: serde_json::Value = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["image"]["image_data"], "/9j/");

        let back: CacheEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_accessors() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let entry = CacheEntry::failure("xyzzy", "boom", t);

        assert_eq!(entry.word(), "xyzzy");
        assert_eq!(entry.timestamp(), t);
        assert!(!entry.is_success());
        assert!(entry.image().is_none());
    }
}
