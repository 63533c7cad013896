//! Pending image acquisition job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::normalize::normalize_word;

/// Provenance tags attached to jobs by their producers.
pub mod sources {
    pub const USER_VOCABULARY: &str = "user_vocabulary";
    pub const TOP_100: &str = "top_100";
    pub const RECENT: &str = "recent";
    pub const PRIORITY: &str = "priority";
    pub const API: &str = "api";
    pub const ADMIN: &str = "admin";
}

/// Name of the payload field holding the normalized word.
///
/// The store removes the membership entry by reading this field from the
/// popped payload, so it must match the serialized name of [`QueueJob::key`].
pub const JOB_KEY_FIELD: &str = "key";

/// One pending unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueJob {
    /// Normalized word; the queue identity of the job.
    pub key: String,
    /// The word as the producer supplied it (trimmed).
    pub word: String,
    /// Optional translation used to build search queries.
    pub translation: Option<String>,
    pub source: String,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueJob {
    /// Creates a job, deriving its key from the word.
    ///
    /// Blank translations are dropped so they never become search queries.
    pub fn new(
        word: &str,
        translation: Option<&str>,
        source: impl Into<String>,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: normalize_word(word),
            word: word.trim().to_string(),
            translation: translation
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            source: source.into(),
            enqueued_at,
        }
    }
}

/// Queue lane a job is pushed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Priority,
    Normal,
}

impl Lane {
    pub fn from_priority(priority: bool) -> Self {
        if priority { Self::Priority } else { Self::Normal }
    }
}

/// Result of an enqueue request that reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnqueueOutcome {
    Enqueued,
    /// Already cached, or already waiting in a lane.
    Duplicate,
}

impl EnqueueOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enqueued => "enqueued",
            Self::Duplicate => "duplicate",
        }
    }
}

/// Lane depths, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueLength {
    pub priority: u64,
    pub normal: u64,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_key_is_normalized() {
        let job = QueueJob::new("  Kuća ", Some("house"), sources::TOP_100, Utc::now());

        assert_eq!(job.key, "kuća");
        assert_eq!(job.word, "Kuća");
        assert_eq!(job.translation.as_deref(), Some("house"));
    }

    #[test]
    fn test_blank_translation_dropped() {
        let job = QueueJob::new("pas", Some("   "), sources::API, Utc::now());
        assert!(job.translation.is_none());
    }

    #[test]
    fn test_key_field_matches_serialized_name() {
        let job = QueueJob::new("pas", None, sources::API, Utc::now());
        let json = serde_json::to_value(&job).unwrap();

        assert_eq!(json[JOB_KEY_FIELD], "pas");
    }

    #[test]
    fn test_lane_from_priority() {
        assert_eq!(Lane::from_priority(true), Lane::Priority);
        assert_eq!(Lane::from_priority(false), Lane::Normal);
    }
}
