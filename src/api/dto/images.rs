//! DTOs for the image endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::EnqueueOutcome;

/// Request to queue a word for image acquisition.
#[derive(Debug, Deserialize, Validate)]
pub struct EnqueueRequest {
    #[validate(length(min = 1, max = 100))]
    pub word: String,

    /// English gloss used to build better search queries.
    #[validate(length(max = 200))]
    pub translation: Option<String>,

    /// Origin tag recorded on the job (defaults to `api`).
    #[validate(length(min = 1, max = 50))]
    pub source: Option<String>,

    /// Places the job in the priority lane.
    #[serde(default)]
    pub priority: bool,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub word: String,
    pub outcome: EnqueueOutcome,
}

/// Body of `202 Accepted` when the image is not cached yet.
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub status: &'static str,
    pub word: String,
}

impl PendingResponse {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            status: "pending",
            word: word.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub removed: u64,
}
