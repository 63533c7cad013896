//! Domain entities representing core business objects.

pub mod cache_entry;
pub mod image;
pub mod queue_job;
pub mod vocab_word;

pub use cache_entry::{CacheEntry, ImageResult};
pub use image::{DownloadedImage, ImageCandidate};
pub use queue_job::{EnqueueOutcome, JOB_KEY_FIELD, Lane, QueueJob, QueueLength, sources};
pub use vocab_word::VocabWord;
