//! Pure helpers shared by the pipeline components.
//!
//! - [`normalize`] - Word normalization and cache key derivation
//! - [`search_queries`] - Ordered provider queries for a word
//! - [`image_transform`] - Decode, downscale and re-encode to JPEG
//! - [`top_words`] - Curated pre-warm list

pub mod image_transform;
pub mod normalize;
pub mod search_queries;
pub mod top_words;
