//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod admin;
pub mod health;
pub mod images;

pub use admin::{
    cache_stats_handler, clear_cache_handler, clear_cache_word_handler, status_handler,
};
pub use health::health_handler;
pub use images::{enqueue_handler, get_image_handler};
