//! Upstream image providers.
//!
//! Provides an [`ImageProvider`] trait with two implementations:
//! - [`UnsplashProvider`] - Unsplash search API over HTTPS
//! - [`PlaceholderProvider`] - Deterministic generated images for tests and development

mod placeholder;
mod service;
mod unsplash;

pub use placeholder::PlaceholderProvider;
pub use service::{ImageProvider, ProviderError, ProviderResult};
pub use unsplash::UnsplashProvider;

#[cfg(test)]
pub use service::MockImageProvider;
