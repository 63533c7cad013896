//! Infrastructure layer for external integrations.
//!
//! # Modules
//!
//! - [`store`] - Shared state store (Redis and in-memory implementations)
//! - [`provider`] - Upstream image search providers
//! - [`persistence`] - PostgreSQL vocabulary source

pub mod persistence;
pub mod provider;
pub mod store;
