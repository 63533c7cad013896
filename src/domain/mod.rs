//! Domain layer: entities, time source, and repository contracts.
//!
//! - [`entities`] - Cache entries, queue jobs, provider candidates
//! - [`repositories`] - Data access trait definitions
//! - [`clock`] - Injectable wall clock for TTL and bucket arithmetic
//!
//! Nothing here talks to Redis, Postgres or the network.

pub mod clock;
pub mod entities;
pub mod repositories;
