//! Application layer: pipeline components and their wiring.
//!
//! - [`services`] - Cache, rate limiter, queue, locks, worker, populator, admin
//! - [`pipeline`] - Builds all of them around one shared store

pub mod pipeline;
pub mod services;

pub use pipeline::{Pipeline, PipelineSettings};
