//! REST API layer for HTTP request/response handling.
//!
//! This layer translates HTTP requests into pipeline operations and formats
//! responses according to API contracts.
//!
//! # Modules
//!
//! - [`dto`] - Request/response bodies
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Authentication, throttling and tracing
//! - [`routes`] - Route configuration and composition

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
