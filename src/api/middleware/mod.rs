//! HTTP middleware: admin authentication, per-IP throttling and request tracing.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
