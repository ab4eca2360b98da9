//! HTTP middleware for request processing and protection.
//!
//! Provides actor resolution, rate limiting, security headers and
//! observability middleware.

pub mod auth;
pub mod rate_limit;
pub mod security;
pub mod tracing;
