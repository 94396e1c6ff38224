//! HTTP middleware for request processing and protection.
//!
//! Provides owner context extraction, rate limiting, and observability middleware.

pub mod owner;
pub mod rate_limit;
pub mod tracing;
