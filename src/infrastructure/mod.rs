//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`cache`] - Link cache (Redis and in-memory implementations)
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`rate_limit`] - Expiring counter stores for the rate limiter
//! - [`resolver`] - Durable and cache-fronted code lookup

pub mod cache;
pub mod persistence;
pub mod rate_limit;
pub mod resolver;
