//! Application layer services implementing business logic.
//!
//! Services consume repository traits and provide a clean API for HTTP
//! handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation with collision handling
//! - [`services::resolver_service::ResolverService`] - Code resolution with click reporting
//! - [`services::click_tracker::ClickTracker`] - Non-blocking click queue
//! - [`services::rate_limiter::RateLimiter`] - Fixed-window quotas, per route and global
//! - [`services::stats_service::StatsService`] - Daily click analytics

pub mod services;
