//! Business logic services for the application layer.

pub mod click_tracker;
pub mod link_service;
pub mod rate_limiter;
pub mod resolver_service;
pub mod stats_service;

pub use click_tracker::ClickTracker;
pub use link_service::LinkService;
pub use rate_limiter::{LimitScope, RateDecision, RateLimitStatus, RateLimiter};
pub use resolver_service::ResolverService;
pub use stats_service::{LinkClicks, StatsService};
