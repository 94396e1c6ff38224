//! Fixed-window rate limiting driven by an explicit route table.
//!
//! Two layers share the [`RateLimiter`](crate::application::services::RateLimiter):
//!
//! - [`enforce_route_limits`] is attached with `route_layer`, looks up the
//!   matched route in [`RateLimitPolicy`] and consumes that route's quota.
//! - [`enforce_global_limits`] wraps the whole router and applies the
//!   per-client minute and hour ceilings.
//!
//! Responses passing a route limit carry `X-RateLimit-Limit`,
//! `X-RateLimit-Remaining` and `X-RateLimit-Reset`. Denied requests get
//! `429 Too Many Requests` with the same headers plus `Retry-After`.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::middleware::owner::owner_id_from_headers;
use crate::application::services::{LimitScope, RateLimitStatus};
use crate::domain::entities::Owner;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

pub const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// How the counter key of a route limit is derived from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// One counter per owner; falls back to the client IP without an owner.
    PerOwner,
    /// One counter per client IP.
    PerIp,
    /// A single counter shared by every caller.
    Fixed(&'static str),
}

/// Quota of one `(method, route)` pair.
#[derive(Debug, Clone)]
pub struct RouteLimit {
    pub method: Method,
    /// Route template as registered with the router, e.g. `/api/links/{code}/clicks`.
    pub route: &'static str,
    pub limit: u64,
    pub window_secs: u64,
    pub key: KeyStrategy,
}

impl RouteLimit {
    pub fn new(
        method: Method,
        route: &'static str,
        limit: u64,
        window_secs: u64,
        key: KeyStrategy,
    ) -> Self {
        Self {
            method,
            route,
            limit,
            window_secs,
            key,
        }
    }

    /// Counter key for a request: `<METHOD>:<route>:<identity>`.
    pub fn counter_key(&self, owner_id: Option<i64>, client: &str) -> String {
        let identity = match (self.key, owner_id) {
            (KeyStrategy::PerOwner, Some(id)) => format!("owner:{id}"),
            (KeyStrategy::PerOwner, None) | (KeyStrategy::PerIp, _) => format!("ip:{client}"),
            (KeyStrategy::Fixed(name), _) => name.to_string(),
        };

        format!("{}:{}:{}", self.method, self.route, identity)
    }
}

/// Service-wide per-client ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalLimits {
    pub per_minute: u64,
    pub per_hour: u64,
}

/// The complete rate limit configuration consulted by both layers.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub routes: Vec<RouteLimit>,
    /// `None` disables the global limits.
    pub global: Option<GlobalLimits>,
}

impl RateLimitPolicy {
    pub fn new(routes: Vec<RouteLimit>, global: Option<GlobalLimits>) -> Self {
        Self { routes, global }
    }

    /// The per-route quotas of the public API.
    pub fn default_routes() -> Vec<RouteLimit> {
        vec![
            RouteLimit::new(Method::POST, "/api/links", 50, 60, KeyStrategy::PerOwner),
            RouteLimit::new(
                Method::GET,
                "/api/links/{code}/clicks",
                50,
                60,
                KeyStrategy::PerOwner,
            ),
            RouteLimit::new(Method::GET, "/{code}", 200, 60, KeyStrategy::PerIp),
            RouteLimit::new(Method::GET, "/api/resolve/{code}", 100, 60, KeyStrategy::PerIp),
        ]
    }

    pub fn find(&self, method: &Method, route: &str) -> Option<&RouteLimit> {
        self.routes
            .iter()
            .find(|r| r.method == method && r.route == route)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(
            Self::default_routes(),
            Some(GlobalLimits {
                per_minute: 1_000,
                per_hour: 10_000,
            }),
        )
    }
}

fn peer_addr(req: &Request) -> Option<SocketAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

fn insert_status_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(status.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(status.remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(status.reset_epoch_seconds));
}

fn too_many_requests(status: &RateLimitStatus) -> Response {
    let retry_after = status.retry_after_secs();

    let mut response = AppError::rate_limited(
        "Rate limit exceeded, try again later",
        json!({ "limit": status.limit, "retry_after": retry_after }),
    )
    .into_response();

    let headers = response.headers_mut();
    insert_status_headers(headers, status);
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));

    response
}

/// Applies the route table entry for the matched route, if there is one.
///
/// Must be attached with `route_layer` so [`MatchedPath`] is available.
pub async fn enforce_route_limits(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let rule = req
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| state.rate_limit_policy.find(req.method(), path.as_str()))
        .cloned();

    let Some(rule) = rule else {
        return next.run(req).await;
    };

    let owner_id = req
        .extensions()
        .get::<Owner>()
        .map(|owner| owner.id)
        .or_else(|| owner_id_from_headers(req.headers()));
    let client = client_ip(req.headers(), peer_addr(&req), state.behind_proxy);
    let key = rule.counter_key(owner_id, &client);

    let decision = state
        .rate_limiter
        .check(LimitScope::Endpoint, &key, rule.limit, rule.window_secs)
        .await;

    if !decision.allowed {
        tracing::info!(key = %key, limit = rule.limit, "Request rejected by route limit");
        return too_many_requests(&decision.status);
    }

    let mut response = next.run(req).await;
    insert_status_headers(response.headers_mut(), &decision.status);
    response
}

/// Applies the global per-client minute and hour limits.
pub async fn enforce_global_limits(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(global) = state.rate_limit_policy.global else {
        return next.run(req).await;
    };

    let client = client_ip(req.headers(), peer_addr(&req), state.behind_proxy);
    let decision = state
        .rate_limiter
        .allow_global(&client, global.per_minute, global.per_hour)
        .await;

    if !decision.allowed {
        tracing::info!(client = %client, "Request rejected by global limit");
        return too_many_requests(&decision.status);
    }

    next.run(req).await
}
