//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`                   - Short link redirect (public)
//! - `GET  /health`                   - Health check: DB, cache, click queue, counters
//! - `POST /api/links`                - Create a short link (owner headers required)
//! - `GET  /api/links/{code}/clicks`  - Daily clicks (owner headers required)
//! - `GET  /api/resolve/{code}`       - Resolve as JSON (public)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Timeout** - Per-request deadline
//! - **Global rate limit** - Per-client minute/hour ceilings
//! - **Route rate limits** - Per-route fixed windows from the policy table
//! - **Owner context** - `X-Owner-Id` / `X-Owner-Plan` on owner routes
//! - **Path normalization** - Trailing slash handling

use std::time::Duration;

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{owner, rate_limit, tracing};
use crate::state::AppState;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::timeout::TimeoutLayer;

/// Constructs the application router with trailing-slash normalization.
pub fn app_router(state: AppState, request_timeout: Duration) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state, request_timeout))
}

/// Constructs the router with all routes and middleware.
///
/// Requests running longer than `request_timeout` are answered with
/// `408 Request Timeout`; dropping the handler future cancels any pending
/// store call.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let route_limits = middleware::from_fn_with_state(state.clone(), rate_limit::enforce_route_limits);

    // Owner check runs first so anonymous calls never consume quota.
    let owner_api = api::routes::owner_routes()
        .route_layer(route_limits.clone())
        .route_layer(middleware::from_fn(owner::layer));

    let public_api = api::routes::public_routes().route_layer(route_limits.clone());

    Router::new()
        .route("/{code}", get(redirect_handler))
        .route_layer(route_limits)
        .route("/health", get(health_handler))
        .nest("/api", owner_api.merge(public_api))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce_global_limits,
        ))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
        .layer(tracing::layer())
}
