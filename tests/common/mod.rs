#![allow(dead_code)]

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use shrinkurl::api::middleware::rate_limit::{GlobalLimits, RateLimitPolicy, RouteLimit};
use shrinkurl::domain::click_event::ClickEvent;
use shrinkurl::infrastructure::cache::MemoryCache;
use shrinkurl::infrastructure::rate_limit::MemoryCounterStore;
use shrinkurl::routes::build_router;
use shrinkurl::state::{AppState, StateSettings};

pub const BASE_URL: &str = "http://sho.rt";

pub async fn create_test_link(pool: &PgPool, code: &str, url: &str, owner_id: i64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO links (code, original_url, owner_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(code)
    .bind(url)
    .bind(owner_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_expired_link(pool: &PgPool, code: &str, url: &str, owner_id: i64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO links (code, original_url, owner_id, expires_at) \
         VALUES ($1, $2, $3, NOW() - INTERVAL '1 hour') RETURNING id",
    )
    .bind(code)
    .bind(url)
    .bind(owner_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_inactive_link(pool: &PgPool, code: &str, url: &str, owner_id: i64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO links (code, original_url, owner_id, is_active) \
         VALUES ($1, $2, $3, FALSE) RETURNING id",
    )
    .bind(code)
    .bind(url)
    .bind(owner_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn is_active(pool: &PgPool, code: &str) -> bool {
    sqlx::query_scalar("SELECT is_active FROM links WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn click_count(pool: &PgPool, code: &str) -> i64 {
    sqlx::query_scalar("SELECT click_count FROM links WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Policy with the default route table and no global limits.
pub fn route_policy() -> RateLimitPolicy {
    RateLimitPolicy::new(RateLimitPolicy::default_routes(), None)
}

/// Policy with custom routes and optional global limits.
pub fn custom_policy(routes: Vec<RouteLimit>, global: Option<GlobalLimits>) -> RateLimitPolicy {
    RateLimitPolicy::new(routes, global)
}

/// State backed by the test database and in-process cache and counters.
///
/// Client IPs are taken from `X-Forwarded-For`, so tests can act as
/// different clients.
pub fn create_test_state_with_policy(
    pool: PgPool,
    policy: RateLimitPolicy,
) -> (AppState, mpsc::Receiver<ClickEvent>) {
    let (tx, rx) = mpsc::channel(100);

    let state = AppState::new(
        Arc::new(pool),
        Arc::new(MemoryCache::new()),
        Arc::new(MemoryCounterStore::new()),
        tx,
        StateSettings {
            base_url: BASE_URL.to_string(),
            behind_proxy: true,
            rate_limit_policy: policy,
        },
    );

    (state, rx)
}

pub fn create_test_state(pool: PgPool) -> (AppState, mpsc::Receiver<ClickEvent>) {
    create_test_state_with_policy(pool, route_policy())
}

pub fn test_router(state: AppState) -> Router {
    build_router(state, Duration::from_secs(5))
}
