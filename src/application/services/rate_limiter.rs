//! Fixed-window rate limiting over a shared counter store.
//!
//! Endpoint and global counters live in separate key namespaces so a route
//! key can never collide with a per-IP global key. When the counter store is
//! unreachable every check is allowed (fail open) and the event is logged and
//! counted.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::error::AppError;
use crate::infrastructure::rate_limit::{CounterStore, CounterStoreError};

pub const MINUTE_SECS: u64 = 60;
pub const HOUR_SECS: u64 = 3_600;

/// Counter namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    /// Per-route limits from the route table.
    Endpoint,
    /// Service-wide per-client limits.
    Global,
}

impl LimitScope {
    fn prefix(self) -> &'static str {
        match self {
            LimitScope::Endpoint => "rate:",
            LimitScope::Global => "global-rate:",
        }
    }

    pub fn key(self, key: &str) -> String {
        format!("{}{}", self.prefix(), key)
    }
}

/// Quota state of one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub count: u64,
    pub limit: u64,
    pub remaining: u64,
    /// Unix time (seconds) at which the window resets.
    pub reset_epoch_seconds: i64,
}

impl RateLimitStatus {
    fn new(count: u64, limit: u64, ttl_seconds: u64) -> Self {
        Self {
            count,
            limit,
            remaining: limit.saturating_sub(count),
            reset_epoch_seconds: Utc::now().timestamp() + ttl_seconds as i64,
        }
    }

    /// Seconds until the window resets, never less than one.
    pub fn retry_after_secs(&self) -> u64 {
        (self.reset_epoch_seconds - Utc::now().timestamp()).max(1) as u64
    }
}

/// Outcome of consuming quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub status: RateLimitStatus,
}

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Consumes one unit of the endpoint quota for `key`.
    pub async fn allow(&self, key: &str, limit: u64, window_secs: u64) -> bool {
        self.check(LimitScope::Endpoint, key, limit, window_secs)
            .await
            .allowed
    }

    /// Consumes one unit of quota and reports the resulting counter state.
    pub async fn check(
        &self,
        scope: LimitScope,
        key: &str,
        limit: u64,
        window_secs: u64,
    ) -> RateDecision {
        let full_key = scope.key(key);

        match self.store.hit(&full_key, limit, window_secs).await {
            Ok(outcome) => {
                if !outcome.allowed {
                    metrics::counter!("rate_limit_denied_total").increment(1);
                    tracing::debug!(key = %full_key, count = outcome.count, limit, "Rate limit exceeded");
                }

                RateDecision {
                    allowed: outcome.allowed,
                    status: RateLimitStatus::new(outcome.count, limit, outcome.ttl_seconds),
                }
            }
            Err(e) => {
                metrics::counter!("rate_limit_fail_open_total").increment(1);
                tracing::warn!(key = %full_key, error = %e, "Rate limit store unavailable, allowing request");

                RateDecision {
                    allowed: true,
                    status: RateLimitStatus::new(0, limit, window_secs),
                }
            }
        }
    }

    /// Applies the global per-client limits.
    ///
    /// The request is denied if either the per-minute or the per-hour window
    /// is exhausted. The hour window is only consumed when the minute window
    /// allows the request.
    pub async fn allow_global(
        &self,
        identifier: &str,
        per_minute: u64,
        per_hour: u64,
    ) -> RateDecision {
        let minute = self
            .check(
                LimitScope::Global,
                &format!("{identifier}:minute"),
                per_minute,
                MINUTE_SECS,
            )
            .await;

        if !minute.allowed {
            return minute;
        }

        let hour = self
            .check(
                LimitScope::Global,
                &format!("{identifier}:hour"),
                per_hour,
                HOUR_SECS,
            )
            .await;

        if !hour.allowed {
            return hour;
        }

        // Report whichever window is closer to its limit.
        if hour.status.remaining < minute.status.remaining {
            hour
        } else {
            minute
        }
    }

    /// Reads the endpoint quota for `key` without consuming it.
    pub async fn status(
        &self,
        key: &str,
        limit: u64,
        window_secs: u64,
    ) -> Result<RateLimitStatus, AppError> {
        self.status_in(LimitScope::Endpoint, key, limit, window_secs)
            .await
    }

    pub async fn status_in(
        &self,
        scope: LimitScope,
        key: &str,
        limit: u64,
        window_secs: u64,
    ) -> Result<RateLimitStatus, AppError> {
        let snapshot = self
            .store
            .read(&scope.key(key))
            .await
            .map_err(store_unavailable)?;

        Ok(RateLimitStatus::new(
            snapshot.count,
            limit,
            snapshot.ttl_seconds.unwrap_or(window_secs),
        ))
    }

    /// Clears the endpoint counter for `key`.
    pub async fn reset(&self, key: &str) -> Result<(), AppError> {
        self.reset_in(LimitScope::Endpoint, key).await
    }

    pub async fn reset_in(&self, scope: LimitScope, key: &str) -> Result<(), AppError> {
        let full_key = scope.key(key);
        self.store
            .delete(&full_key)
            .await
            .map_err(store_unavailable)?;

        tracing::info!(key = %full_key, "Rate limit counter reset");
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }
}

fn store_unavailable(e: CounterStoreError) -> AppError {
    AppError::unavailable(
        "Rate limit store unavailable",
        json!({ "reason": e.to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::rate_limit::{MemoryCounterStore, MockCounterStore};

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryCounterStore::new()))
    }

    #[tokio::test]
    async fn test_fixed_window_allows_up_to_limit() {
        let limiter = limiter();

        let mut results = Vec::new();
        for _ in 0..4 {
            results.push(limiter.allow("k", 3, 60).await);
        }

        assert_eq!(results, vec![true, true, true, false]);
    }

    #[tokio::test]
    async fn test_status_after_limit_reached() {
        let limiter = limiter();
        for _ in 0..3 {
            limiter.allow("k", 3, 60).await;
        }

        let status = limiter.status("k", 3, 60).await.unwrap();
        let now = Utc::now().timestamp();

        assert_eq!(status.count, 3);
        assert_eq!(status.remaining, 0);
        assert!(status.reset_epoch_seconds > now && status.reset_epoch_seconds <= now + 60);
    }

    #[tokio::test]
    async fn test_status_of_unknown_key_uses_full_window() {
        let limiter = limiter();
        let now = Utc::now().timestamp();

        let status = limiter.status("fresh", 5, 60).await.unwrap();

        assert_eq!(status.count, 0);
        assert_eq!(status.remaining, 5);
        assert!(status.reset_epoch_seconds >= now + 60);
    }

    #[tokio::test]
    async fn test_reset_restores_quota() {
        let limiter = limiter();
        for _ in 0..4 {
            limiter.allow("k", 3, 60).await;
        }

        limiter.reset("k").await.unwrap();

        assert!(limiter.allow("k", 3, 60).await);
    }

    #[tokio::test]
    async fn test_scopes_do_not_share_counters() {
        let limiter = limiter();

        assert!(limiter.check(LimitScope::Endpoint, "k", 1, 60).await.allowed);
        assert!(limiter.check(LimitScope::Global, "k", 1, 60).await.allowed);
        assert!(!limiter.check(LimitScope::Endpoint, "k", 1, 60).await.allowed);
    }

    #[tokio::test]
    async fn test_global_denies_when_minute_exhausted() {
        let limiter = limiter();

        assert!(limiter.allow_global("10.0.0.1", 2, 100).await.allowed);
        assert!(limiter.allow_global("10.0.0.1", 2, 100).await.allowed);
        assert!(!limiter.allow_global("10.0.0.1", 2, 100).await.allowed);
        assert!(limiter.allow_global("10.0.0.2", 2, 100).await.allowed);
    }

    #[tokio::test]
    async fn test_global_denies_when_hour_exhausted() {
        let limiter = limiter();

        assert!(limiter.allow_global("10.0.0.1", 100, 1).await.allowed);

        let denied = limiter.allow_global("10.0.0.1", 100, 1).await;
        assert!(!denied.allowed);
        assert_eq!(denied.status.limit, 1);
    }

    #[tokio::test]
    async fn test_fails_open_when_store_unavailable() {
        let mut store = MockCounterStore::new();
        store
            .expect_hit()
            .returning(|_, _, _| Err(CounterStoreError::ConnectionError("refused".into())));

        let limiter = RateLimiter::new(Arc::new(store));

        for _ in 0..5 {
            assert!(limiter.allow("k", 1, 60).await);
        }
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let mut store = MockCounterStore::new();
        store
            .expect_hit()
            .withf(|key, _, _| key == "global-rate:1.2.3.4:minute")
            .times(1)
            .returning(|_, _, _| {
                Ok(crate::infrastructure::rate_limit::HitOutcome {
                    allowed: false,
                    count: 10,
                    ttl_seconds: 30,
                })
            });

        let limiter = RateLimiter::new(Arc::new(store));
        let decision = limiter.allow_global("1.2.3.4", 10, 100).await;

        assert!(!decision.allowed);
        assert_eq!(decision.status.remaining, 0);
    }
}
