//! Counter store trait backing the fixed-window rate limiter.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CounterStoreError {
    #[error("Counter store connection error: {0}")]
    ConnectionError(String),
    #[error("Counter store operation error: {0}")]
    OperationError(String),
    #[error("Rate limit window must be at least one second")]
    InvalidWindow,
}

pub type CounterResult<T> = Result<T, CounterStoreError>;

/// Result of consuming one unit of quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    pub allowed: bool,
    /// Counter value after the hit (unchanged when denied).
    pub count: u64,
    /// Seconds until the current window closes.
    pub ttl_seconds: u64,
}

/// Read-only view of a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub count: u64,
    /// Remaining lifetime of the window; `None` when the key is absent or has no expiry.
    pub ttl_seconds: Option<u64>,
}

/// Key-value store holding expiring integer counters.
///
/// `hit` must be atomic per key: the counter and its expiry are created
/// together, and a denied hit does not increment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Applies one fixed-window hit to `key`.
    ///
    /// Absent key: set to 1 with expiry `window_secs`, allow.
    /// Present key below `limit`: increment, allow.
    /// Otherwise: deny without incrementing.
    ///
    /// A zero `window_secs` is rejected with [`CounterStoreError::InvalidWindow`].
    async fn hit(&self, key: &str, limit: u64, window_secs: u64) -> CounterResult<HitOutcome>;

    /// Reads a counter without consuming quota.
    async fn read(&self, key: &str) -> CounterResult<CounterSnapshot>;

    /// Deletes a counter, starting a fresh window on the next hit.
    async fn delete(&self, key: &str) -> CounterResult<()>;

    async fn health_check(&self) -> bool;
}
