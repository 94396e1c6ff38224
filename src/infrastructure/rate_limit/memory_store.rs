//! In-process counter store used when Redis is not configured.

use super::store::{CounterResult, CounterSnapshot, CounterStore, CounterStoreError, HitOutcome};
use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::Op;
use moka::policy::Expiry;
use std::time::{Duration, Instant};

/// Counters kept before the least recently used ones are evicted.
pub const DEFAULT_CAPACITY: u64 = 1_000_000;

#[derive(Clone)]
struct Window {
    count: u64,
    expires_at: Instant,
}

/// Evicts a window when it closes, whatever its count.
struct WindowExpiry;

impl Expiry<String, Window> for WindowExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Window,
        created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Window,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(updated_at))
    }
}

/// Fixed-window counters kept in a bounded concurrent cache.
///
/// `hit` runs as a single per-key compute so the window and its expiry are
/// created together. Closed windows are evicted by the cache.
pub struct MemoryCounterStore {
    windows: Cache<String, Window>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let windows = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(WindowExpiry)
            .build();

        Self { windows }
    }

    /// Number of open windows, after pending evictions have been applied.
    pub async fn window_count(&self) -> u64 {
        self.windows.run_pending_tasks().await;
        self.windows.entry_count()
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(&self, key: &str, limit: u64, window_secs: u64) -> CounterResult<HitOutcome> {
        if window_secs == 0 {
            return Err(CounterStoreError::InvalidWindow);
        }

        let now = Instant::now();
        let window = Duration::from_secs(window_secs);
        let mut outcome = None;

        self.windows
            .entry(key.to_string())
            .and_compute_with(|current| {
                let (op, hit) = match current.map(|entry| entry.into_value()) {
                    Some(slot) if now < slot.expires_at => {
                        if slot.count < limit {
                            let next = Window {
                                count: slot.count + 1,
                                expires_at: slot.expires_at,
                            };
                            let hit = HitOutcome {
                                allowed: true,
                                count: next.count,
                                ttl_seconds: next.expires_at.saturating_duration_since(now).as_secs(),
                            };
                            (Op::Put(next), hit)
                        } else {
                            let hit = HitOutcome {
                                allowed: false,
                                count: slot.count,
                                ttl_seconds: slot.expires_at.saturating_duration_since(now).as_secs(),
                            };
                            (Op::Nop, hit)
                        }
                    }
                    _ => {
                        let hit = HitOutcome {
                            allowed: true,
                            count: 1,
                            ttl_seconds: window_secs,
                        };
                        let fresh = Window {
                            count: 1,
                            expires_at: now + window,
                        };
                        (Op::Put(fresh), hit)
                    }
                };

                outcome = Some(hit);
                std::future::ready(op)
            })
            .await;

        outcome.ok_or_else(|| CounterStoreError::OperationError(format!("no hit computed for {key}")))
    }

    async fn read(&self, key: &str) -> CounterResult<CounterSnapshot> {
        let now = Instant::now();

        let snapshot = self
            .windows
            .get(key)
            .await
            .filter(|w| now < w.expires_at)
            .map(|w| CounterSnapshot {
                count: w.count,
                ttl_seconds: Some(w.expires_at.saturating_duration_since(now).as_secs()),
            })
            .unwrap_or_default();

        Ok(snapshot)
    }

    async fn delete(&self, key: &str) -> CounterResult<()> {
        self.windows.invalidate(key).await;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
