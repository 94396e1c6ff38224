//! Expiring counter stores for the fixed-window rate limiter.
//!
//! - [`RedisCounterStore`] - shared counters, atomic via a Lua script
//! - [`MemoryCounterStore`] - per-process counters for single-instance mode

mod memory_store;
mod redis_store;
mod store;

pub use memory_store::MemoryCounterStore;
pub use redis_store::RedisCounterStore;
pub use store::{CounterResult, CounterSnapshot, CounterStore, CounterStoreError, HitOutcome};

#[cfg(test)]
pub use store::MockCounterStore;
