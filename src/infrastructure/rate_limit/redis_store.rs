//! Redis counter store.
//!
//! The fixed-window hit runs as a single Lua script, so a counter is never
//! created without its expiry. A key that lost its expiry gets one re-applied.

use super::store::{CounterResult, CounterSnapshot, CounterStore, CounterStoreError, HitOutcome};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use std::sync::LazyLock;
use tracing::info;

static FIXED_WINDOW_HIT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
local window = tonumber(ARGV[2])
local current = redis.call('GET', KEYS[1])
if not current then
  redis.call('SET', KEYS[1], 1, 'EX', window)
  return {1, 1, window}
end
current = tonumber(current) or 0
local ttl = redis.call('TTL', KEYS[1])
if ttl < 0 then
  redis.call('EXPIRE', KEYS[1], window)
  ttl = window
end
if current >= tonumber(ARGV[1]) then
  return {0, current, ttl}
end
return {1, redis.call('INCR', KEYS[1]), ttl}
"#,
    )
});

pub struct RedisCounterStore {
    client: ConnectionManager,
}

impl RedisCounterStore {
    /// Connects to Redis and validates the connection with a PING.
    pub async fn connect(redis_url: &str) -> CounterResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CounterStoreError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CounterStoreError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn.ping::<()>().await.map_err(|e| {
            CounterStoreError::ConnectionError(format!("Redis PING failed: {}", e))
        })?;

        info!("Connected to Redis (rate limit counters)");

        Ok(Self { client: manager })
    }
}

fn op_error(op: &str, key: &str, e: redis::RedisError) -> CounterStoreError {
    CounterStoreError::OperationError(format!("{} {}: {}", op, key, e))
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn hit(&self, key: &str, limit: u64, window_secs: u64) -> CounterResult<HitOutcome> {
        if window_secs == 0 {
            return Err(CounterStoreError::InvalidWindow);
        }

        let mut conn = self.client.clone();

        let (allowed, count, ttl): (i64, i64, i64) = FIXED_WINDOW_HIT
            .key(key)
            .arg(limit)
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| op_error("HIT", key, e))?;

        Ok(HitOutcome {
            allowed: allowed == 1,
            count: count.max(0) as u64,
            ttl_seconds: ttl.max(0) as u64,
        })
    }

    async fn read(&self, key: &str) -> CounterResult<CounterSnapshot> {
        let mut conn = self.client.clone();

        let (count, ttl): (Option<i64>, i64) = redis::pipe()
            .get(key)
            .ttl(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| op_error("READ", key, e))?;

        Ok(CounterSnapshot {
            count: count.unwrap_or(0).max(0) as u64,
            // TTL is -2 for a missing key and -1 for a key without expiry.
            ttl_seconds: (ttl >= 0).then_some(ttl as u64),
        })
    }

    async fn delete(&self, key: &str) -> CounterResult<()> {
        let mut conn = self.client.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| op_error("DEL", key, e))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}

/// These run against a live server: `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (RedisCounterStore, ConnectionManager) {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let store = RedisCounterStore::connect(&url).await.unwrap();
        let conn = store.client.clone();
        (store, conn)
    }

    fn unique_key(name: &str) -> String {
        format!(
            "test:{}:{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        )
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_fixed_window_sequence() {
        let (store, mut conn) = store().await;
        let key = unique_key("sequence");

        let mut allowed = Vec::new();
        for _ in 0..4 {
            allowed.push(store.hit(&key, 3, 60).await.unwrap().allowed);
        }

        assert_eq!(allowed, vec![true, true, true, false]);
        assert_eq!(store.read(&key).await.unwrap().count, 3);
        conn.del::<_, ()>(&key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_first_hit_sets_expiry() {
        let (store, mut conn) = store().await;
        let key = unique_key("first-hit");

        let outcome = store.hit(&key, 5, 60).await.unwrap();
        let ttl: i64 = conn.ttl(&key).await.unwrap();

        assert!(outcome.allowed);
        assert_eq!(outcome.count, 1);
        assert!(ttl > 0 && ttl <= 60);
        conn.del::<_, ()>(&key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_hit_rearms_lost_expiry() {
        let (store, mut conn) = store().await;
        let key = unique_key("lost-ttl");
        conn.set::<_, _, ()>(&key, 2).await.unwrap();
        assert_eq!(conn.ttl::<_, i64>(&key).await.unwrap(), -1);

        let outcome = store.hit(&key, 5, 60).await.unwrap();
        let ttl: i64 = conn.ttl(&key).await.unwrap();

        assert!(outcome.allowed);
        assert_eq!(outcome.count, 3);
        assert!(ttl > 0 && ttl <= 60);
        conn.del::<_, ()>(&key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_delete_then_allow() {
        let (store, _conn) = store().await;
        let key = unique_key("reset");
        store.hit(&key, 1, 60).await.unwrap();
        assert!(!store.hit(&key, 1, 60).await.unwrap().allowed);

        store.delete(&key).await.unwrap();

        assert_eq!(store.read(&key).await.unwrap(), CounterSnapshot::default());
        assert!(store.hit(&key, 1, 60).await.unwrap().allowed);
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_zero_window_is_rejected() {
        let (store, mut conn) = store().await;
        let key = unique_key("zero-window");

        let result = store.hit(&key, 1, 0).await;

        assert!(matches!(result, Err(CounterStoreError::InvalidWindow)));
        assert!(!conn.exists::<_, bool>(&key).await.unwrap());
    }
}
