//! Cache-first decorator over a durable resolver store.
//!
//! Reads try the cache and fall back to the inner store on a miss or on any
//! cache error. A durable hit is written back to the cache in a detached task
//! so the caller never waits on it. The entry TTL is the link's remaining
//! lifetime, so a cached mapping can never outlive its link.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::ShortLink;
use crate::domain::repositories::{LookupSource, ResolvedLink, ResolverStore};
use crate::error::AppError;
use crate::infrastructure::cache::{CacheError, CacheService};

/// Outcome of deriving a cache TTL from a link's expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheTtl {
    /// Link never expires; store without TTL.
    Unbounded,
    Seconds(u64),
    /// Link expires within the next second; not worth caching.
    Skip,
}

pub(crate) fn cache_ttl(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> CacheTtl {
    match expires_at {
        None => CacheTtl::Unbounded,
        Some(at) => match (at - now).num_seconds() {
            secs if secs > 0 => CacheTtl::Seconds(secs as u64),
            _ => CacheTtl::Skip,
        },
    }
}

fn cache_error(e: CacheError) -> AppError {
    AppError::unavailable("Cache unavailable", json!({ "reason": e.to_string() }))
}

pub struct CachedResolverStore<S: ?Sized> {
    cache: Arc<dyn CacheService>,
    inner: Arc<S>,
}

impl<S: ResolverStore + ?Sized> CachedResolverStore<S> {
    pub fn new(cache: Arc<dyn CacheService>, inner: Arc<S>) -> Self {
        Self { cache, inner }
    }

    fn repopulate(&self, code: &str, url: &str, expires_at: Option<DateTime<Utc>>) {
        let ttl = match cache_ttl(expires_at, Utc::now()) {
            CacheTtl::Unbounded => None,
            CacheTtl::Seconds(secs) => Some(secs),
            CacheTtl::Skip => return,
        };

        let cache = self.cache.clone();
        let code = code.to_string();
        let url = url.to_string();

        tokio::spawn(async move {
            if let Err(e) = cache.set_url(&code, &url, ttl).await {
                tracing::warn!(code = %code, error = %e, "Cache repopulation failed");
            }
        });
    }
}

#[async_trait]
impl<S: ResolverStore + ?Sized + 'static> ResolverStore for CachedResolverStore<S> {
    async fn lookup(&self, code: &str) -> Result<Option<ResolvedLink>, AppError> {
        match self.cache.get_url(code).await {
            Ok(Some(url)) => {
                metrics::counter!("cache_hits_total").increment(1);
                return Ok(Some(ResolvedLink {
                    original_url: url,
                    expires_at: None,
                    source: LookupSource::Cache,
                }));
            }
            Ok(None) => {
                metrics::counter!("cache_misses_total").increment(1);
            }
            Err(e) => {
                metrics::counter!("cache_errors_total").increment(1);
                tracing::warn!(code = %code, error = %e, "Cache read failed, falling back to database");
            }
        }

        let resolved = self.inner.lookup(code).await?;

        if let Some(link) = &resolved {
            self.repopulate(code, &link.original_url, link.expires_at);
        }

        Ok(resolved)
    }

    async fn publish(&self, link: &ShortLink) -> Result<(), AppError> {
        self.inner.publish(link).await?;

        let ttl = match cache_ttl(link.expires_at, Utc::now()) {
            CacheTtl::Unbounded => None,
            CacheTtl::Seconds(secs) => Some(secs),
            CacheTtl::Skip => return Ok(()),
        };

        self.cache
            .set_url(&link.code, &link.original_url, ttl)
            .await
            .map_err(cache_error)
    }

    async fn evict(&self, code: &str) -> Result<(), AppError> {
        self.inner.evict(code).await?;
        self.cache.invalidate(code).await.map_err(cache_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::link::sample_link;
    use crate::domain::repositories::MockResolverStore;
    use crate::infrastructure::cache::{MemoryCache, MockCacheService};
    use chrono::Duration;

    fn db_hit(url: &str, expires_at: Option<DateTime<Utc>>) -> ResolvedLink {
        ResolvedLink {
            original_url: url.to_string(),
            expires_at,
            source: LookupSource::Database,
        }
    }

    async fn settle() {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    #[test]
    fn test_cache_ttl_from_expiry() {
        let now = Utc::now();

        assert_eq!(cache_ttl(None, now), CacheTtl::Unbounded);
        assert_eq!(
            cache_ttl(Some(now + Duration::seconds(90)), now),
            CacheTtl::Seconds(90)
        );
        assert_eq!(cache_ttl(Some(now), now), CacheTtl::Skip);
        assert_eq!(cache_ttl(Some(now - Duration::days(1)), now), CacheTtl::Skip);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_inner_store() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_url("abc123", "https://example.com", None).await.unwrap();

        let mut inner = MockResolverStore::new();
        inner.expect_lookup().never();

        let store = CachedResolverStore::new(cache, Arc::new(inner));
        let resolved = store.lookup("abc123").await.unwrap().unwrap();

        assert_eq!(resolved.original_url, "https://example.com");
        assert_eq!(resolved.source, LookupSource::Cache);
    }

    #[tokio::test]
    async fn test_cache_miss_repopulates() {
        let cache = Arc::new(MemoryCache::new());

        let mut inner = MockResolverStore::new();
        inner
            .expect_lookup()
            .times(1)
            .returning(|_| Ok(Some(db_hit("https://example.com", None))));

        let store = CachedResolverStore::new(cache.clone(), Arc::new(inner));
        let resolved = store.lookup("abc123").await.unwrap().unwrap();
        assert_eq!(resolved.source, LookupSource::Database);

        settle().await;

        let second = store.lookup("abc123").await.unwrap().unwrap();
        assert_eq!(second.source, LookupSource::Cache);
    }

    #[tokio::test]
    async fn test_cache_error_falls_back_to_inner_store() {
        let mut cache = MockCacheService::new();
        cache
            .expect_get_url()
            .returning(|_| Err(CacheError::ConnectionError("refused".into())));
        cache
            .expect_set_url()
            .returning(|_, _, _| Err(CacheError::ConnectionError("refused".into())));

        let mut inner = MockResolverStore::new();
        inner
            .expect_lookup()
            .returning(|_| Ok(Some(db_hit("https://example.com", None))));

        let store = CachedResolverStore::new(Arc::new(cache), Arc::new(inner));
        let resolved = store.lookup("abc123").await.unwrap().unwrap();

        assert_eq!(resolved.original_url, "https://example.com");
        settle().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let cache = Arc::new(MemoryCache::new());

        let mut inner = MockResolverStore::new();
        inner.expect_lookup().returning(|_| Ok(None));

        let store = CachedResolverStore::new(cache.clone(), Arc::new(inner));

        assert!(store.lookup("missing").await.unwrap().is_none());
        settle().await;
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_publish_uses_remaining_lifetime() {
        let mut cache = MockCacheService::new();
        cache
            .expect_set_url()
            .withf(|code, url, ttl| {
                code == "abc123"
                    && url == "https://example.com"
                    && matches!(ttl, Some(secs) if *secs > 86_000 && *secs <= 86_400)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut inner = MockResolverStore::new();
        inner.expect_publish().returning(|_| Ok(()));

        let mut link = sample_link("abc123", "https://example.com");
        link.expires_at = Some(Utc::now() + Duration::days(1));

        let store = CachedResolverStore::new(Arc::new(cache), Arc::new(inner));
        store.publish(&link).await.unwrap();
    }

    #[tokio::test]
    async fn test_evict_removes_cache_entry() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_url("abc123", "https://example.com", None).await.unwrap();

        let mut inner = MockResolverStore::new();
        inner.expect_evict().returning(|_| Ok(()));

        let store = CachedResolverStore::new(cache.clone(), Arc::new(inner));
        store.evict("abc123").await.unwrap();

        assert!(cache.get_url("abc123").await.unwrap().is_none());
    }
}
