//! Shared application state injected into every handler.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::api::middleware::rate_limit::RateLimitPolicy;
use crate::application::services::{
    ClickTracker, LinkService, RateLimiter, ResolverService, StatsService,
};
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{ClickRepository, LinkRepository, ResolverStore};
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use crate::infrastructure::rate_limit::CounterStore;
use crate::infrastructure::resolver::{CachedResolverStore, DurableResolverStore};

/// Runtime settings that are not backed by a store.
#[derive(Debug, Clone)]
pub struct StateSettings {
    /// Public prefix of short URLs, e.g. `https://sho.rt`.
    pub base_url: String,
    pub behind_proxy: bool,
    pub rate_limit_policy: RateLimitPolicy,
}

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub stats_service: Arc<StatsService>,
    pub resolver: Arc<ResolverService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub rate_limit_policy: Arc<RateLimitPolicy>,
    pub links: Arc<dyn LinkRepository>,
    /// Cache-fronted resolver store, shared with the expiry sweeper.
    pub resolver_store: Arc<dyn ResolverStore>,
    pub cache: Arc<dyn CacheService>,
    pub click_tracker: ClickTracker,
    pub base_url: String,
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires the PostgreSQL repositories, the cache and the counter store
    /// into the services.
    pub fn new(
        pool: Arc<PgPool>,
        cache: Arc<dyn CacheService>,
        counters: Arc<dyn CounterStore>,
        click_tx: mpsc::Sender<ClickEvent>,
        settings: StateSettings,
    ) -> Self {
        let links: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
        let clicks: Arc<dyn ClickRepository> = Arc::new(PgClickRepository::new(pool));

        let resolver_store: Arc<dyn ResolverStore> = Arc::new(CachedResolverStore::new(
            cache.clone(),
            Arc::new(DurableResolverStore::new(links.clone())),
        ));

        let click_tracker = ClickTracker::new(click_tx);

        Self {
            link_service: Arc::new(LinkService::new(links.clone(), resolver_store.clone())),
            stats_service: Arc::new(StatsService::new(links.clone(), clicks)),
            resolver: Arc::new(ResolverService::new(
                resolver_store.clone(),
                click_tracker.clone(),
            )),
            rate_limiter: Arc::new(RateLimiter::new(counters)),
            rate_limit_policy: Arc::new(settings.rate_limit_policy),
            links,
            resolver_store,
            cache,
            click_tracker,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            behind_proxy: settings.behind_proxy,
        }
    }

    /// Full public URL for a short code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }
}
