//! Database-only resolver store.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::domain::entities::ShortLink;
use crate::domain::repositories::{LinkRepository, LookupSource, ResolvedLink, ResolverStore};
use crate::error::AppError;

/// Resolves codes straight from the link repository.
///
/// An expired link found here is deactivated on the spot so it stops being
/// returned by active lookups; that write is best-effort.
pub struct DurableResolverStore<L: ?Sized> {
    links: Arc<L>,
}

impl<L: LinkRepository + ?Sized> DurableResolverStore<L> {
    pub fn new(links: Arc<L>) -> Self {
        Self { links }
    }
}

#[async_trait]
impl<L: LinkRepository + ?Sized + 'static> ResolverStore for DurableResolverStore<L> {
    async fn lookup(&self, code: &str) -> Result<Option<ResolvedLink>, AppError> {
        let Some(link) = self.links.find_active_by_code(code).await? else {
            return Ok(None);
        };

        if link.is_expired_at(Utc::now()) {
            tracing::info!(code = %code, "Link expired, deactivating");
            if let Err(e) = self.links.deactivate(link.id).await {
                tracing::error!(code = %code, error = %e, "Failed to deactivate expired link");
            }
            return Ok(None);
        }

        Ok(Some(ResolvedLink {
            original_url: link.original_url,
            expires_at: link.expires_at,
            source: LookupSource::Database,
        }))
    }

    async fn publish(&self, _link: &ShortLink) -> Result<(), AppError> {
        Ok(())
    }

    async fn evict(&self, _code: &str) -> Result<(), AppError> {
        Ok(())
    }
}
