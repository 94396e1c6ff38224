//! Periodic deactivation of expired links.
//!
//! The resolve path already deactivates expired links lazily; the sweep
//! catches links that are never requested again and drops their cache entries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::domain::repositories::{LinkRepository, ResolverStore};
use crate::error::AppError;

/// Deactivates every link expired at `now` and evicts it from fast lookups.
///
/// Eviction failures are logged; the cache TTL bounds how long a stale entry
/// can survive anyway.
///
/// # Returns
///
/// Number of links deactivated.
pub async fn sweep_expired<L, S>(links: &L, store: &S, now: DateTime<Utc>) -> Result<usize, AppError>
where
    L: LinkRepository + ?Sized,
    S: ResolverStore + ?Sized,
{
    let codes = links.deactivate_expired(now).await?;

    for code in &codes {
        if let Err(e) = store.evict(code).await {
            tracing::warn!(code = %code, error = %e, "Failed to evict expired link");
        }
    }

    if !codes.is_empty() {
        tracing::info!(count = codes.len(), "Deactivated expired links");
    }

    Ok(codes.len())
}

/// Runs [`sweep_expired`] every `period` until `shutdown` flips to true.
pub async fn run_expiry_sweeper<L, S>(
    links: Arc<L>,
    store: Arc<S>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    L: LinkRepository + ?Sized + 'static,
    S: ResolverStore + ?Sized + 'static,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = sweep_expired(links.as_ref(), store.as_ref(), Utc::now()).await {
                    tracing::error!(error = %e, "Expiry sweep failed");
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    tracing::info!("Expiry sweeper stopped");
}
