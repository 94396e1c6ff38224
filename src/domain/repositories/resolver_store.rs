//! Lookup seam for the redirect read path.
//!
//! The resolver only needs "code in, destination out". Keeping that behind a
//! trait lets the cache sit in front of the database as a decorator instead
//! of being interleaved with the resolution logic.

use crate::domain::entities::ShortLink;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Where a resolved destination was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Cache,
    Database,
}

/// A code that currently maps to a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink {
    pub original_url: String,
    /// Known only when the lookup reached the database.
    pub expires_at: Option<DateTime<Utc>>,
    pub source: LookupSource,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResolverStore: Send + Sync {
    /// Looks up an active, unexpired destination for `code`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(_))` if the code resolves
    /// - `Ok(None)` if it is unknown, inactive, or expired
    ///
    /// # Errors
    ///
    /// Returns an error only when the durable store cannot be reached.
    async fn lookup(&self, code: &str) -> Result<Option<ResolvedLink>, AppError>;

    /// Makes a freshly created link visible to fast lookups.
    async fn publish(&self, link: &ShortLink) -> Result<(), AppError>;

    /// Removes a code from fast lookups.
    async fn evict(&self, code: &str) -> Result<(), AppError>;
}
