//! Repository trait for short link data access.

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for the durable link table.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new active link with zero clicks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CodeTaken`] if the code is already assigned
    /// (including a concurrent insert that won the race).
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Finds a link by code regardless of its state.
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError>;

    /// Finds a link by code only if it is still marked active.
    ///
    /// Expiry is not checked here; callers compare `expires_at` themselves.
    async fn find_active_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError>;

    /// Returns true if any link (active or not) holds this code.
    async fn exists_by_code(&self, code: &str) -> Result<bool, AppError>;

    /// Counts every link an owner has created, inactive ones included.
    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError>;

    /// Marks a link inactive. Deactivating an inactive link is a no-op.
    async fn deactivate(&self, id: i64) -> Result<(), AppError>;

    /// Deactivates every active link whose expiry is at or before `now`.
    ///
    /// # Returns
    ///
    /// Codes of the links that were deactivated by this call.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, AppError>;

    /// Checks database connectivity.
    async fn health_check(&self) -> Result<(), AppError>;
}
