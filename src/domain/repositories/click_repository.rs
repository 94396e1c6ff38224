//! Repository trait for click counters.

use crate::domain::entities::ClickBucket;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Durable click accounting.
///
/// A click updates two things: the link's running total (with its
/// last-click time) and the per-day bucket for the click's UTC date.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Records one click against the link identified by `code`.
    ///
    /// Both counters are updated atomically.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no link with this code exists, in which case nothing
    /// is written.
    async fn record_click(&self, code: &str, clicked_at: DateTime<Utc>)
    -> Result<bool, AppError>;

    /// Returns daily buckets for a link from `since` (inclusive), oldest first.
    async fn daily_clicks(
        &self,
        link_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<ClickBucket>, AppError>;
}
