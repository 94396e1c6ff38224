//! Click statistics service.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use crate::domain::entities::{ClickBucket, ShortLink};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;

pub const DEFAULT_STATS_DAYS: u32 = 30;
pub const MAX_STATS_DAYS: u32 = 365;

/// A link with its recent daily click buckets.
#[derive(Debug, Clone)]
pub struct LinkClicks {
    pub link: ShortLink,
    pub days: Vec<ClickBucket>,
}

/// Owner-scoped click analytics.
pub struct StatsService<L: ?Sized = dyn LinkRepository, C: ?Sized = dyn ClickRepository> {
    link_repository: Arc<L>,
    click_repository: Arc<C>,
}

impl<L, C> StatsService<L, C>
where
    L: LinkRepository + ?Sized,
    C: ClickRepository + ?Sized,
{
    pub fn new(link_repository: Arc<L>, click_repository: Arc<C>) -> Self {
        Self {
            link_repository,
            click_repository,
        }
    }

    /// Returns daily click buckets for the last `days` days (today included).
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if `days` is outside `1..=365`
    /// - [`AppError::NotFound`] if the code does not exist or belongs to
    ///   another owner
    pub async fn daily_clicks(
        &self,
        code: &str,
        owner_id: i64,
        days: u32,
    ) -> Result<LinkClicks, AppError> {
        if !(1..=MAX_STATS_DAYS).contains(&days) {
            return Err(AppError::bad_request(
                format!("days must be between 1 and {}", MAX_STATS_DAYS),
                json!({ "days": days }),
            ));
        }

        let link = self
            .link_repository
            .find_by_code(code)
            .await?
            .filter(|link| link.owner_id == owner_id)
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))?;

        let since = Utc::now().date_naive() - Duration::days(i64::from(days) - 1);
        let buckets = self.click_repository.daily_clicks(link.id, since).await?;

        Ok(LinkClicks {
            link,
            days: buckets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::link::sample_link;
    use crate::domain::repositories::{MockClickRepository, MockLinkRepository};

    #[tokio::test]
    async fn test_daily_clicks_for_owner() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .returning(|_| Ok(Some(sample_link("abc123", "https://example.com"))));

        let mut clicks = MockClickRepository::new();
        clicks
            .expect_daily_clicks()
            .withf(|link_id, since| {
                *link_id == 1 && *since == Utc::now().date_naive() - Duration::days(6)
            })
            .returning(|link_id, since| {
                Ok(vec![ClickBucket {
                    link_id,
                    click_date: since,
                    click_count: 4,
                }])
            });

        let service = StatsService::new(Arc::new(links), Arc::new(clicks));
        let result = service.daily_clicks("abc123", 7, 7).await.unwrap();

        assert_eq!(result.link.code, "abc123");
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.days[0].click_count, 4);
    }

    #[tokio::test]
    async fn test_daily_clicks_hides_other_owners_links() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .returning(|_| Ok(Some(sample_link("abc123", "https://example.com"))));

        let mut clicks = MockClickRepository::new();
        clicks.expect_daily_clicks().never();

        let service = StatsService::new(Arc::new(links), Arc::new(clicks));
        let result = service.daily_clicks("abc123", 99, 30).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_daily_clicks_rejects_out_of_range_days() {
        let service = StatsService::new(
            Arc::new(MockLinkRepository::new()),
            Arc::new(MockClickRepository::new()),
        );

        for days in [0, 366] {
            let result = service.daily_clicks("abc123", 7, days).await;
            assert!(matches!(result, Err(AppError::Validation { .. })));
        }
    }
}
