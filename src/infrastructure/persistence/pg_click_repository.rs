//! PostgreSQL implementation of click counters.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::ClickBucket;
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

#[derive(FromRow)]
struct BucketRow {
    link_id: i64,
    click_date: NaiveDate,
    click_count: i64,
}

/// Click totals on `links` plus per-day rows in `link_click_buckets`.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record_click(
        &self,
        code: &str,
        clicked_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let link_id: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE links
            SET click_count = click_count + 1,
                last_clicked_at = GREATEST(COALESCE(last_clicked_at, $2), $2)
            WHERE code = $1
            RETURNING id
            "#,
        )
        .bind(code)
        .bind(clicked_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(link_id) = link_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query(
            r#"
            INSERT INTO link_click_buckets (link_id, click_date, click_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (link_id, click_date)
            DO UPDATE SET click_count = link_click_buckets.click_count + 1,
                          updated_at = NOW()
            "#,
        )
        .bind(link_id)
        .bind(clicked_at.date_naive())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn daily_clicks(
        &self,
        link_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<ClickBucket>, AppError> {
        let rows: Vec<BucketRow> = sqlx::query_as(
            r#"
            SELECT link_id, click_date, click_count
            FROM link_click_buckets
            WHERE link_id = $1 AND click_date >= $2
            ORDER BY click_date
            "#,
        )
        .bind(link_id)
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ClickBucket {
                link_id: r.link_id,
                click_date: r.click_date,
                click_count: r.click_count,
            })
            .collect())
    }
}
