//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, code, original_url, owner_id, created_at, expires_at, \
                            is_active, click_count, last_clicked_at";

#[derive(FromRow)]
struct LinkRow {
    id: i64,
    code: String,
    original_url: String,
    owner_id: i64,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    click_count: i64,
    last_clicked_at: Option<DateTime<Utc>>,
}

impl From<LinkRow> for ShortLink {
    fn from(r: LinkRow) -> Self {
        ShortLink {
            id: r.id,
            code: r.code,
            original_url: r.original_url,
            owner_id: r.owner_id,
            created_at: r.created_at,
            expires_at: r.expires_at,
            is_active: r.is_active,
            click_count: r.click_count,
            last_clicked_at: r.last_clicked_at,
        }
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// All queries use bound parameters.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let sql = format!(
            "INSERT INTO links (code, original_url, owner_id, expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {LINK_COLUMNS}"
        );

        let row: LinkRow = sqlx::query_as(&sql)
            .bind(&new_link.code)
            .bind(&new_link.original_url)
            .bind(new_link.owner_id)
            .bind(new_link.expires_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE code = $1");

        let row: Option<LinkRow> = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE code = $1 AND is_active");

        let row: Option<LinkRow> = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM links WHERE code = $1)")
            .bind(code)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(exists)
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }

    async fn deactivate(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE links SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, AppError> {
        let codes: Vec<String> = sqlx::query_scalar(
            r#"
            UPDATE links
            SET is_active = FALSE
            WHERE is_active AND expires_at IS NOT NULL AND expires_at <= $1
            RETURNING code
            "#,
        )
        .bind(now)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(codes)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
