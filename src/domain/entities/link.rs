//! Short link entity representing a code → URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL with its lifecycle and click counters.
///
/// The `code` is unique and never changes once assigned. Expired links are
/// deactivated rather than deleted so their history stays queryable.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortLink {
    pub id: i64,
    pub code: String,
    pub original_url: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub click_count: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
}

impl ShortLink {
    /// Returns true if the link's expiry is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input data for persisting a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShortLink {
    pub code: String,
    pub original_url: String,
    pub owner_id: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
pub(crate) fn sample_link(code: &str, url: &str) -> ShortLink {
    ShortLink {
        id: 1,
        code: code.to_string(),
        original_url: url.to_string(),
        owner_id: 7,
        created_at: Utc::now(),
        expires_at: None,
        is_active: true,
        click_count: 0,
        last_clicked_at: None,
    }
}
