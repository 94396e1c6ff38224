//! DTOs for daily click statistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::application::services::LinkClicks;
use crate::application::services::stats_service::{DEFAULT_STATS_DAYS, MAX_STATS_DAYS};

/// Query parameters for `GET /api/links/{code}/clicks`.
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct ClicksQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    #[validate(range(min = 1, max = MAX_STATS_DAYS))]
    pub days: Option<u32>,
}

impl ClicksQuery {
    pub fn days_or_default(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_STATS_DAYS)
    }
}

/// Click totals for one link plus its non-empty daily buckets.
#[derive(Debug, Serialize)]
pub struct ClicksResponse {
    pub code: String,
    pub total_clicks: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_clicked_at: Option<DateTime<Utc>>,

    pub days: Vec<DailyClicks>,
}

#[derive(Debug, Serialize)]
pub struct DailyClicks {
    pub date: NaiveDate,
    pub clicks: i64,
}

impl From<LinkClicks> for ClicksResponse {
    fn from(value: LinkClicks) -> Self {
        Self {
            code: value.link.code,
            total_clicks: value.link.click_count,
            last_clicked_at: value.link.last_clicked_at,
            days: value
                .days
                .into_iter()
                .map(|bucket| DailyClicks {
                    date: bucket.click_date,
                    clicks: bucket.click_count,
                })
                .collect(),
        }
    }
}
