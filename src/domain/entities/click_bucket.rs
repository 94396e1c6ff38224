//! Per-day click counter for a link.

use chrono::NaiveDate;

/// Number of clicks a link received on one calendar day (UTC).
///
/// There is at most one bucket per `(link_id, click_date)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickBucket {
    pub link_id: i64,
    pub click_date: NaiveDate,
    pub click_count: i64,
}
