//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};

/// A resolved redirect waiting to be counted.
///
/// Sent from the resolve path to the background worker through a bounded
/// channel, so the response never waits on the counter writes. The click time
/// is captured at resolution, which keeps the daily bucket correct even when
/// the event is processed after midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub code: String,
    pub clicked_at: DateTime<Utc>,
}

impl ClickEvent {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            clicked_at: Utc::now(),
        }
    }
}
