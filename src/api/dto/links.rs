//! DTOs for link creation and resolution endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::ShortLink;

/// Request to shorten a single URL.
///
/// The URL itself and the custom code are checked by the link service,
/// which reports format problems as `invalid_url` / `invalid_code`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(length(min = 1, message = "url must not be empty"))]
    pub url: String,

    /// Optional user-chosen code (paid plans only).
    #[serde(default)]
    pub custom_code: Option<String>,
}

/// A newly created short link.
#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    pub code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateLinkResponse {
    pub fn new(link: ShortLink, short_url: String) -> Self {
        Self {
            code: link.code,
            short_url,
            original_url: link.original_url,
            created_at: link.created_at,
            expires_at: link.expires_at,
        }
    }
}

/// Resolution result for API clients that do not follow redirects.
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub short_code: String,
    pub original_url: String,
}
