//! Handlers resolving short codes.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::links::ResolveResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Look the code up in the cache, falling back to the database
/// 2. Queue a click event for the background worker
/// 3. Return 302 Found
///
/// Cache repopulation and click counting never delay the response.
///
/// # Errors
///
/// - `404 Not Found` if the code is unknown, inactive, or expired
/// - `503 Service Unavailable` if the database cannot be reached
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let original_url = state.resolver.resolve(&code).await?;

    found(&original_url)
}

/// Resolves a short code without redirecting.
///
/// # Endpoint
///
/// `GET /api/resolve/{code}`
///
/// Counts as a click, like the redirect.
///
/// # Response
///
/// ```json
/// { "short_code": "aZ3kP9", "original_url": "https://example.com" }
/// ```
pub async fn resolve_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ResolveResponse>, AppError> {
    let original_url = state.resolver.resolve(&code).await?;

    Ok(Json(ResolveResponse {
        short_code: code,
        original_url,
    }))
}

/// Builds a `302 Found` response.
///
/// URLs are stored as supplied; one that is not a valid header value is sent
/// in its percent-encoded form instead.
fn found(location: &str) -> Result<Response, AppError> {
    let value = match HeaderValue::from_str(location) {
        Ok(value) => value,
        Err(_) => url::Url::parse(location)
            .ok()
            .and_then(|url| HeaderValue::from_str(url.as_str()).ok())
            .ok_or_else(|| {
                tracing::error!(location, "Stored URL cannot be used as a Location header");
                AppError::internal("Stored URL is not redirectable", json!({}))
            })?,
    };

    Ok((StatusCode::FOUND, [(header::LOCATION, value)]).into_response())
}
