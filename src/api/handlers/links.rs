//! Handlers for owner-scoped link endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::clicks::{ClicksQuery, ClicksResponse};
use crate::api::dto::links::{CreateLinkRequest, CreateLinkResponse};
use crate::domain::entities::Owner;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for the calling owner.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "custom_code": "launch"   // optional, paid plans only
/// }
/// ```
///
/// # Errors
///
/// - `400` `invalid_url` / `invalid_code` for malformed input
/// - `403` `forbidden` for a custom code on the free plan
/// - `403` `limit_exceeded` when the plan's link quota is used up
/// - `409` `code_taken` when the custom code is already assigned
/// - `500` `generation_exhausted` when no free code could be generated
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_link(&payload.url, owner, payload.custom_code.as_deref())
        .await?;

    let short_url = state.short_url(&link.code);

    Ok((
        StatusCode::CREATED,
        Json(CreateLinkResponse::new(link, short_url)),
    ))
}

/// Returns daily click counts for one of the owner's links.
///
/// # Endpoint
///
/// `GET /api/links/{code}/clicks?days=30`
///
/// `days` defaults to 30 and must be between 1 and 365. Days without clicks
/// are omitted.
///
/// # Errors
///
/// Returns 404 Not Found if the code does not exist or belongs to another owner.
pub async fn link_clicks_handler(
    Path(code): Path<String>,
    Query(params): Query<ClicksQuery>,
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
) -> Result<Json<ClicksResponse>, AppError> {
    params.validate()?;

    let clicks = state
        .stats_service
        .daily_clicks(&code, owner.id, params.days_or_default())
        .await?;

    Ok(Json(clicks.into()))
}
