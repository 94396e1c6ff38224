//! Owner context supplied by the upstream authentication layer.
//!
//! Authentication happens in front of this service. The gateway forwards the
//! caller's identity as headers:
//!
//! ```text
//! X-Owner-Id: 42
//! X-Owner-Plan: monthly
//! ```
//!
//! The parsed [`Owner`] is inserted into the request extensions, where
//! handlers pick it up with `Extension<Owner>`.

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use serde_json::json;

use crate::domain::entities::{Owner, SubscriptionPlan};
use crate::error::AppError;

pub const OWNER_ID_HEADER: &str = "x-owner-id";
pub const OWNER_PLAN_HEADER: &str = "x-owner-plan";

/// Reads the owner id header, if present and numeric.
pub fn owner_id_from_headers(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(OWNER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Parses the owner context from request headers.
///
/// # Errors
///
/// - `401 Unauthorized` if `X-Owner-Id` is missing or not an integer
/// - `400 Bad Request` if `X-Owner-Plan` names an unknown plan
///
/// A missing plan header means [`SubscriptionPlan::Free`].
pub fn owner_from_headers(headers: &HeaderMap) -> Result<Owner, AppError> {
    let id = owner_id_from_headers(headers).ok_or_else(|| {
        AppError::unauthorized(
            "Unauthorized",
            json!({ "reason": "X-Owner-Id header is missing or invalid" }),
        )
    })?;

    let plan = match headers.get(OWNER_PLAN_HEADER) {
        None => SubscriptionPlan::default(),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| {
                AppError::bad_request(
                    "Unknown subscription plan",
                    json!({ "header": "X-Owner-Plan" }),
                )
            })?,
    };

    Ok(Owner::new(id, plan))
}

/// Rejects requests without an owner context and attaches [`Owner`] otherwise.
pub async fn layer(mut req: Request, next: Next) -> Result<Response, AppError> {
    let owner = owner_from_headers(req.headers())?;
    req.extensions_mut().insert(owner);

    Ok(next.run(req).await)
}
