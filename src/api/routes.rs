//! API route configuration.
//!
//! Owner routes require the owner context headers, see
//! [`crate::api::middleware::owner`].

use crate::api::handlers::{create_link_handler, link_clicks_handler, resolve_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes acting on the caller's own links.
///
/// # Endpoints
///
/// - `POST /links`                - Create a short link
/// - `GET  /links/{code}/clicks`  - Daily click statistics for a link
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler))
        .route("/links/{code}/clicks", get(link_clicks_handler))
}

/// Routes open to any client.
///
/// # Endpoints
///
/// - `GET /resolve/{code}` - Resolve a code to its URL as JSON
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/resolve/{code}", get(resolve_handler))
}
