//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: database and click queue are up. A failing cache or rate
///   limit store only degrades the service (cache misses, fail-open limits),
///   so it is reported as `"degraded"` with status 200.
/// - **503 Service Unavailable**: database unreachable or click queue closed
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "click_queue": { "status": "ok", "message": "Available: 9998/10000" },
///     "cache": { "status": "ok", "message": "Cache reachable" },
///     "rate_limit": { "status": "ok", "message": "Counter store reachable" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (database, cache, rate_limit) = tokio::join!(
        check_database(&state),
        check_cache(&state),
        check_rate_limit(&state),
    );
    let click_queue = check_click_queue(&state);

    let essential_ok = database.is_ok() && click_queue.is_ok();
    let status = if !essential_ok {
        "unhealthy"
    } else if cache.is_ok() && rate_limit.is_ok() {
        "healthy"
    } else {
        "degraded"
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            click_queue,
            cache,
            rate_limit,
        },
    };

    if essential_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.links.health_check().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

/// Checks if the click tracking queue is operational.
fn check_click_queue(state: &AppState) -> CheckStatus {
    let tracker = &state.click_tracker;

    if tracker.is_closed() {
        CheckStatus::error("Click queue is closed")
    } else {
        CheckStatus::ok(format!(
            "Available: {}/{}",
            tracker.available_capacity(),
            tracker.max_capacity()
        ))
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.health_check().await {
        CheckStatus::ok("Cache reachable")
    } else {
        CheckStatus::error("Cache unreachable, serving from database")
    }
}

async fn check_rate_limit(state: &AppState) -> CheckStatus {
    if state.rate_limiter.health_check().await {
        CheckStatus::ok("Counter store reachable")
    } else {
        CheckStatus::error("Counter store unreachable, limits fail open")
    }
}
