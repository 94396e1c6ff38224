//! Short code resolution.

use std::sync::Arc;

use serde_json::json;

use crate::application::services::ClickTracker;
use crate::domain::repositories::ResolverStore;
use crate::error::AppError;
use crate::utils::code_generator::is_plausible_code;

/// Resolves short codes to destinations and reports clicks.
pub struct ResolverService<S: ?Sized = dyn ResolverStore> {
    store: Arc<S>,
    clicks: ClickTracker,
}

impl<S: ResolverStore + ?Sized> ResolverService<S> {
    pub fn new(store: Arc<S>, clicks: ClickTracker) -> Self {
        Self { store, clicks }
    }

    /// Returns the original URL for `code` and queues a click.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the code is unknown, inactive or expired
    /// - [`AppError::Unavailable`] if the database could not be reached; a
    ///   read failure is never reported as "not found"
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        let not_found = || AppError::not_found("Short link not found", json!({ "code": code }));

        if !is_plausible_code(code) {
            return Err(not_found());
        }

        match self.store.lookup(code).await {
            Ok(Some(link)) => {
                tracing::debug!(code = %code, source = ?link.source, "Resolved short link");
                self.clicks.track(code);
                Ok(link.original_url)
            }
            Ok(None) => Err(not_found()),
            Err(e) => {
                tracing::error!(code = %code, error = %e, "Short link lookup failed");
                Err(AppError::unavailable(
                    "Short link lookup is temporarily unavailable, try again later",
                    json!({ "code": code }),
                ))
            }
        }
    }
}
