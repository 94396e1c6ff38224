//! Link creation service.
//!
//! Ties the code generator to the link repository so every persisted code is
//! unique, then publishes the new link to fast lookups.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::domain::entities::{NewShortLink, Owner, ShortLink};
use crate::domain::repositories::{LinkRepository, ResolverStore};
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, generate_salted, validate_custom_code};
use crate::utils::url_validator::validate_url;

/// Generated-code attempts before giving up: one unsalted, then salted.
pub const MAX_GENERATION_ATTEMPTS: u32 = 10;

/// Service for creating shortened links.
pub struct LinkService<L: ?Sized = dyn LinkRepository, S: ?Sized = dyn ResolverStore> {
    link_repository: Arc<L>,
    resolver_store: Arc<S>,
}

impl<L, S> LinkService<L, S>
where
    L: LinkRepository + ?Sized,
    S: ResolverStore + ?Sized,
{
    pub fn new(link_repository: Arc<L>, resolver_store: Arc<S>) -> Self {
        Self {
            link_repository,
            resolver_store,
        }
    }

    /// Creates a short link for `owner`.
    ///
    /// The URL is stored exactly as given. Expiration follows the owner's
    /// plan retention.
    ///
    /// # Code selection
    ///
    /// - A custom code is used verbatim after plan, format and uniqueness checks
    /// - Otherwise the URL hash is tried first, then salted variants, up to
    ///   [`MAX_GENERATION_ATTEMPTS`] in total. Collisions found at insert time
    ///   (a concurrent writer took the code) count as attempts too.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidUrl`] for a malformed or non-HTTP(S) URL
    /// - [`AppError::LimitExceeded`] when the owner's link quota is used up
    /// - [`AppError::Forbidden`] for a custom code on a plan without custom codes
    /// - [`AppError::InvalidCode`] for a malformed custom code
    /// - [`AppError::CodeTaken`] when the custom code is already assigned
    /// - [`AppError::GenerationExhausted`] when every generated code collided
    ///
    /// A failure to publish to the cache is logged and does not fail creation.
    pub async fn create_link(
        &self,
        original_url: &str,
        owner: Owner,
        custom_code: Option<&str>,
    ) -> Result<ShortLink, AppError> {
        validate_url(original_url).map_err(|e| {
            AppError::invalid_url("Invalid URL", json!({ "reason": e.to_string() }))
        })?;

        self.ensure_quota(owner).await?;

        let expires_at = owner.plan.expiration_from(Utc::now());

        let link = match custom_code {
            Some(custom) => {
                self.create_with_custom_code(original_url, owner, custom, expires_at)
                    .await?
            }
            None => {
                self.create_with_generated_code(original_url, owner, expires_at)
                    .await?
            }
        };

        tracing::info!(code = %link.code, owner_id = owner.id, "Short link created");

        if let Err(e) = self.resolver_store.publish(&link).await {
            tracing::warn!(code = %link.code, error = %e, "Failed to cache new link");
        }

        Ok(link)
    }

    async fn ensure_quota(&self, owner: Owner) -> Result<(), AppError> {
        let Some(limit) = owner.plan.link_limit() else {
            return Ok(());
        };

        let current = self.link_repository.count_by_owner(owner.id).await?;
        if current >= limit {
            return Err(AppError::limit_exceeded(
                "Link limit reached for your plan",
                json!({ "plan": owner.plan, "limit": limit, "current": current }),
            ));
        }

        Ok(())
    }

    async fn create_with_custom_code(
        &self,
        original_url: &str,
        owner: Owner,
        custom: &str,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<ShortLink, AppError> {
        if !owner.plan.allows_custom_codes() {
            return Err(AppError::forbidden(
                "Custom codes require an upgraded plan",
                json!({ "plan": owner.plan }),
            ));
        }

        validate_custom_code(custom)?;

        let taken = || AppError::code_taken("Custom code already exists", json!({ "code": custom }));

        if self.link_repository.exists_by_code(custom).await? {
            return Err(taken());
        }

        let new_link = NewShortLink {
            code: custom.to_string(),
            original_url: original_url.to_string(),
            owner_id: owner.id,
            expires_at,
        };

        match self.link_repository.create(new_link).await {
            Err(AppError::CodeTaken { .. }) => Err(taken()),
            other => other,
        }
    }

    async fn create_with_generated_code(
        &self,
        original_url: &str,
        owner: Owner,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<ShortLink, AppError> {
        for attempt in 0..MAX_GENERATION_ATTEMPTS {
            let code = if attempt == 0 {
                generate_code(original_url)
            } else {
                generate_salted(original_url, attempt)
            };

            if self.link_repository.exists_by_code(&code).await? {
                tracing::debug!(code = %code, attempt, "Generated code collides");
                continue;
            }

            let new_link = NewShortLink {
                code,
                original_url: original_url.to_string(),
                owner_id: owner.id,
                expires_at,
            };

            match self.link_repository.create(new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::CodeTaken { .. }) => {
                    tracing::debug!(attempt, "Generated code taken concurrently");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::error!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "Could not generate a unique short code"
        );

        Err(AppError::generation_exhausted(
            "Failed to generate unique code",
            json!({ "attempts": MAX_GENERATION_ATTEMPTS }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::SubscriptionPlan;
    use crate::domain::repositories::{MockLinkRepository, MockResolverStore};
    use std::sync::Mutex;

    fn created(new_link: NewShortLink) -> ShortLink {
        ShortLink {
            id: 1,
            code: new_link.code,
            original_url: new_link.original_url,
            owner_id: new_link.owner_id,
            created_at: Utc::now(),
            expires_at: new_link.expires_at,
            is_active: true,
            click_count: 0,
            last_clicked_at: None,
        }
    }

    fn publishing_store() -> MockResolverStore {
        let mut store = MockResolverStore::new();
        store.expect_publish().returning(|_| Ok(()));
        store
    }

    fn free() -> Owner {
        Owner::new(7, SubscriptionPlan::Free)
    }

    fn monthly() -> Owner {
        Owner::new(7, SubscriptionPlan::Monthly)
    }

    #[tokio::test]
    async fn test_create_link_uses_unsalted_hash_first() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(0));
        repo.expect_exists_by_code().times(1).returning(|_| Ok(false));
        repo.expect_create().times(1).returning(|n| Ok(created(n)));

        let service = LinkService::new(Arc::new(repo), Arc::new(publishing_store()));
        let link = service
            .create_link("https://example.com", free(), None)
            .await
            .unwrap();

        assert_eq!(link.code, generate_code("https://example.com"));
        assert_eq!(link.original_url, "https://example.com");
        assert!(link.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_create_link_retries_with_salt_on_collision() {
        let unsalted = generate_code("https://example.com");

        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(0));
        repo.expect_exists_by_code()
            .times(2)
            .returning(move |code| Ok(code == unsalted));
        repo.expect_create().times(1).returning(|n| Ok(created(n)));

        let service = LinkService::new(Arc::new(repo), Arc::new(publishing_store()));
        let link = service
            .create_link("https://example.com", free(), None)
            .await
            .unwrap();

        assert_eq!(link.code, generate_salted("https://example.com", 1));
    }

    #[tokio::test]
    async fn test_create_link_exhausts_after_ten_collisions() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(0));
        repo.expect_exists_by_code()
            .times(MAX_GENERATION_ATTEMPTS as usize)
            .returning(|_| Ok(true));
        repo.expect_create().never();

        let mut store = MockResolverStore::new();
        store.expect_publish().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(store));
        let result = service
            .create_link("https://example.com", free(), None)
            .await;

        assert!(matches!(result, Err(AppError::GenerationExhausted { .. })));
    }

    #[tokio::test]
    async fn test_create_link_insert_race_counts_as_attempt() {
        let calls = Arc::new(Mutex::new(0));
        let seen = calls.clone();

        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(0));
        repo.expect_exists_by_code().returning(|_| Ok(false));
        repo.expect_create().times(2).returning(move |n| {
            let mut calls = seen.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                Err(AppError::code_taken("Unique constraint violation", json!({})))
            } else {
                Ok(created(n))
            }
        });

        let service = LinkService::new(Arc::new(repo), Arc::new(publishing_store()));
        let link = service
            .create_link("https://example.com", free(), None)
            .await
            .unwrap();

        assert_eq!(link.code, generate_salted("https://example.com", 1));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_link_rejects_invalid_url() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(MockResolverStore::new()));
        let result = service.create_link("ftp://example.com", free(), None).await;

        assert!(matches!(result, Err(AppError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_create_link_enforces_quota() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(10));
        repo.expect_exists_by_code().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(MockResolverStore::new()));
        let result = service
            .create_link("https://example.com", free(), None)
            .await;

        assert!(matches!(result, Err(AppError::LimitExceeded { .. })));
    }

    #[tokio::test]
    async fn test_lifetime_plan_skips_quota_check() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().never();
        repo.expect_exists_by_code().returning(|_| Ok(false));
        repo.expect_create().returning(|n| Ok(created(n)));

        let service = LinkService::new(Arc::new(repo), Arc::new(publishing_store()));
        let link = service
            .create_link(
                "https://example.com",
                Owner::new(7, SubscriptionPlan::Lifetime),
                None,
            )
            .await
            .unwrap();

        assert!(link.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_custom_code_used_verbatim() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(0));
        repo.expect_exists_by_code()
            .withf(|code| code == "MyLink")
            .returning(|_| Ok(false));
        repo.expect_create().returning(|n| Ok(created(n)));

        let service = LinkService::new(Arc::new(repo), Arc::new(publishing_store()));
        let link = service
            .create_link("https://example.com", monthly(), Some("MyLink"))
            .await
            .unwrap();

        assert_eq!(link.code, "MyLink");
    }

    #[tokio::test]
    async fn test_custom_code_forbidden_on_free_plan() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(0));
        repo.expect_exists_by_code().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(MockResolverStore::new()));
        let result = service
            .create_link("https://example.com", free(), Some("MyLink"))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_custom_code_format_rejected() {
        for bad in ["ab", "a".repeat(21).as_str(), "bad@code"] {
            let mut repo = MockLinkRepository::new();
            repo.expect_count_by_owner().returning(|_| Ok(0));
            repo.expect_exists_by_code().never();

            let service =
                LinkService::new(Arc::new(repo), Arc::new(MockResolverStore::new()));
            let result = service
                .create_link("https://example.com", monthly(), Some(bad))
                .await;

            assert!(
                matches!(result, Err(AppError::InvalidCode { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_custom_code_taken() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(0));
        repo.expect_exists_by_code().returning(|_| Ok(true));
        repo.expect_create().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(MockResolverStore::new()));
        let result = service
            .create_link("https://example.com", monthly(), Some("taken1"))
            .await;

        assert!(matches!(result, Err(AppError::CodeTaken { .. })));
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_creation() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(0));
        repo.expect_exists_by_code().returning(|_| Ok(false));
        repo.expect_create().returning(|n| Ok(created(n)));

        let mut store = MockResolverStore::new();
        store
            .expect_publish()
            .times(1)
            .returning(|_| Err(AppError::unavailable("Cache unavailable", json!({}))));

        let service = LinkService::new(Arc::new(repo), Arc::new(store));

        assert!(
            service
                .create_link("https://example.com", free(), None)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_skips_publish() {
        let mut repo = MockLinkRepository::new();
        repo.expect_count_by_owner().returning(|_| Ok(0));
        repo.expect_exists_by_code().returning(|_| Ok(false));
        repo.expect_create()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let mut store = MockResolverStore::new();
        store.expect_publish().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(store));
        let result = service
            .create_link("https://example.com", free(), None)
            .await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }
}
