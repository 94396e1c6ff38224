//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern.
//! Implementations live in `crate::infrastructure`; mocks are generated
//! via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Durable link records
//! - [`ClickRepository`] - Click totals and daily buckets
//! - [`ResolverStore`] - Code lookup for redirects (database, optionally cache-fronted)
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod click_repository;
pub mod link_repository;
pub mod resolver_store;

pub use click_repository::ClickRepository;
pub use link_repository::LinkRepository;
pub use resolver_store::{LookupSource, ResolvedLink, ResolverStore};

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use resolver_store::MockResolverStore;
