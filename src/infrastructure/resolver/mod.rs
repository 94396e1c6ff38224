//! [`ResolverStore`](crate::domain::repositories::ResolverStore) implementations.
//!
//! [`DurableResolverStore`] reads the database; [`CachedResolverStore`] wraps
//! it with a read-through cache. Production wiring is
//! `CachedResolverStore<DurableResolverStore<PgLinkRepository>>`.

mod cached_store;
mod durable_store;

pub use cached_store::CachedResolverStore;
pub use durable_store::DurableResolverStore;
