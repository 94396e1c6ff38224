//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`ShortLink`] - A shortened URL mapping with click counters
//! - [`ClickBucket`] - Clicks a link received on one day
//! - [`SubscriptionPlan`] / [`Owner`] - Who a link belongs to and the policy that applies
//!
//! Creation inputs use separate structs (`NewShortLink`).

pub mod click_bucket;
pub mod link;
pub mod plan;

pub use click_bucket::ClickBucket;
pub use link::{NewShortLink, ShortLink};
pub use plan::{Owner, SubscriptionPlan, UnknownPlan};
