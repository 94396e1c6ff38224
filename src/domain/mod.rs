//! Domain layer containing business entities and logic.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Click tracking event model
//! - [`click_worker`] - Asynchronous click processing worker
//! - [`expiry_sweeper`] - Periodic deactivation of expired links
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers; repository traits are implemented in `crate::infrastructure`.
//!
//! # Click Processing Flow
//!
//! 1. A short code is resolved
//! 2. [`click_event::ClickEvent`] is queued without waiting
//! 3. [`click_worker::run_click_worker`] persists it with retry logic
//! 4. Totals and daily buckets are updated via [`repositories::ClickRepository`]

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod expiry_sweeper;
pub mod repositories;
