//! Utility functions for code generation, URL validation, and request handling.
//!
//! - [`code_generator`] - Short code generation and custom code validation
//! - [`url_validator`] - Target URL validation
//! - [`client_ip`] - Client address extraction for rate-limit keys

pub mod client_ip;
pub mod code_generator;
pub mod url_validator;
