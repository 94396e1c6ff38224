//! Short code generation and validation utilities.
//!
//! Codes are derived deterministically from the target URL: the CRC-32 of the
//! input is written in base 62 and left-padded to [`MIN_CODE_LENGTH`]. The same
//! URL therefore always produces the same candidate, which is why the link
//! service retries with [`generate_salted`] when a candidate is already taken.

use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

use crate::error::AppError;

/// Symbols used for generated codes, in digit order.
const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length every generated code is padded to.
pub const MIN_CODE_LENGTH: usize = 6;

/// Accepted length range for user-chosen codes.
pub const CUSTOM_CODE_MIN_LENGTH: usize = 3;
pub const CUSTOM_CODE_MAX_LENGTH: usize = 20;

static CUSTOM_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("custom code pattern is valid"));

/// Generates the unsalted candidate code for a URL.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(generate_code("hello"), "0ZnVY2");
/// assert_eq!(generate_code("hello"), generate_code("hello"));
/// ```
pub fn generate_code(url: &str) -> String {
    let checksum = crc32fast::hash(url.as_bytes());
    pad_code(encode_base62(u64::from(checksum)))
}

/// Generates the candidate code for a retry attempt.
///
/// The salt is appended as `"{url}_{attempt}"` before hashing.
pub fn generate_salted(url: &str, attempt: u32) -> String {
    generate_code(&format!("{}_{}", url, attempt))
}

/// Writes `value` in base 62, most significant symbol first.
fn encode_base62(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(MIN_CODE_LENGTH);
    while value > 0 {
        digits.push(ALPHABET[(value % 62) as usize]);
        value /= 62;
    }
    digits.reverse();

    // Every byte comes from ALPHABET, which is ASCII.
    String::from_utf8(digits).unwrap_or_default()
}

/// Left-pads with the zero symbol and keeps the trailing `MIN_CODE_LENGTH` symbols.
fn pad_code(encoded: String) -> String {
    if encoded.len() >= MIN_CODE_LENGTH {
        return encoded;
    }

    let padded = format!("{:0>width$}", encoded, width = MIN_CODE_LENGTH);
    padded[padded.len() - MIN_CODE_LENGTH..].to_string()
}

/// Validates a user-provided custom short code.
///
/// # Rules
///
/// - Length: 3-20 characters
/// - Allowed characters: ASCII letters and digits
///
/// # Errors
///
/// Returns [`AppError::InvalidCode`] if any rule is violated.
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    let length = code.chars().count();
    if !(CUSTOM_CODE_MIN_LENGTH..=CUSTOM_CODE_MAX_LENGTH).contains(&length) {
        return Err(AppError::invalid_code(
            format!(
                "Custom code must be {}-{} characters",
                CUSTOM_CODE_MIN_LENGTH, CUSTOM_CODE_MAX_LENGTH
            ),
            json!({ "provided_length": length }),
        ));
    }

    if !CUSTOM_CODE_REGEX.is_match(code) {
        return Err(AppError::invalid_code(
            "Custom code can only contain letters and digits",
            json!({ "code": code }),
        ));
    }

    Ok(())
}

/// Cheap shape check for an inbound code before any store lookup.
///
/// Every code ever issued is 3-20 ASCII letters or digits, so anything else
/// cannot resolve.
pub fn is_plausible_code(code: &str) -> bool {
    (CUSTOM_CODE_MIN_LENGTH..=CUSTOM_CODE_MAX_LENGTH).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
