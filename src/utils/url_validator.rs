//! Target URL validation.
//!
//! Target URLs are stored exactly as submitted so that resolution hands back
//! the same bytes; this module only decides whether a URL is acceptable.

use url::Url;

/// Maximum accepted length of a target URL, in characters.
pub const MAX_URL_LENGTH: usize = 2000;

/// Reasons a target URL is rejected.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,

    #[error("URL exceeds {MAX_URL_LENGTH} characters")]
    TooLong,
}

/// Checks that `input` is an absolute HTTP(S) URL within the length bound.
///
/// # Security
///
/// Rejects potentially dangerous protocols like `javascript:`, `data:`, `file:`, etc.
///
/// # Errors
///
/// Returns [`UrlValidationError::TooLong`] for URLs over [`MAX_URL_LENGTH`].
/// Returns [`UrlValidationError::InvalidFormat`] for malformed URLs.
/// Returns [`UrlValidationError::UnsupportedProtocol`] for non-HTTP(S) schemes.
pub fn validate_url(input: &str) -> Result<(), UrlValidationError> {
    if input.chars().count() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong);
    }

    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_simple_urls() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("https://example.com/path?q=rust&lang=en#top").is_ok());
        assert!(validate_url("http://192.168.1.1:8080/api").is_ok());
        assert!(validate_url("http://localhost:3000/test").is_ok());
    }

    #[test]
    fn test_validate_invalid_url() {
        assert!(matches!(
            validate_url("not a valid url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_url(""),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_url("example.com"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_rejects_other_protocols() {
        for input in [
            "ftp://example.com/file.txt",
            "file:///home/user/document.txt",
            "javascript:alert('xss')",
            "data:text/plain,Hello",
            "mailto:test@example.com",
        ] {
            assert!(
                matches!(
                    validate_url(input),
                    Err(UrlValidationError::UnsupportedProtocol)
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_length_bound() {
        let prefix = "https://example.com/";
        let at_limit = format!("{}{}", prefix, "a".repeat(MAX_URL_LENGTH - prefix.len()));
        assert!(validate_url(&at_limit).is_ok());

        let over_limit = format!("{}a", at_limit);
        assert!(matches!(
            validate_url(&over_limit),
            Err(UrlValidationError::TooLong)
        ));
    }

    #[test]
    fn test_length_bound_counts_characters() {
        let prefix = "https://example.com/";
        let multibyte = format!("{}{}", prefix, "é".repeat(MAX_URL_LENGTH - prefix.len()));
        assert!(multibyte.len() > MAX_URL_LENGTH);
        assert!(validate_url(&multibyte).is_ok());

        let over_limit = format!("{}é", multibyte);
        assert!(matches!(
            validate_url(&over_limit),
            Err(UrlValidationError::TooLong)
        ));
    }
}
