// src/utils/mod.rs

pub mod date;
pub mod hash;
pub mod id;
pub mod jwt;

use url::Url;

use crate::error::AppError;

/// Trims `value` and rejects it when empty or longer than `max_chars`.
pub fn require_text(value: &str, field: &str, max_chars: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional value, treating blank strings as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| u.scheme() == "http" || u.scheme() == "https")
        .unwrap_or(false)
}

/// Accepts a blank or absent URL as `None`; anything else must be http(s).
pub fn validate_optional_url(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match optional_text(value) {
        Some(raw) if raw.len() > 500 || !is_web_url(&raw) => {
            Err(AppError::BadRequest(format!("{} must be a valid URL", field)))
        }
        other => Ok(other),
    }
}

/// Validates a collection of image URLs, ensuring each meets length and format requirements.
pub fn validate_image_urls(urls: &[String]) -> Result<(), validator::ValidationError> {
    for url in urls {
        if url.len() > 500 {
            return Err(validator::ValidationError::new("url_too_long"));
        }
        if !is_web_url(url) {
            return Err(validator::ValidationError::new("invalid_url"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_trims_and_bounds() {
        assert_eq!(require_text("  hi ", "f", 5).unwrap(), "hi");
        assert!(require_text("   ", "f", 5).is_err());
        assert!(require_text("abcdef", "f", 5).is_err());
        // counts characters, not bytes
        assert!(require_text("가나다라마", "f", 5).is_ok());
    }

    #[test]
    fn optional_url_rules() {
        assert_eq!(validate_optional_url(Some(" ".into()), "u").unwrap(), None);
        assert!(validate_optional_url(Some("ftp://x/y".into()), "u").is_err());
        assert!(validate_optional_url(Some("not a url".into()), "u").is_err());
        assert_eq!(
            validate_optional_url(Some("https://cdn.example.com/p.jpg".into()), "u").unwrap(),
            Some("https://cdn.example.com/p.jpg".to_string())
        );
    }

    #[test]
    fn image_urls_must_be_web_urls() {
        assert!(validate_image_urls(&["https://a.example/1.png".into()]).is_ok());
        assert!(validate_image_urls(&["javascript:alert(1)".into()]).is_err());
    }
}
