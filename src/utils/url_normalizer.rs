//! URL normalization and sanitization utilities.
//!
//! Ensures consistent URL representation by defaulting the scheme, normalizing
//! hostnames, removing fragments, and handling default ports. The normalized
//! form is what gets stored and what deduplication compares.

use url::Url;

/// Longest URL accepted for shortening.
pub const MAX_URL_LENGTH: usize = 2048;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL exceeds {MAX_URL_LENGTH} characters")]
    TooLong,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,

    #[error("Failed to normalize URL: {0}")]
    NormalizationFailed(String),
}

/// Normalizes a URL to a canonical form.
///
/// # Normalization Rules
///
/// 1. **Whitespace**: Leading and trailing whitespace is trimmed
/// 2. **Protocol**: `https://` is prepended when no scheme is present; only
///    HTTP and HTTPS are allowed
/// 3. **Hostname**: Converted to lowercase
/// 4. **Default ports**: Removed (80 for HTTP, 443 for HTTPS)
/// 5. **Fragments**: Removed (e.g., `#section`)
/// 6. **Query parameters** and **path**: Preserved as-is
///
/// # Security
///
/// Rejects potentially dangerous protocols like `javascript:`, `data:`, `file:`, etc.
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for malformed URLs.
/// Returns [`UrlNormalizationError::UnsupportedProtocol`] for non-HTTP(S) schemes.
///
/// # Examples
///
/// ```ignore
/// // Scheme defaulting
/// assert_eq!(normalize_url("example.com/a").unwrap(), "https://example.com/a");
///
/// // Case normalization
/// assert_eq!(
///     normalize_url("HTTPS://EXAMPLE.COM/Path").unwrap(),
///     "https://example.com/Path"
/// );
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }

    if trimmed.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong);
    }

    let candidate = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url =
        Url::parse(&candidate).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlNormalizationError::UnsupportedProtocol),
    }

    let host_lowercase = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
        _ => return Err(UrlNormalizationError::MissingHost),
    };
    url.set_host(Some(&host_lowercase)).map_err(|_| {
        UrlNormalizationError::NormalizationFailed("Failed to set normalized host".to_string())
    })?;

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        url.set_port(None).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to remove default port".to_string())
        })?;
    }

    Ok(url.to_string())
}

/// Returns true if the input starts with an explicit scheme.
///
/// Only the part before the first `/`, `?` or `#` is inspected, so a URL
/// carried in the query (`example.com/r?to=https://x.com`) does not count.
/// `host:port` forms such as `localhost:3000` or `example.com:8080/a` are not
/// schemes, while `mailto:` or `javascript:` are, so they get rejected rather
/// than silently rewritten into an `https://` URL.
fn has_scheme(input: &str) -> bool {
    let head_end = input.find(['/', '?', '#']).unwrap_or(input.len());
    let Some(colon) = input[..head_end].find(':') else {
        return false;
    };
    let (prefix, rest) = (&input[..colon], &input[colon + 1..]);

    let looks_like_scheme = prefix
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-');

    looks_like_scheme
        && (rest.starts_with("//") || !rest.starts_with(|c: char| c.is_ascii_digit()))
}
