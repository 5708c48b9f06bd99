//! Custom alias validation.
//!
//! Both checks are pure and run before any store access.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::AppError;

/// Allowed alias syntax.
static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,30}$").expect("alias pattern is valid"));

/// Path segments that collide with system routes.
///
/// Compared case-insensitively, so `Stats` and `STATS` are reserved as well.
pub const RESERVED_ALIASES: &[&str] = &[
    "about", "admin", "api", "assets", "dashboard", "docs", "favicon", "health", "help", "login",
    "logout", "metrics", "register", "robots", "shorten", "signup", "static", "stats", "status",
];

/// Checks alias syntax: 3-30 characters from `[A-Za-z0-9_-]`.
///
/// # Errors
///
/// Returns [`AppError::InvalidAlias`] if the alias does not match.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_alias("my-link_2024").is_ok());
/// assert!(validate_alias("ab").is_err());        // Too short
/// assert!(validate_alias("my link").is_err());   // Space
/// ```
pub fn validate_alias(alias: &str) -> Result<(), AppError> {
    if ALIAS_REGEX.is_match(alias) {
        Ok(())
    } else {
        Err(AppError::InvalidAlias(
            "Alias must be 3-30 characters of letters, digits, '-' or '_'".to_string(),
        ))
    }
}

/// Returns true if the alias names a system route.
pub fn is_reserved(alias: &str) -> bool {
    RESERVED_ALIASES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(alias))
}
