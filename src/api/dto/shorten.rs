//! DTOs for link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::UrlRecord;

/// Longest accepted `expiresIn`: one year.
pub const MAX_EXPIRES_IN_SECS: u64 = 31_536_000;

/// Request body of `POST /shorten`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    /// URL to shorten. A missing scheme is completed to `https://`.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub long_url: String,

    /// Lifetime in seconds. Omit for a link that never expires.
    #[validate(range(min = 1, max = 31_536_000, message = "expiresIn must be between 1 and 31536000"))]
    pub expires_in: Option<u64>,
}

/// Query string of `POST /shorten`.
#[derive(Debug, Default, Deserialize)]
pub struct ShortenQuery {
    /// Custom alias requested instead of a generated code.
    pub alias: Option<String>,
}

impl ShortenQuery {
    /// Returns the alias, treating an empty value as absent.
    pub fn alias(self) -> Option<String> {
        self.alias.filter(|a| !a.trim().is_empty())
    }
}

/// Response of `POST /shorten`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub success: bool,
    pub short_url: String,
    pub short_code: String,
    pub long_url: String,
    /// Requested lifetime for new links, remaining lifetime for reused ones.
    /// `null` for links that never expire.
    pub expires_in: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub custom_alias: bool,
}

impl ShortenResponse {
    pub fn from_record(record: UrlRecord, short_url: String, expires_in: Option<i64>) -> Self {
        Self {
            success: true,
            short_url,
            expires_in,
            expires_at: record.expires_at,
            custom_alias: record.is_custom_alias,
            short_code: record.short_code,
            long_url: record.long_url,
        }
    }
}
