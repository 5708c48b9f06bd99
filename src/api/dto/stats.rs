//! DTOs for link statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::UrlRecord;

/// Response of `GET /stats/{code}`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: LinkStats,
}

/// Durable state of a single link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub short_code: String,
    pub long_url: String,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub is_custom_alias: bool,
    pub is_active: bool,
}

impl From<UrlRecord> for LinkStats {
    fn from(record: UrlRecord) -> Self {
        Self {
            short_code: record.short_code,
            long_url: record.long_url,
            clicks: record.clicks,
            created_at: record.created_at,
            expires_at: record.expires_at,
            last_accessed: record.last_accessed,
            is_custom_alias: record.is_custom_alias,
            is_active: record.is_active,
        }
    }
}
