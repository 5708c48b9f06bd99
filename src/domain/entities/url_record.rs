//! URL record entity, the sole persistent entity of the service.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored mapping from a short code to a long URL, with usage counters.
///
/// `short_code` is unique across all records, active or not. `clicks` only
/// grows, and `is_custom_alias` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UrlRecord {
    pub id: i64,
    pub long_url: String,
    pub short_code: String,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub creator_ip: Option<String>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub is_custom_alias: bool,
}

impl UrlRecord {
    /// Returns true if the record has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the record has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the record may be served at `now`.
    ///
    /// Checks `expires_at` independently of `is_active`, since the sweep that
    /// flips `is_active` runs periodically.
    pub fn is_resolvable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }

    /// Seconds until expiry at `now`, or `None` for records that never expire.
    ///
    /// Returns `Some(0)` or a negative value once expired.
    pub fn remaining_ttl_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|e| (e - now).num_seconds())
    }
}

/// Input data for creating a new record.
///
/// `created_at` is chosen by the caller so that `expires_at` can be derived
/// from it exactly.
#[derive(Debug, Clone)]
pub struct NewUrlRecord {
    pub long_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub creator_ip: Option<String>,
    pub is_custom_alias: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_at: Option<DateTime<Utc>>, is_active: bool) -> UrlRecord {
        UrlRecord {
            id: 1,
            long_url: "https://example.com/".to_string(),
            short_code: "abc2345".to_string(),
            clicks: 0,
            created_at: Utc::now(),
            expires_at,
            is_active,
            creator_ip: None,
            last_accessed: None,
            is_custom_alias: false,
        }
    }

    #[test]
    fn test_record_without_expiry_never_expires() {
        let r = record(None, true);
        let far_future = Utc::now() + Duration::days(365 * 100);

        assert!(!r.is_expired_at(far_future));
        assert!(r.is_resolvable_at(far_future));
        assert!(r.remaining_ttl_at(far_future).is_none());
    }

    #[test]
    fn test_record_expired_even_if_still_active() {
        let now = Utc::now();
        let r = record(Some(now - Duration::seconds(1)), true);

        assert!(r.is_expired_at(now));
        assert!(r.is_expired());
        assert!(!r.is_resolvable_at(now));
    }

    #[test]
    fn test_inactive_record_is_not_resolvable() {
        let r = record(None, false);
        assert!(!r.is_resolvable_at(Utc::now()));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let r = record(Some(now), true);

        assert!(r.is_expired_at(now));
        assert!(!r.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_remaining_ttl() {
        let now = Utc::now();
        let r = record(Some(now + Duration::seconds(90)), true);

        assert_eq!(r.remaining_ttl_at(now), Some(90));
    }
}
