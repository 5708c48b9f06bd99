//! Repository trait for URL record access.

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable storage of URL records.
///
/// The store is the source of truth and the only place where short code
/// uniqueness is enforced.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_url.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CodeConflict`] if the short code already exists,
    /// whatever the state of the existing record.
    /// Returns [`AppError::StoreUnavailable`] or [`AppError::Internal`] on
    /// database errors.
    async fn create(&self, new_record: NewUrlRecord) -> Result<UrlRecord, AppError>;

    /// Finds a record by short code, regardless of active or expired state.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError>;

    /// Finds an active record for `long_url` that has not expired at `now`.
    ///
    /// When several match, the oldest one is returned.
    async fn find_active_by_long_url(
        &self,
        long_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UrlRecord>, AppError>;

    /// Increments `clicks` and sets `last_accessed = at` in a single write.
    ///
    /// Returns `Ok(false)` if no record has this code.
    async fn record_click(&self, short_code: &str, at: DateTime<Utc>) -> Result<bool, AppError>;

    /// Deactivates up to `limit` active records whose `expires_at <= now`.
    ///
    /// Returns the short codes that were deactivated by this call.
    async fn deactivate_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<String>, AppError>;

    /// Permanently deletes inactive records older than `cutoff`.
    ///
    /// A record qualifies if `is_active = false` and either its expiry or its
    /// creation time is before `cutoff`. Active records are never touched.
    /// Returns the number of deleted rows.
    async fn purge_inactive(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;

    /// Verifies that the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}
