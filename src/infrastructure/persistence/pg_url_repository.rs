//! PostgreSQL implementation of the URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::UrlRepository;
use crate::error::{AppError, map_sqlx_error};
use crate::utils::db_error::is_unique_violation_on_code;

const RECORD_COLUMNS: &str = "id, long_url, short_code, clicks, created_at, expires_at, \
                              is_active, creator_ip, last_accessed, is_custom_alias";

/// PostgreSQL repository for URL records.
///
/// Uses SQLx prepared statements for SQL injection protection. Uniqueness of
/// `short_code` is enforced by the `urls_short_code_key` constraint.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn create(&self, new_record: NewUrlRecord) -> Result<UrlRecord, AppError> {
        let query = format!(
            r#"
            INSERT INTO urls (long_url, short_code, created_at, expires_at, creator_ip, is_custom_alias)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RECORD_COLUMNS}
            "#
        );

        sqlx::query_as::<_, UrlRecord>(&query)
            .bind(&new_record.long_url)
            .bind(&new_record.short_code)
            .bind(new_record.created_at)
            .bind(new_record.expires_at)
            .bind(&new_record.creator_ip)
            .bind(new_record.is_custom_alias)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation_on_code(&e) {
                    AppError::CodeConflict(new_record.short_code.clone())
                } else {
                    map_sqlx_error(e)
                }
            })
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM urls WHERE short_code = $1");

        let record = sqlx::query_as::<_, UrlRecord>(&query)
            .bind(short_code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(record)
    }

    async fn find_active_by_long_url(
        &self,
        long_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UrlRecord>, AppError> {
        let query = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM urls
            WHERE long_url = $1
              AND is_active = TRUE
              AND (expires_at IS NULL OR expires_at > $2)
            ORDER BY id
            LIMIT 1
            "#
        );

        let record = sqlx::query_as::<_, UrlRecord>(&query)
            .bind(long_url)
            .bind(now)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(record)
    }

    async fn record_click(&self, short_code: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE urls
            SET clicks = clicks + 1, last_accessed = $2
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .bind(at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<String>, AppError> {
        // Rows locked by a concurrent sweeper are skipped.
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE urls
            SET is_active = FALSE
            WHERE id IN (
                SELECT id FROM urls
                WHERE is_active = TRUE
                  AND expires_at IS NOT NULL
                  AND expires_at <= $1
                ORDER BY expires_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING short_code
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(codes)
    }

    async fn purge_inactive(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM urls
            WHERE is_active = FALSE
              AND ((expires_at IS NOT NULL AND expires_at < $1) OR created_at < $1)
            "#,
        )
        .bind(cutoff)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
