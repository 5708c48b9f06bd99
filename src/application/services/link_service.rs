//! Link creation, resolution and statistics service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheGuard;
use crate::utils::alias_policy::{is_reserved, validate_alias};
use crate::utils::code_generator::{
    DEFAULT_CODE_LENGTH, derive_from_content, generate_code, is_valid_code_shape,
};
use crate::utils::url_filter::UrlFilter;
use crate::utils::url_normalizer::normalize_url;

/// Tunables of the resolution engine.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Length of generated codes.
    pub code_length: usize,
    /// Random candidates tried before falling back to a content-derived code.
    pub max_code_attempts: usize,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            max_code_attempts: 10,
        }
    }
}

/// Optional parameters of [`LinkService::shorten`].
#[derive(Debug, Clone, Default)]
pub struct ShortenOptions {
    /// Lifetime of the link in seconds. `None` means it never expires.
    pub expires_in: Option<u64>,
    pub creator_ip: Option<String>,
    pub custom_alias: Option<String>,
}

/// Result of [`LinkService::shorten`].
#[derive(Debug, Clone)]
pub struct ShortenedLink {
    pub record: UrlRecord,
    /// False when an existing record for the same URL was returned.
    pub created: bool,
}

/// The resolution engine.
///
/// Orchestrates the code generator, alias policy, record store and cache.
/// The store is the source of truth; the cache is written through on create
/// and populated on read misses, and its absence never changes an answer.
pub struct LinkService {
    repository: Arc<dyn UrlRepository>,
    cache: Arc<CacheGuard>,
    url_filter: Arc<dyn UrlFilter>,
    settings: LinkSettings,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        cache: Arc<CacheGuard>,
        url_filter: Arc<dyn UrlFilter>,
        settings: LinkSettings,
    ) -> Self {
        Self {
            repository,
            cache,
            url_filter,
            settings,
        }
    }

    /// Shortens a URL, either under a custom alias or a generated code.
    ///
    /// # Flow
    ///
    /// 1. Normalize the URL (`https://` is assumed when no scheme is given)
    /// 2. Screen it with the [`UrlFilter`]
    /// 3. With a custom alias: validate, check reservation and uniqueness
    ///    against every record, create, write through to the cache
    /// 4. Without: return the existing active record for the same URL if any
    /// 5. Otherwise generate a code, retrying on collision, create, write through
    ///
    /// Steps 4 and 5 are not atomic: two concurrent submissions of the same
    /// URL may both create a record. Only `short_code` is unique in the store.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidUrl`], [`AppError::MaliciousUrl`]
    /// - [`AppError::InvalidAlias`], [`AppError::ReservedAlias`], [`AppError::AliasTaken`]
    /// - [`AppError::Validation`] for a zero or out-of-range `expires_in`
    /// - [`AppError::CodeSpaceExhausted`] when every candidate code collides
    /// - Store errors
    pub async fn shorten(
        &self,
        long_url: &str,
        options: ShortenOptions,
    ) -> Result<ShortenedLink, AppError> {
        let normalized_url =
            normalize_url(long_url).map_err(|e| AppError::InvalidUrl(e.to_string()))?;

        if self.url_filter.is_malicious(&normalized_url) {
            warn!(url = %normalized_url, creator_ip = ?options.creator_ip, "Rejected malicious URL");
            return Err(AppError::MaliciousUrl);
        }

        let created_at = Utc::now();
        let expires_at = expiry_from(created_at, options.expires_in)?;

        if let Some(alias) = options.custom_alias {
            let record = self
                .create_with_alias(alias, normalized_url, created_at, expires_at, options.creator_ip)
                .await?;
            self.cache
                .try_set(&record.short_code, &record.long_url, options.expires_in)
                .await;
            return Ok(ShortenedLink {
                record,
                created: true,
            });
        }

        if let Some(existing) = self
            .repository
            .find_active_by_long_url(&normalized_url, created_at)
            .await?
        {
            debug!(short_code = %existing.short_code, "Reusing existing short code");
            return Ok(ShortenedLink {
                record: existing,
                created: false,
            });
        }

        let record = self
            .create_with_generated_code(normalized_url, created_at, expires_at, options.creator_ip)
            .await?;
        self.cache
            .try_set(&record.short_code, &record.long_url, options.expires_in)
            .await;

        Ok(ShortenedLink {
            record,
            created: true,
        })
    }

    /// Resolves a short code to its long URL and counts the access.
    ///
    /// # Flow
    ///
    /// - **Cache hit**: returns at once; the click is written back by a
    ///   detached task whose failures are only logged
    /// - **Cache miss**: reads the store, rejects absent, inactive or expired
    ///   records, populates the cache with the remaining lifetime, then counts
    ///   the click before returning
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidShortCode`] for malformed codes (no store access).
    /// Returns [`AppError::NotFound`] if the code is unknown, inactive or expired.
    pub async fn resolve(&self, short_code: &str) -> Result<String, AppError> {
        if !is_valid_code_shape(short_code) {
            return Err(AppError::InvalidShortCode(short_code.to_string()));
        }

        if let Some(long_url) = self.cache.try_get(short_code).await {
            self.spawn_click_writeback(short_code.to_string());
            return Ok(long_url);
        }

        let now = Utc::now();
        let record = self
            .repository
            .find_by_code(short_code)
            .await?
            // Expiry is checked even for active records: the sweep may lag.
            .filter(|record| record.is_resolvable_at(now))
            .ok_or_else(|| AppError::not_found(short_code))?;

        let ttl = record
            .remaining_ttl_at(now)
            .map(|secs| u64::try_from(secs).unwrap_or(0));
        self.cache
            .try_set(&record.short_code, &record.long_url, ttl)
            .await;

        self.repository.record_click(short_code, now).await?;

        Ok(record.long_url)
    }

    /// Returns the durable state of a record, bypassing the cache.
    ///
    /// Inactive and expired records are reported too.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has this code.
    pub async fn get_stats(&self, short_code: &str) -> Result<UrlRecord, AppError> {
        if !is_valid_code_shape(short_code) {
            return Err(AppError::InvalidShortCode(short_code.to_string()));
        }

        self.repository
            .find_by_code(short_code)
            .await?
            .ok_or_else(|| AppError::not_found(short_code))
    }

    /// Returns true if the record store answers.
    pub async fn store_healthy(&self) -> bool {
        self.repository.ping().await.is_ok()
    }

    async fn create_with_alias(
        &self,
        alias: String,
        long_url: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        creator_ip: Option<String>,
    ) -> Result<UrlRecord, AppError> {
        validate_alias(&alias)?;

        if is_reserved(&alias) {
            return Err(AppError::ReservedAlias(alias));
        }

        // Aliases are never recycled, so inactive and expired records count.
        if self.repository.find_by_code(&alias).await?.is_some() {
            return Err(AppError::AliasTaken(alias));
        }

        let new_record = NewUrlRecord {
            long_url,
            short_code: alias.clone(),
            created_at,
            expires_at,
            creator_ip,
            is_custom_alias: true,
        };

        let record = self
            .repository
            .create(new_record)
            .await
            .map_err(|e| match e {
                AppError::CodeConflict(_) => AppError::AliasTaken(alias),
                other => other,
            })?;

        info!(short_code = %record.short_code, "Created custom alias");
        metrics::counter!("link_resolver_links_created_total", "kind" => "alias").increment(1);

        Ok(record)
    }

    /// Inserts the record under random candidate codes until one is free.
    ///
    /// The store's unique constraint is the arbiter: a losing insert comes
    /// back as [`AppError::CodeConflict`] and the next candidate is tried.
    /// After `max_code_attempts` random candidates, one content-derived code
    /// is tried before giving up.
    async fn create_with_generated_code(
        &self,
        long_url: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        creator_ip: Option<String>,
    ) -> Result<UrlRecord, AppError> {
        let max_attempts = self.settings.max_code_attempts;

        for attempt in 1..=max_attempts + 1 {
            let short_code = if attempt <= max_attempts {
                generate_code(self.settings.code_length)?
            } else {
                warn!(
                    attempts = max_attempts,
                    "Random codes exhausted, trying content-derived code"
                );
                derive_from_content(&long_url, self.settings.code_length)
            };

            // A reserved code would be shadowed by a system route.
            if is_reserved(&short_code) {
                debug!(%short_code, attempt, "Generated code is reserved, retrying");
                continue;
            }

            let new_record = NewUrlRecord {
                long_url: long_url.clone(),
                short_code,
                created_at,
                expires_at,
                creator_ip: creator_ip.clone(),
                is_custom_alias: false,
            };

            match self.repository.create(new_record).await {
                Ok(record) => {
                    info!(short_code = %record.short_code, attempt, "Created short link");
                    metrics::counter!("link_resolver_links_created_total", "kind" => "generated")
                        .increment(1);
                    return Ok(record);
                }
                Err(AppError::CodeConflict(code)) => {
                    debug!(%code, attempt, "Short code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::CodeSpaceExhausted {
            attempts: max_attempts + 1,
        })
    }

    /// Counts a cache-served access in the background.
    ///
    /// The task is not awaited and its errors never reach the caller. It is
    /// not ordered against other resolutions of the same code, so under
    /// concurrent failures the click count may lag; it is an analytics
    /// figure and only converges eventually.
    fn spawn_click_writeback(&self, short_code: String) {
        let repository = Arc::clone(&self.repository);
        let cache = Arc::clone(&self.cache);

        tokio::spawn(async move {
            match repository.record_click(&short_code, Utc::now()).await {
                Ok(true) => {}
                Ok(false) => {
                    // Record purged while still cached.
                    debug!(%short_code, "Evicting cache entry without record");
                    cache.try_del(&short_code).await;
                }
                Err(e) => {
                    warn!(error = %e, %short_code, "Click write-back failed");
                    metrics::counter!("link_resolver_click_writeback_failures_total")
                        .increment(1);
                }
            }
        });
    }
}

/// Computes `created_at + expires_in`, rejecting zero and overflowing values.
fn expiry_from(
    created_at: DateTime<Utc>,
    expires_in: Option<u64>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(seconds) = expires_in else {
        return Ok(None);
    };

    let invalid = || {
        AppError::bad_request(
            "expiresIn must be a positive number of seconds",
            json!({ "expiresIn": seconds }),
        )
    };

    if seconds == 0 {
        return Err(invalid());
    }

    let delta = i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(invalid)?;

    created_at
        .checked_add_signed(delta)
        .map(Some)
        .ok_or_else(invalid)
}
