#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use chrono::{DateTime, Duration, Utc};
use link_resolver::application::services::{LinkService, LinkSettings};
use link_resolver::domain::entities::{NewUrlRecord, UrlRecord};
use link_resolver::domain::repositories::UrlRepository;
use link_resolver::error::AppError;
use link_resolver::infrastructure::cache::{CacheError, CacheGuard, CacheResult, CacheService};
use link_resolver::state::AppState;
use link_resolver::utils::url_filter::KeywordDenylist;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::Layer;

pub const BASE_URL: &str = "http://sho.rt";

/// Record store kept in memory, with the same uniqueness rule as the table.
#[derive(Default)]
pub struct InMemoryUrlRepository {
    records: Mutex<HashMap<String, UrlRecord>>,
    next_id: Mutex<i64>,
    unavailable: AtomicBool,
}

impl InMemoryUrlRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every operation fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn get(&self, short_code: &str) -> Option<UrlRecord> {
        self.records.lock().unwrap().get(short_code).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Inserts a record as-is, bypassing the engine.
    pub fn seed(&self, record: UrlRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.short_code.clone(), record);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AppError::StoreUnavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UrlRepository for InMemoryUrlRepository {
    async fn create(&self, new_record: NewUrlRecord) -> Result<UrlRecord, AppError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();

        if records.contains_key(&new_record.short_code) {
            return Err(AppError::CodeConflict(new_record.short_code));
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;

        let record = UrlRecord {
            id: *next_id,
            long_url: new_record.long_url,
            short_code: new_record.short_code,
            clicks: 0,
            created_at: new_record.created_at,
            expires_at: new_record.expires_at,
            is_active: true,
            creator_ip: new_record.creator_ip,
            last_accessed: None,
            is_custom_alias: new_record.is_custom_alias,
        };
        records.insert(record.short_code.clone(), record.clone());

        Ok(record)
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        self.check()?;
        Ok(self.get(short_code))
    }

    async fn find_active_by_long_url(
        &self,
        long_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UrlRecord>, AppError> {
        self.check()?;
        let records = self.records.lock().unwrap();

        Ok(records
            .values()
            .filter(|r| r.long_url == long_url && r.is_resolvable_at(now))
            .min_by_key(|r| r.id)
            .cloned())
    }

    async fn record_click(&self, short_code: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();

        match records.get_mut(short_code) {
            Some(record) => {
                record.clicks += 1;
                record.last_accessed = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<String>, AppError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();

        let mut codes = Vec::new();
        for record in records.values_mut() {
            if codes.len() as i64 >= limit {
                break;
            }
            if record.is_active && record.is_expired_at(now) {
                record.is_active = false;
                codes.push(record.short_code.clone());
            }
        }

        Ok(codes)
    }

    async fn purge_inactive(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();

        let before = records.len();
        records.retain(|_, r| {
            let old = r.expires_at.is_some_and(|e| e < cutoff) || r.created_at < cutoff;
            r.is_active || !old
        });

        Ok((before - records.len()) as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check()
    }
}

/// Cache backend kept in memory. TTLs are recorded, not enforced.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, u64)>>,
    down: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every operation fail with a connection error.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn entry(&self, short_code: &str) -> Option<(String, u64)> {
        self.entries.lock().unwrap().get(short_code).cloned()
    }

    /// Overwrites an entry, bypassing the engine.
    pub fn put(&self, short_code: &str, long_url: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(short_code.to_string(), (long_url.to_string(), 3600));
    }

    fn check(&self) -> CacheResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(CacheError::ConnectionError("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheService for InMemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        self.check()?;
        Ok(self.entry(short_code).map(|(url, _)| url))
    }

    async fn set_url(&self, short_code: &str, long_url: &str, ttl_seconds: u64) -> CacheResult<()> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(short_code.to_string(), (long_url.to_string(), ttl_seconds));
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        self.check()?;
        self.entries.lock().unwrap().remove(short_code);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.check().is_ok()
    }
}

/// Builds application state over in-memory backends.
///
/// `cache = None` runs with the cache disabled.
pub fn create_test_state(
    repository: Arc<InMemoryUrlRepository>,
    cache: Option<Arc<InMemoryCache>>,
) -> AppState {
    create_test_state_with(repository, cache, false)
}

pub fn create_test_state_with(
    repository: Arc<InMemoryUrlRepository>,
    cache: Option<Arc<InMemoryCache>>,
    behind_proxy: bool,
) -> AppState {
    let guard = match cache {
        Some(cache) => CacheGuard::new(cache, 3600),
        None => CacheGuard::disabled(3600),
    };
    let guard = Arc::new(guard);

    let link_service = Arc::new(LinkService::new(
        repository,
        guard.clone(),
        Arc::new(KeywordDenylist::default()),
        LinkSettings::default(),
    ));

    AppState::new(link_service, guard, BASE_URL, behind_proxy)
}

pub fn test_record(short_code: &str, long_url: &str) -> UrlRecord {
    UrlRecord {
        id: 1000,
        long_url: long_url.to_string(),
        short_code: short_code.to_string(),
        clicks: 0,
        created_at: Utc::now() - Duration::hours(1),
        expires_at: None,
        is_active: true,
        creator_ip: None,
        last_accessed: None,
        is_custom_alias: false,
    }
}

/// Polls until `check` holds or a second has passed.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    check()
}

/// Inserts a fixed peer address, as `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

pub const PEER_ADDR: &str = "127.0.0.1:12345";

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = PEER_ADDR.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
