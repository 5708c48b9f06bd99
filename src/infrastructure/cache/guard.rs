//! Capability-checked cache client.
//!
//! Call sites never branch on cache availability: every `try_*` operation
//! no-ops (or reports a miss) when no backend is installed, and backend
//! errors are logged at `warn` and swallowed. A missing entry therefore never
//! means "the URL does not exist".

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{info, warn};

use super::service::{CacheResult, CacheService};

/// Best-effort front for an optional [`CacheService`] backend.
pub struct CacheGuard {
    backend: RwLock<Option<Arc<dyn CacheService>>>,
    default_ttl: u64,
}

impl CacheGuard {
    /// Creates a guard with an installed backend.
    pub fn new(backend: Arc<dyn CacheService>, default_ttl_seconds: u64) -> Self {
        Self {
            backend: RwLock::new(Some(backend)),
            default_ttl: default_ttl_seconds,
        }
    }

    /// Creates a guard without a backend; every operation is a no-op until
    /// [`CacheGuard::install`] is called.
    pub fn disabled(default_ttl_seconds: u64) -> Self {
        Self {
            backend: RwLock::new(None),
            default_ttl: default_ttl_seconds,
        }
    }

    /// Installs (or replaces) the backend.
    pub fn install(&self, backend: Arc<dyn CacheService>) {
        let mut slot = self.backend.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(backend);
    }

    /// Returns true if a backend is installed.
    pub fn is_available(&self) -> bool {
        self.backend().is_some()
    }

    /// TTL applied when a caller has no expiry of its own.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    fn backend(&self) -> Option<Arc<dyn CacheService>> {
        // Clone out so the lock is never held across an await.
        self.backend
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Looks up a short code. Any failure is reported as a miss.
    pub async fn try_get(&self, short_code: &str) -> Option<String> {
        let backend = self.backend()?;

        match backend.get_url(short_code).await {
            Ok(hit) => {
                let counter = if hit.is_some() {
                    "link_resolver_cache_hits_total"
                } else {
                    "link_resolver_cache_misses_total"
                };
                metrics::counter!(counter).increment(1);
                hit
            }
            Err(e) => {
                warn!(error = %e, short_code, "Cache unavailable on read, falling back to store");
                metrics::counter!("link_resolver_cache_misses_total").increment(1);
                None
            }
        }
    }

    /// Stores a mapping. `ttl_seconds = None` applies the default TTL; a TTL of
    /// zero is skipped since the entry would already be stale.
    pub async fn try_set(&self, short_code: &str, long_url: &str, ttl_seconds: Option<u64>) {
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);
        if ttl == 0 {
            return;
        }

        let Some(backend) = self.backend() else {
            return;
        };

        if let Err(e) = backend.set_url(short_code, long_url, ttl).await {
            warn!(error = %e, short_code, "Cache unavailable on write, entry not cached");
        }
    }

    /// Evicts a mapping.
    pub async fn try_del(&self, short_code: &str) {
        let Some(backend) = self.backend() else {
            return;
        };

        if let Err(e) = backend.invalidate(short_code).await {
            warn!(error = %e, short_code, "Cache unavailable on evict");
        }
    }

    /// Returns true if a backend is installed and passes its health check.
    pub async fn health_check(&self) -> bool {
        match self.backend() {
            Some(backend) => backend.health_check().await,
            None => false,
        }
    }
}

/// Keeps calling `connect` with capped exponential backoff and installs the
/// backend into `guard` once it succeeds.
///
/// Delays start at 500ms and double up to `max_delay`, with jitter.
pub fn spawn_reconnect<F, Fut>(
    guard: Arc<CacheGuard>,
    mut connect: F,
    max_delay: Duration,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = CacheResult<Arc<dyn CacheService>>> + Send + 'static,
{
    tokio::spawn(async move {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(250)
            .max_delay(max_delay)
            .map(jitter);

        let attempt = move || {
            let pending = connect();
            async move {
                pending.await.inspect_err(|e| {
                    warn!(error = %e, "Cache still unreachable, retrying");
                })
            }
        };

        match Retry::spawn(strategy, attempt).await {
            Ok(backend) => {
                guard.install(backend);
                info!("Cache enabled (reconnected)");
            }
            Err(e) => warn!(error = %e, "Giving up on cache reconnection"),
        }
    })
}
