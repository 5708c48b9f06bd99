//! Background expiration sweeper.
//!
//! Resolution already rejects expired records lazily; the sweeper makes that
//! state durable by flipping `is_active` off and evicting the cache entries,
//! and periodically purges inactive records past the retention window.
//!
//! - Deactivation runs in fixed-size batches, bounded per run
//! - Failures are logged and retried on the next tick, never propagated
//! - Stopped through a `CancellationToken`

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheGuard;

/// Configuration for the expiration sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between deactivation runs (default: 5 minutes).
    pub sweep_interval: Duration,
    /// Interval between purge runs (default: 24 hours).
    pub purge_interval: Duration,
    /// How long inactive records are kept before purging (default: 30 days).
    pub retention: TimeDelta,
    /// Records deactivated per batch (default: 1000).
    pub batch_size: i64,
    /// Maximum batches per run (default: 100).
    pub max_batches: u32,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300),
            purge_interval: Duration::from_secs(86_400),
            retention: TimeDelta::days(30),
            batch_size: 1000,
            max_batches: 100,
        }
    }
}

/// Outcome of a single deactivation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deactivated: usize,
    pub batches: u32,
}

/// Deactivates expired records and purges old inactive ones.
pub struct ExpirationSweeper {
    repository: Arc<dyn UrlRepository>,
    cache: Arc<CacheGuard>,
    config: SweeperConfig,
}

impl ExpirationSweeper {
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        cache: Arc<CacheGuard>,
        config: SweeperConfig,
    ) -> Self {
        Self {
            repository,
            cache,
            config,
        }
    }

    /// Deactivates every record whose expiry has passed and evicts its cache
    /// entry.
    ///
    /// Idempotent: records already inactive are not touched again. Stops after
    /// a short batch or `max_batches`, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns the first store error; batches committed before it stay committed.
    pub async fn sweep_once(&self) -> Result<SweepReport, AppError> {
        let now = Utc::now();
        let mut report = SweepReport::default();

        while report.batches < self.config.max_batches {
            let codes = self
                .repository
                .deactivate_expired(now, self.config.batch_size)
                .await?;
            report.batches += 1;

            for code in &codes {
                self.cache.try_del(code).await;
            }
            report.deactivated += codes.len();

            if (codes.len() as i64) < self.config.batch_size {
                break;
            }
        }

        if report.deactivated > 0 {
            info!(
                deactivated = report.deactivated,
                batches = report.batches,
                "Expired links deactivated"
            );
            metrics::counter!("link_resolver_sweep_deactivated_total")
                .increment(report.deactivated as u64);
        } else {
            debug!("Sweep: no expired links");
        }

        Ok(report)
    }

    /// Deletes inactive records older than the retention window.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn purge_once(&self) -> Result<u64, AppError> {
        let cutoff = Utc::now() - self.config.retention;
        let purged = self.repository.purge_inactive(cutoff).await?;

        if purged > 0 {
            info!(purged, %cutoff, "Purged inactive links");
            metrics::counter!("link_resolver_sweep_purged_total").increment(purged);
        }

        Ok(purged)
    }

    /// Starts the sweep and purge loops on the runtime.
    ///
    /// Both run once immediately, then on their intervals. Cancel the returned
    /// token to stop; the handle completes once the loop has exited.
    pub fn spawn(self: Arc<Self>) -> (CancellationToken, JoinHandle<()>) {
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let handle = tokio::spawn(async move {
            self.run(cancel_clone).await;
        });

        (cancel, handle)
    }

    async fn run(&self, cancel: CancellationToken) {
        let mut sweep_ticker = interval(self.config.sweep_interval);
        sweep_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut purge_ticker = interval(self.config.purge_interval);
        purge_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            purge_interval_secs = self.config.purge_interval.as_secs(),
            retention_days = self.config.retention.num_days(),
            batch_size = self.config.batch_size,
            "Expiration sweeper started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Expiration sweeper shutting down");
                    break;
                }
                _ = sweep_ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        error!(error = %e, "Expiration sweep failed");
                    }
                }
                _ = purge_ticker.tick() => {
                    if let Err(e) = self.purge_once().await {
                        error!(error = %e, "Retention purge failed");
                    }
                }
            }
        }
    }
}
