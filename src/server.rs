//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, the expiration sweeper, and the
//! Axum server lifecycle.

use crate::application::services::{ExpirationSweeper, LinkService};
use crate::config::Config;
use crate::domain::repositories::UrlRepository;
use crate::infrastructure::cache::{CacheGuard, CacheService, RedisCache, spawn_reconnect};
use crate::infrastructure::persistence::PgUrlRepository;
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::url_filter::KeywordDenylist;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (disabled, with background reconnection, if unreachable)
/// - Expiration sweeper
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - A denylist pattern does not compile
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache = Arc::new(CacheGuard::disabled(config.cache_ttl_seconds));
    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url).await {
            Ok(redis) => {
                cache.install(Arc::new(redis));
                tracing::info!("Cache enabled (Redis)");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, serving from database and retrying in background");
                let redis_url = redis_url.clone();
                spawn_reconnect(
                    cache.clone(),
                    move || {
                        let redis_url = redis_url.clone();
                        async move {
                            RedisCache::connect(&redis_url)
                                .await
                                .map(|redis| Arc::new(redis) as Arc<dyn CacheService>)
                        }
                    },
                    Duration::from_secs(config.cache_reconnect_max_delay_secs),
                );
            }
        }
    } else {
        tracing::info!("Cache disabled");
    }

    let url_filter = Arc::new(
        KeywordDenylist::with_defaults(&config.malicious_patterns)
            .context("Invalid MALICIOUS_PATTERNS")?,
    );

    let repository: Arc<dyn UrlRepository> = Arc::new(PgUrlRepository::new(Arc::new(pool)));

    let link_service = Arc::new(LinkService::new(
        repository.clone(),
        cache.clone(),
        url_filter,
        config.link_settings(),
    ));

    let sweeper = Arc::new(ExpirationSweeper::new(
        repository,
        cache.clone(),
        config.sweeper_config(),
    ));
    let (sweeper_cancel, sweeper_handle) = sweeper.spawn();

    let state = AppState::new(link_service, cache, &config.base_url, config.behind_proxy);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper_cancel.cancel();
    if let Err(e) = sweeper_handle.await {
        tracing::warn!(error = %e, "Expiration sweeper did not stop cleanly");
    }
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
