//! CLI administration tool for link-resolver.
//!
//! Provides commands for inspecting links and running maintenance without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Overall statistics
//! cargo run --bin admin -- stats
//!
//! # Statistics for one link
//! cargo run --bin admin -- stats Ab3xK9p
//!
//! # Deactivate expired links now
//! cargo run --bin admin -- sweep
//!
//! # Delete inactive links older than 7 days
//! cargo run --bin admin -- purge --days 7
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `REDIS_URL` (optional): evict cache entries of deactivated links
//! - `RETENTION_DAYS` (optional): default for `purge --days` (30)

use link_resolver::application::services::{ExpirationSweeper, SweeperConfig};
use link_resolver::domain::repositories::UrlRepository;
use link_resolver::infrastructure::cache::{CacheGuard, RedisCache};
use link_resolver::infrastructure::persistence::PgUrlRepository;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing link-resolver.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Show overall statistics, or those of a single link
    Stats {
        /// Short code to inspect
        code: Option<String>,
    },

    /// Deactivate expired links and evict them from the cache
    Sweep,

    /// Permanently delete inactive links past the retention window
    Purge {
        /// Retention window in days (default: RETENTION_DAYS or 30)
        #[arg(short, long)]
        days: Option<u32>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Stats { code: Some(code) } => handle_link_stats(&pool, &code).await?,
        Commands::Stats { code: None } => handle_stats(&pool).await?,
        Commands::Sweep => handle_sweep(&pool).await?,
        Commands::Purge { days, yes } => handle_purge(&pool, days, yes).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn repository(pool: &PgPool) -> Arc<PgUrlRepository> {
    Arc::new(PgUrlRepository::new(Arc::new(pool.clone())))
}

/// Connects the cache if `REDIS_URL` is set; a failure only disables eviction.
async fn cache_guard() -> Arc<CacheGuard> {
    let guard = CacheGuard::disabled(3600);

    if let Ok(redis_url) = std::env::var("REDIS_URL") {
        match RedisCache::connect(&redis_url).await {
            Ok(redis) => guard.install(Arc::new(redis)),
            Err(e) => println!(
                "{} {}",
                "⚠️  Redis unavailable, cache entries will expire on their own:".yellow(),
                e
            ),
        }
    }

    Arc::new(guard)
}

/// Displays aggregate statistics.
///
/// Shows:
/// - Total, active and custom-alias links
/// - Links past expiry that the sweeper has not deactivated yet
/// - Total clicks
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let (total, active, custom, pending, clicks): (i64, i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COUNT(*) FILTER (WHERE is_active),
            COUNT(*) FILTER (WHERE is_custom_alias),
            COUNT(*) FILTER (WHERE is_active AND expires_at <= NOW()),
            COALESCE(SUM(clicks), 0)::BIGINT
        FROM urls
        "#,
    )
    .fetch_one(pool)
    .await?;

    println!("  Links:            {}", total.to_string().bright_green().bold());
    println!("  Active:           {}", active.to_string().bright_green().bold());
    println!("  Custom aliases:   {}", custom.to_string().bright_green().bold());
    println!("  Awaiting sweep:   {}", pending.to_string().yellow().bold());
    println!("  Clicks:           {}", clicks.to_string().bright_green().bold());
    println!();

    Ok(())
}

/// Displays the durable state of a single link.
async fn handle_link_stats(pool: &PgPool, code: &str) -> Result<()> {
    let record = repository(pool)
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .with_context(|| format!("No link with code '{code}'"))?;

    let status = if record.is_expired() {
        "EXPIRED".yellow()
    } else if record.is_active {
        "ACTIVE".green()
    } else {
        "INACTIVE".red()
    };

    let format_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    println!("{}", "🔗 Link".bright_blue().bold());
    println!();
    println!("  Code:          {}", record.short_code.cyan());
    println!("  URL:           {}", record.long_url.bright_white());
    println!("  Status:        {}", status);
    println!("  Custom alias:  {}", record.is_custom_alias);
    println!("  Clicks:        {}", record.clicks.to_string().bright_green().bold());
    println!("  Created:       {}", format_time(Some(record.created_at)));
    println!("  Expires:       {}", format_time(record.expires_at));
    println!("  Last accessed: {}", format_time(record.last_accessed));
    if let Some(ip) = &record.creator_ip {
        println!("  Creator IP:    {}", ip.bright_black());
    }
    println!();

    Ok(())
}

/// Runs a single deactivation pass.
async fn handle_sweep(pool: &PgPool) -> Result<()> {
    println!("{}", "🧹 Deactivating expired links...".bright_blue());

    let sweeper = ExpirationSweeper::new(repository(pool), cache_guard().await, SweeperConfig::default());

    let report = sweeper
        .sweep_once()
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!(
        "{} {} link(s) in {} batch(es)",
        "✅ Deactivated".green().bold(),
        report.deactivated.to_string().bright_white().bold(),
        report.batches
    );

    Ok(())
}

/// Deletes inactive links past the retention window after confirmation.
///
/// # Safety
///
/// - Requires confirmation (default: No) unless `--yes` is given
/// - Only inactive links are deleted; run `sweep` first to include
///   links that expired recently
async fn handle_purge(pool: &PgPool, days: Option<u32>, skip_confirm: bool) -> Result<()> {
    let days = match days {
        Some(d) => d,
        None => std::env::var("RETENTION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
    };

    if days == 0 {
        anyhow::bail!("--days must be at least 1");
    }

    println!("{}", "🗑️  Purge inactive links".bright_blue().bold());
    println!();
    println!(
        "  Deleting inactive links expired or created more than {} days ago.",
        days.to_string().bright_white().bold()
    );
    println!("{}", "  This cannot be undone.".red().bold());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Purge these links?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let config = SweeperConfig {
        retention: TimeDelta::days(i64::from(days)),
        ..SweeperConfig::default()
    };
    let sweeper = ExpirationSweeper::new(repository(pool), Arc::new(CacheGuard::disabled(3600)), config);

    let purged = sweeper
        .purge_once()
        .await
        .map_err(|e| anyhow::anyhow!("Purge failed: {}", e))?;

    println!(
        "{} {} link(s)",
        "✅ Purged".green().bold(),
        purged.to_string().bright_white().bold()
    );

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            repository(pool)
                .ping()
                .await
                .map_err(|e| anyhow::anyhow!("Database check failed: {}", e))?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
