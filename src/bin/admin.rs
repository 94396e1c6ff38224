//! CLI administration tool for shrinkurl.
//!
//! Inspects links, runs the expiry sweep on demand and manages rate limit
//! counters without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show a link and its counters
//! cargo run --bin admin -- link show aZ3kP9
//!
//! # Deactivate expired links now
//! cargo run --bin admin -- links sweep
//!
//! # Inspect or clear a rate limit counter
//! cargo run --bin admin -- rate-limit status "POST:/api/links:owner:42" --limit 50
//! cargo run --bin admin -- rate-limit reset "GET:/{code}:ip:10.0.0.1"
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server, see `shrinkurl::config`. Rate limit commands need
//! Redis: without it counters only exist inside each server process.

use shrinkurl::application::services::{LimitScope, RateLimiter};
use shrinkurl::config::{self, Config};
use shrinkurl::domain::expiry_sweeper::sweep_expired;
use shrinkurl::domain::repositories::{LinkRepository, ResolverStore};
use shrinkurl::infrastructure::cache::RedisCache;
use shrinkurl::infrastructure::persistence::PgLinkRepository;
use shrinkurl::infrastructure::rate_limit::RedisCounterStore;
use shrinkurl::infrastructure::resolver::{CachedResolverStore, DurableResolverStore};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing shrinkurl.
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
    /// Inspect a single link
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Bulk link maintenance
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },

    /// Inspect and reset rate limit counters
    RateLimit {
        #[command(subcommand)]
        action: RateLimitAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Show a link by its short code
    Show { code: String },
}

#[derive(Subcommand)]
enum LinksAction {
    /// Deactivate expired links and drop them from the cache
    Sweep,
}

#[derive(Subcommand)]
enum RateLimitAction {
    /// Show the current window of a counter
    Status {
        /// Counter key without namespace, e.g. "POST:/api/links:owner:42"
        key: String,

        /// Limit to compute the remaining quota against
        #[arg(short, long, default_value_t = 100)]
        limit: u64,

        /// Window length in seconds, used when the counter has no expiry
        #[arg(short, long, default_value_t = 60)]
        window: u64,

        /// Read from the global namespace instead of the per-route one
        #[arg(short, long)]
        global: bool,
    },

    /// Delete a counter, restoring the full quota
    Reset {
        key: String,

        #[arg(short, long)]
        global: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Link { action } => handle_link_action(action, &config).await?,
        Commands::Links { action } => handle_links_action(action, &config).await?,
        Commands::RateLimit { action } => handle_rate_limit_action(action, &config).await?,
        Commands::Db { action } => handle_db_action(action, &config).await?,
    }

    Ok(())
}

async fn connect_db(config: &Config) -> Result<PgPool> {
    PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

fn format_time(value: Option<DateTime<Utc>>) -> ColoredString {
    match value {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string().normal(),
        None => "never".bright_black(),
    }
}

async fn handle_link_action(action: LinkAction, config: &Config) -> Result<()> {
    let LinkAction::Show { code } = action;

    let pool = connect_db(config).await?;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo
        .find_by_code(&code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .with_context(|| format!("No link with code '{}'", code))?;

    let status = if !link.is_active {
        "INACTIVE".red()
    } else if link.is_expired() {
        "EXPIRED".yellow()
    } else {
        "ACTIVE".green()
    };

    println!("{}", "Link".bright_blue().bold());
    println!();
    println!("  Code:         {}", link.code.cyan());
    println!("  URL:          {}", link.original_url.bright_white());
    println!("  Owner:        {}", link.owner_id);
    println!("  Status:       {}", status);
    println!("  Created:      {}", format_time(Some(link.created_at)));
    println!("  Expires:      {}", format_time(link.expires_at));
    println!(
        "  Clicks:       {}",
        link.click_count.to_string().bright_green().bold()
    );
    println!("  Last click:   {}", format_time(link.last_clicked_at));
    println!();

    Ok(())
}

async fn handle_links_action(action: LinksAction, config: &Config) -> Result<()> {
    let LinksAction::Sweep = action;

    println!("{}", "Sweeping expired links...".bright_blue());

    let pool = connect_db(config).await?;
    let links: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(Arc::new(pool)));
    let durable = Arc::new(DurableResolverStore::new(links.clone()));

    let store: Arc<dyn ResolverStore> = match &config.redis_url {
        Some(url) => {
            let cache = RedisCache::connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))?;
            Arc::new(CachedResolverStore::new(Arc::new(cache), durable))
        }
        None => {
            println!(
                "{}",
                "Redis not configured, server-local caches expire on their own TTL".yellow()
            );
            durable
        }
    };

    let count = sweep_expired(links.as_ref(), store.as_ref(), Utc::now())
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!(
        "{} {}",
        "Deactivated links:".green().bold(),
        count.to_string().bright_white().bold()
    );

    Ok(())
}

async fn connect_limiter(config: &Config) -> Result<RateLimiter> {
    let url = config
        .rate_limit_redis_url()
        .context("Redis is not configured; counters live inside each server process")??;

    let store = RedisCounterStore::connect(&url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))?;

    Ok(RateLimiter::new(Arc::new(store)))
}

fn scope(global: bool) -> LimitScope {
    if global {
        LimitScope::Global
    } else {
        LimitScope::Endpoint
    }
}

async fn handle_rate_limit_action(action: RateLimitAction, config: &Config) -> Result<()> {
    let limiter = connect_limiter(config).await?;

    match action {
        RateLimitAction::Status {
            key,
            limit,
            window,
            global,
        } => {
            let status = limiter
                .status_in(scope(global), &key, limit, window)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            let remaining = if status.remaining == 0 {
                status.remaining.to_string().red().bold()
            } else {
                status.remaining.to_string().green().bold()
            };

            println!("{}", "Rate limit counter".bright_blue().bold());
            println!();
            println!("  Key:        {}", scope(global).key(&key).cyan());
            println!("  Count:      {}", status.count);
            println!("  Limit:      {}", status.limit);
            println!("  Remaining:  {}", remaining);
            println!(
                "  Resets in:  {}s",
                status.retry_after_secs().to_string().bright_white()
            );
            println!();
        }
        RateLimitAction::Reset { key, global, yes } => {
            let full_key = scope(global).key(&key);
            println!("  Counter: {}", full_key.cyan());

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Reset this counter?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "Cancelled".red());
                    return Ok(());
                }
            }

            limiter
                .reset_in(scope(global), &key)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            println!("{}", "Counter reset".green().bold());
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            let pool = connect_db(config).await?;
            sqlx::query("SELECT 1").fetch_one(&pool).await?;

            let links: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE is_active = TRUE")
                    .fetch_one(&pool)
                    .await?;

            println!("{}", "Database connection OK".green().bold());
            println!("  Active links: {}", links.to_string().bright_white());
        }
    }

    Ok(())
}
