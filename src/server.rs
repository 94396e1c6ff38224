//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache and counter store setup, background
//! task spawning, and the Axum server lifecycle.

use crate::api::middleware::rate_limit::{GlobalLimits, RateLimitPolicy};
use crate::config::{Config, mask_connection_string};
use crate::domain::click_worker::run_click_worker;
use crate::domain::expiry_sweeper::run_expiry_sweeper;
use crate::infrastructure::cache::{CacheService, MemoryCache, RedisCache};
use crate::infrastructure::persistence::PgClickRepository;
use crate::infrastructure::rate_limit::{CounterStore, MemoryCounterStore, RedisCounterStore};
use crate::routes::app_router;
use crate::state::{AppState, StateSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Upper bound on waiting for queued clicks at shutdown.
const CLICK_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Link cache and rate limit counters (Redis, or in-process fallback)
/// - Background click worker and expiry sweeper
/// - Axum HTTP server
///
/// On SIGINT/SIGTERM the server stops accepting requests, finishes in-flight
/// ones, drains the click queue, then stops the sweeper.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache = connect_cache(&config).await;
    let counters = connect_counter_store(&config).await?;

    let pool = Arc::new(pool);
    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);

    let click_repository = Arc::new(PgClickRepository::new(pool.clone()));
    let click_worker = tokio::spawn(run_click_worker(
        click_rx,
        click_repository,
        config.click_worker_concurrency,
        config.click_max_retries,
    ));
    tracing::info!(
        concurrency = config.click_worker_concurrency,
        "Click worker started"
    );

    let state = AppState::new(
        pool,
        cache,
        counters,
        click_tx,
        StateSettings {
            base_url: config.base_url.clone(),
            behind_proxy: config.behind_proxy,
            rate_limit_policy: rate_limit_policy(&config),
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = tokio::spawn(run_expiry_sweeper(
        state.links.clone(),
        state.resolver_store.clone(),
        Duration::from_secs(config.expiry_sweep_interval_seconds),
        shutdown_rx,
    ));

    let app = app_router(state, Duration::from_secs(config.request_timeout_seconds));

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    // The router owns the last click sender, so the worker sees the channel
    // close once the server has shut down.
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped, draining click queue");
    match tokio::time::timeout(CLICK_DRAIN_TIMEOUT, click_worker).await {
        Ok(Ok(())) => tracing::info!("Click queue drained"),
        Ok(Err(e)) => tracing::error!(error = %e, "Click worker panicked"),
        Err(_) => tracing::warn!("Timed out draining click queue, pending clicks lost"),
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        tracing::error!(error = %e, "Expiry sweeper panicked");
    }

    Ok(())
}

async fn connect_database(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Some(Duration::from_secs(config.db_idle_timeout)))
        .max_lifetime(Some(Duration::from_secs(config.db_max_lifetime)))
        .connect(&config.database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database {}",
                mask_connection_string(&config.database_url)
            )
        })
}

async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::warn!("Redis not configured, using in-process cache (single instance only)");
        return Arc::new(MemoryCache::new());
    };

    match RedisCache::connect(redis_url).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis cache: {}. Using in-process cache.", e);
            Arc::new(MemoryCache::new())
        }
    }
}

async fn connect_counter_store(config: &Config) -> Result<Arc<dyn CounterStore>> {
    let Some(url) = config.rate_limit_redis_url() else {
        tracing::warn!(
            "Redis not configured, rate limit counters are per instance (single instance only)"
        );
        return Ok(Arc::new(MemoryCounterStore::new()));
    };
    let url = url?;

    match RedisCounterStore::connect(&url).await {
        Ok(store) => {
            tracing::info!(db = config.rate_limit_redis_db, "Rate limit counters enabled (Redis)");
            Ok(Arc::new(store))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to connect to Redis counters: {}. Using in-process counters.",
                e
            );
            Ok(Arc::new(MemoryCounterStore::new()))
        }
    }
}

fn rate_limit_policy(config: &Config) -> RateLimitPolicy {
    let global = config.global_rate_limit_enabled.then_some(GlobalLimits {
        per_minute: config.global_rate_limit_per_minute,
        per_hour: config.global_rate_limit_per_hour,
    });

    RateLimitPolicy::new(RateLimitPolicy::default_routes(), global)
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
