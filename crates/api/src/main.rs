mod auth;
mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::sync::Arc;

use newsdesk_core::events::EventBus;
use newsdesk_core::recycle_bin::{ExpirySweeper, RetentionPolicy};
use newsdesk_core::store::{ContentStore, PgStore};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = config::AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting newsdesk API server");

    let retention = RetentionPolicy::days(config.retention_days)
        .map_err(|e| anyhow::anyhow!("Invalid RETENTION_DAYS: {e}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;

    tracing::info!("Database migrations applied");

    let store: Arc<dyn ContentStore> = Arc::new(PgStore::new(pool));
    let event_bus = EventBus::new(config.event_bus_capacity);

    // PostgreSQL has no TTL index; expiry runs as an application task.
    let (stop_sweeper, sweeper_signal) = watch::channel(false);
    let sweeper = ExpirySweeper::new(store.clone(), event_bus.clone(), config.sweep_interval)
        .spawn(sweeper_signal);

    let state = state::AppState::new(store, config.clone(), event_bus, retention);

    let app = routes::build_router(state)
        .layer(middleware::request_tracing::body_limit_layer(config.max_body_bytes))
        .layer(middleware::request_tracing::timeout_layer(config.request_timeout))
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer(&config.cors_origins));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = stop_sweeper.send(true);
    if let Err(e) = sweeper.await {
        tracing::warn!("Expiry sweeper ended abnormally: {e}");
    }

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
