//! # TaskTrack API Server
//!
//! Task tracking over HTTP with team-scoped permissions and
//! bearer-token sessions.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/tasktrack JWT_SECRET=... cargo run -p tasktrack-api
//! ```

use anyhow::Context;
use std::sync::Arc;
use tasktrack_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasktrack_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, PoolConfig},
    },
    store::postgres::PgStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let fmt_layer = if config.api.production {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tasktrack_api=debug,tasktrack_shared=debug,tower_http=debug".into()
            }),
        )
        .with(fmt_layer)
        .init();

    tracing::info!(
        "TaskTrack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(PoolConfig {
        max_connections: config.database.max_connections,
        ..PoolConfig::new(config.database.url.clone())
    })
    .await
    .context("Failed to create database pool")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
