/// Database connection pool management
///
/// Builds a `PgPool` from a [`PoolConfig`] and verifies connectivity before
/// handing it out, so a bad `DATABASE_URL` fails at startup rather than on
/// the first request.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection pool settings
///
/// Timeouts are in seconds so they can come straight from environment variables.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Upper bound on open connections
    pub max_connections: u32,

    /// Idle connections kept warm
    pub min_connections: u32,

    /// How long to wait for a free connection
    pub acquire_timeout_seconds: u64,

    /// Idle connections are closed after this long (None = never)
    pub idle_timeout_seconds: Option<u64>,

    /// Connections are recycled after this long (None = never)
    pub max_lifetime_seconds: Option<u64>,
}

impl PoolConfig {
    /// Default settings for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

/// Creates a pool and runs a health check against it
///
/// # Errors
///
/// Returns an error if the URL is invalid, the database is unreachable, or
/// the health check fails.
pub async fn create_pool(config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_seconds = config.acquire_timeout_seconds,
        "Creating database connection pool"
    );

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .test_before_acquire(true);

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        options = options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        options = options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = options.connect(&config.url).await?;
    health_check(&pool).await?;

    info!("Database connection pool ready");
    Ok(pool)
}

/// Runs `SELECT 1` against the pool
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (value,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if value != 1 {
        warn!(value, "Database health check returned unexpected value");
        return Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ));
    }

    debug!("Database health check passed");
    Ok(())
}

/// Closes all connections; call during shutdown
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout_seconds, 30);
        assert_eq!(config.idle_timeout_seconds, Some(600));
        assert_eq!(config.max_lifetime_seconds, Some(1800));
    }

    #[test]
    fn test_pool_config_new_keeps_defaults() {
        let config = PoolConfig::new("postgresql://localhost/tasktrack");
        assert_eq!(config.url, "postgresql://localhost/tasktrack");
        assert_eq!(config.max_connections, 10);
    }
}
