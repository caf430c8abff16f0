/// PostgreSQL plumbing
///
/// - `pool`: connection pool creation and health checks
/// - `migrations`: embedded schema migrations (`tasktrack-shared/migrations`)
///
/// The store built on top of the pool lives in [`crate::store::postgres`].
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::db::{migrations::run_migrations, pool::{create_pool, PoolConfig}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(PoolConfig::new(std::env::var("DATABASE_URL")?)).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pool;
