/// Database migration runner
///
/// Migrations live in `tasktrack-shared/migrations/` and are embedded into
/// the binary at compile time with `sqlx::migrate!`.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Summary of applied migrations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Number of successfully applied migrations
    pub applied_migrations: usize,

    /// Highest applied version
    pub latest_version: Option<i64>,

    /// Number of embedded migrations not yet applied
    pub pending_migrations: usize,
}

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        warn!(error = %e, "Migration failed");
        e
    })?;

    info!("Database migrations complete");
    Ok(())
}

/// Reports applied versus embedded migrations
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let embedded = sqlx::migrate!("./migrations").iter().count();

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
            pending_migrations: embedded,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    let applied = count as usize;

    Ok(MigrationStatus {
        applied_migrations: applied,
        latest_version,
        pending_migrations: embedded.saturating_sub(applied),
    })
}

/// Creates the database named in `database_url` if it is missing
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}
