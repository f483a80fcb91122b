//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use muster_core::error::RosterError;

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), RosterError> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| RosterError::storage_with_source(format!("failed to run migrations: {e}"), e))?;

    info!("Database migrations completed successfully");
    Ok(())
}
