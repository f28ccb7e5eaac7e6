//! Database migration command.
//!
//! Migrations live in `crates/backend/migrations/` and are embedded at
//! compile time.

use sqlx::PgPool;

use super::CliError;

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `Migration` if a migration fails to apply.
pub async fn run(pool: &PgPool) -> Result<(), CliError> {
    tracing::info!("Running migrations...");
    sqlx::migrate!("../backend/migrations").run(pool).await?;
    tracing::info!("Migrations complete!");
    Ok(())
}
