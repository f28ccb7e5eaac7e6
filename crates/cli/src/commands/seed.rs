//! Seed the catalog with the sample products.

use sqlx::PgPool;

use minimart_admin::services::{SeedOutcome, setup};
use minimart_backend::PgClient;

use super::CliError;

/// Insert the sample catalog unless products already exist.
///
/// # Errors
///
/// Returns `Repository` if a read or insert fails.
pub async fn run(pool: PgPool) -> Result<(), CliError> {
    let client = PgClient::new(pool);
    match setup::seed(&client).await? {
        SeedOutcome::Seeded { inserted } => {
            tracing::info!("Inserted {inserted} sample products");
        }
        SeedOutcome::AlreadyPresent => {
            tracing::info!("Catalog already has products; nothing to do");
        }
    }
    Ok(())
}
