//! Store connectivity check.

use sqlx::PgPool;

use minimart_admin::services::setup;
use minimart_backend::PgClient;

use super::CliError;

/// Ping the store and try reading each table.
///
/// # Errors
///
/// Returns `Unhealthy` if the store is unreachable or any table is unreadable.
pub async fn run(pool: PgPool) -> Result<(), CliError> {
    let report = setup::check(&PgClient::new(pool)).await;

    tracing::info!(
        connected = report.connected,
        latency_ms = report.latency_ms,
        "Store ping"
    );
    for table in &report.tables {
        if table.accessible {
            tracing::info!(table = table.table, "Table readable");
        } else {
            tracing::error!(
                table = table.table,
                error = table.error.as_deref().unwrap_or("unknown"),
                "Table not readable"
            );
        }
    }

    if report.is_healthy() {
        Ok(())
    } else {
        Err(CliError::Unhealthy)
    }
}
