//! Admin user management commands.

use std::sync::Arc;

use sqlx::PgPool;

use minimart_backend::{AuthService, PgClient};
use minimart_core::UserRole;

use super::CliError;

/// Create a user whose profile carries the admin role.
///
/// # Errors
///
/// Returns `Auth` for an invalid email, a weak password, or an email that
/// is already registered.
pub async fn create(
    pool: PgPool,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<(), CliError> {
    let auth = AuthService::new(Arc::new(PgClient::new(pool)));

    tracing::info!("Creating admin user: {email}");
    let profile = auth
        .create_user(email, password, name, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Name: {}",
        profile.id,
        profile.email,
        profile.full_name.as_deref().unwrap_or("-"),
    );
    Ok(())
}
