//! Session middleware configuration for admin.
//!
//! Stricter than the storefront: `SameSite=Strict`, 24 hour inactivity
//! expiry, and a separate table (`admin.session`).

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions::cookie::{Key, KeyError};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "minimart_admin_session";

/// Session expiry time in seconds (24 hours - stricter than storefront).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// `PostgreSQL` session store in the `admin` schema.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn postgres_store(pool: PgPool) -> Result<PostgresStore, String> {
    PostgresStore::new(pool)
        .with_schema_name("admin")?
        .with_table_name("session")
}

/// Create the session layer over `store`.
///
/// # Errors
///
/// Returns `KeyError` if the session secret is shorter than 64 bytes.
pub fn create_session_layer<S>(
    store: S,
    config: &AdminConfig,
) -> Result<SessionManagerLayer<S, SignedCookie>, KeyError>
where
    S: SessionStore + Clone,
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
