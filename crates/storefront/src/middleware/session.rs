//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` in production (`tower_sessions.session`) and
//! in memory under test. Cookies are signed with a key derived from
//! `STOREFRONT_SESSION_SECRET`.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, KeyError};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "minimart_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Cookie signing key from the configured secret.
///
/// # Errors
///
/// Returns `KeyError` if the secret is shorter than 64 bytes.
pub fn session_key(config: &StorefrontConfig) -> Result<Key, KeyError> {
    Key::try_from(config.session_secret.expose_secret().as_bytes())
}

/// Create the session layer over `store`.
///
/// # Errors
///
/// Returns `KeyError` if the session secret cannot be used as a signing key.
pub fn create_session_layer<S>(
    store: S,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<S, SignedCookie>, KeyError>
where
    S: SessionStore + Clone,
{
    let key = session_key(config)?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
