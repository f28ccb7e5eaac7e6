//! Authentication extractors.
//!
//! The signed-in identity lives in the session under
//! [`session_keys::CURRENT_USER`]. API callers without one get a JSON 401.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use minimart_backend::Identity;

use crate::models::session_keys;

/// Extractor that requires a signed-in identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireAuth(identity): RequireAuth) -> impl IntoResponse {
///     Json(identity)
/// }
/// ```
pub struct RequireAuth(pub Identity);

/// Rejection for [`RequireAuth`].
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authorization required" })),
        )
            .into_response()
    }
}

async fn current_identity(parts: &Parts) -> Option<Identity> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<Identity>(session_keys::CURRENT_USER).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read identity from session");
            None
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_identity(parts).await.map(Self).ok_or(AuthRejection)
    }
}

/// Extractor that optionally gets the signed-in identity. Never rejects.
pub struct OptionalAuth(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_identity(parts).await))
    }
}

/// Store the signed-in identity in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    identity: &Identity,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, identity).await
}

/// Remove the signed-in identity from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<Identity>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
