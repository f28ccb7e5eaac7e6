//! Email/password authentication routes.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use minimart_backend::{Identity, Profile};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignedIn {
    pub user: Identity,
}

#[derive(Debug, Serialize)]
pub struct Me {
    pub user: Identity,
    pub profile: Profile,
}

/// `POST /api/auth/register`
#[instrument(skip(state, session, credentials))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse> {
    let identity = state
        .auth()
        .register(&credentials.email, &credentials.password)
        .await?;
    set_current_user(&session, &identity).await?;
    set_sentry_user(&identity.id, Some(identity.email.as_str()));

    Ok((StatusCode::CREATED, Json(SignedIn { user: identity })))
}

/// `POST /api/auth/login`
#[instrument(skip(state, session, credentials))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SignedIn>> {
    let identity = match state
        .auth()
        .login(&credentials.email, &credentials.password)
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(error = %e, "Login rejected");
            return Err(e.into());
        }
    };
    set_current_user(&session, &identity).await?;
    set_sentry_user(&identity.id, Some(identity.email.as_str()));

    Ok(Json(SignedIn { user: identity }))
}

/// `POST /api/auth/logout`
///
/// Succeeds whether or not anyone was signed in.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    session: Session,
) -> Result<StatusCode> {
    if let Some(identity) = identity {
        state.auth().logout(&identity);
    }
    clear_current_user(&session).await?;
    session.flush().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
///
/// Creates the buyer profile if the background sync has not got to it yet.
#[instrument(skip_all)]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Me>> {
    let profile = state.auth().ensure_profile(&identity).await?;
    Ok(Json(Me {
        user: identity,
        profile,
    }))
}
