//! Authentication route handlers for admin.
//!
//! Admins sign in with the same email/password identity as buyers; only
//! profiles with the admin role get a session.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use minimart_backend::Identity;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    OptionalAdmin, RequireAdmin, clear_current_admin, login_rate_limiter, set_current_admin,
};
use crate::models::CurrentAdmin;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<Json<CurrentAdmin>> {
    let auth = state.auth();
    let identity = auth
        .login(&credentials.email, &credentials.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Admin login rejected"))?;

    let profile = auth.profile(identity.id).await?;
    let Some(profile) = profile.filter(|p| p.is_admin()) else {
        tracing::warn!(user_id = %identity.id, "Non-admin attempted admin login");
        auth.logout(&identity);
        return Err(AppError::Forbidden("Admin access required".to_string()));
    };

    let admin = CurrentAdmin::new(identity, &profile);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, "Admin signed in");

    Ok(Json(admin))
}

/// `POST /api/auth/logout`
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAdmin(admin): OptionalAdmin,
    session: Session,
) -> Result<StatusCode> {
    if let Some(admin) = admin {
        state.auth().logout(&Identity {
            id: admin.id,
            email: admin.email,
        });
    }
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
pub async fn me(RequireAdmin(admin): RequireAdmin) -> Json<CurrentAdmin> {
    Json(admin)
}

/// Build the auth router, rate limiting login when `rate_limit` is set.
pub fn router(rate_limit: bool) -> Router<AppState> {
    let login_route = if rate_limit {
        post(login).layer(login_rate_limiter())
    } else {
        post(login)
    };
    Router::new()
        .route("/login", login_route)
        .route("/logout", post(logout))
        .route("/me", get(me))
}
