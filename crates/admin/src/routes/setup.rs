//! First-run setup routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::{HealthReport, SeedOutcome, setup};
use crate::state::AppState;

/// `POST /api/setup/seed`
///
/// 201 when the sample catalog was inserted, 200 when products already exist.
pub async fn seed(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SeedOutcome>)> {
    let outcome = setup::seed(state.client()).await?;
    let status = match outcome {
        SeedOutcome::Seeded { .. } => StatusCode::CREATED,
        SeedOutcome::AlreadyPresent => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

/// `GET /api/setup/check`
///
/// 503 unless the store answers and every table is readable.
pub async fn check(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthReport>) {
    let report = setup::check(state.client()).await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// Build the setup router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/seed", post(seed))
        .route("/check", get(check))
}
