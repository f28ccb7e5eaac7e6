//! Transaction routes: CRUD plus CSV export.

use axum::{
    Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use tracing::instrument;

use minimart_backend::Transaction;

use super::crud;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::export;
use crate::state::AppState;

/// `GET /api/transactions/export`
///
/// Every transaction as a CSV attachment named for today's date.
#[instrument(skip_all, fields(admin = %admin.email))]
pub async fn export_csv(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let csv = export::transactions_csv(state.client()).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::file_name(Utc::now().date_naive())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Build the transactions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/export", get(export_csv))
        .merge(crud::router::<Transaction>())
}
