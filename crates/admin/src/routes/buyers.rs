//! Buyer routes. Listing and detail include derived order statistics.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use minimart_backend::Buyer;
use minimart_core::BuyerId;

use super::crud;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::{BuyerDetail, buyers};
use crate::state::AppState;

/// `GET /api/buyers`
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<BuyerDetail>>> {
    Ok(Json(buyers::list_with_stats(state.client()).await?))
}

/// `GET /api/buyers/{id}`
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BuyerId>,
) -> Result<Json<BuyerDetail>> {
    Ok(Json(buyers::detail(state.client(), id).await?))
}

/// Build the buyers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(crud::create::<Buyer>))
        .route(
            "/{id}",
            get(show)
                .put(crud::update::<Buyer>)
                .delete(crud::remove::<Buyer>),
        )
}
