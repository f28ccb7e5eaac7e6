//! Wishlist route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use minimart_core::ProductId;

use crate::error::Result;
use crate::services::{Catalog, Wishlist};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleWishlist {
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct Toggled {
    pub product_id: ProductId,
    pub wishlisted: bool,
    pub wishlist: Wishlist,
}

/// `GET /api/wishlist`
pub async fn show(session: Session) -> Result<Json<Wishlist>> {
    Ok(Json(Wishlist::load(&session).await?))
}

/// `POST /api/wishlist/toggle`
///
/// Only existing products can be added; removing always works.
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ToggleWishlist>,
) -> Result<Json<Toggled>> {
    let mut wishlist = Wishlist::load(&session).await?;
    if !wishlist.contains(body.product_id) {
        Catalog::new(state.client().as_ref())
            .get(body.product_id)
            .await?;
    }

    let wishlisted = wishlist.toggle(body.product_id);
    wishlist.save(&session).await?;

    Ok(Json(Toggled {
        product_id: body.product_id,
        wishlisted,
        wishlist,
    }))
}
