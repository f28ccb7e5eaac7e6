//! Cart route handlers.
//!
//! Every handler opens the caller's cart through [`CartSync`]; anonymous
//! callers are turned away with 401 by `CartSync::open`.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use minimart_backend::Identity;
use minimart_core::{CartItemId, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::services::{Cart, CartLine, CartSummary, CartSync};
use crate::state::AppState;

/// Cart contents plus checkout totals.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLine>,
    pub summary: CartSummary,
}

impl CartResponse {
    fn new(cart: Cart, state: &AppState) -> Self {
        let summary = cart.summary(state.config().delivery_fee);
        Self {
            items: cart.lines().to_vec(),
            summary,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub entry_id: CartItemId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItem {
    pub entry_id: CartItemId,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: i64,
}

async fn open(state: &AppState, identity: Option<&Identity>) -> Result<CartSync> {
    Ok(CartSync::open(state.client().clone(), state.cart_locks().clone(), identity).await?)
}

/// `GET /api/cart`
#[instrument(skip(state, identity))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
) -> Result<Json<CartResponse>> {
    let sync = open(&state, identity.as_ref()).await?;
    Ok(Json(CartResponse::new(sync.into_cart(), &state)))
}

/// `POST /api/cart/add`
#[instrument(skip(state, identity))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartResponse>> {
    let mut sync = open(&state, identity.as_ref()).await?;
    sync.add_to_cart(body.product_id).await?;
    let product_id = body.product_id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    Ok(Json(CartResponse::new(sync.into_cart(), &state)))
}

/// `POST /api/cart/update`
#[instrument(skip(state, identity))]
pub async fn update(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartResponse>> {
    let mut sync = open(&state, identity.as_ref()).await?;
    sync.update_quantity(body.entry_id, body.quantity).await?;
    Ok(Json(CartResponse::new(sync.into_cart(), &state)))
}

/// `POST /api/cart/remove`
#[instrument(skip(state, identity))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    Json(body): Json<RemoveItem>,
) -> Result<Json<CartResponse>> {
    let mut sync = open(&state, identity.as_ref()).await?;
    sync.remove_item(body.entry_id).await?;
    Ok(Json(CartResponse::new(sync.into_cart(), &state)))
}

/// `GET /api/cart/count`
///
/// Anonymous visitors get 0 rather than a 401 so the badge can always render.
#[instrument(skip(state, identity))]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
) -> Result<Json<CartCount>> {
    let count = match identity {
        Some(identity) => open(&state, Some(&identity)).await?.cart().total_items(),
        None => 0,
    };
    Ok(Json(CartCount { count }))
}
