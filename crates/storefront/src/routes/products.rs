//! Catalog route handlers.

use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use minimart_backend::{Identity, Product};
use minimart_core::ProductId;

use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::services::{CartSync, Catalog, Wishlist, catalog};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// A product as listed to a visitor, badged with their cart and wishlist.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub in_cart: bool,
    pub in_wishlist: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<ProductView>,
    pub total: usize,
}

/// What the visitor already has, for badging listings.
struct Badges {
    in_cart: HashSet<ProductId>,
    wishlist: Wishlist,
}

impl Badges {
    async fn load(state: &AppState, identity: Option<&Identity>, session: &Session) -> Self {
        let in_cart = match identity {
            Some(identity) => {
                match CartSync::open(
                    state.client().clone(),
                    state.cart_locks().clone(),
                    Some(identity),
                )
                .await
                {
                    Ok(sync) => sync.cart().product_ids(),
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not load cart for listing badges");
                        HashSet::new()
                    }
                }
            }
            None => HashSet::new(),
        };
        let wishlist = Wishlist::load(session).await.unwrap_or_default();
        Self { in_cart, wishlist }
    }

    fn view(&self, product: &Product) -> ProductView {
        ProductView {
            in_cart: self.in_cart.contains(&product.id),
            in_wishlist: self.wishlist.contains(product.id),
            product: product.clone(),
        }
    }
}

/// `GET /api/products?q=`
#[instrument(skip(state, identity, session))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    session: Session,
    Query(search): Query<SearchQuery>,
) -> Result<Json<ProductList>> {
    let products = Catalog::new(state.client().as_ref()).fetch_all().await?;
    let filtered = catalog::filter(&products, &search.q);
    let badges = Badges::load(&state, identity.as_ref(), &session).await;

    Ok(Json(ProductList {
        total: filtered.len(),
        products: filtered.iter().map(|p| badges.view(p)).collect(),
    }))
}

/// `GET /api/products/featured`
#[instrument(skip(state, identity, session))]
pub async fn featured(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    session: Session,
) -> Result<Json<ProductList>> {
    let products = Catalog::new(state.client().as_ref()).fetch_all().await?;
    let featured = catalog::featured(&products);
    let badges = Badges::load(&state, identity.as_ref(), &session).await;

    Ok(Json(ProductList {
        total: featured.len(),
        products: featured.into_iter().map(|p| badges.view(p)).collect(),
    }))
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = Catalog::new(state.client().as_ref()).get(id).await?;
    Ok(Json(product))
}
