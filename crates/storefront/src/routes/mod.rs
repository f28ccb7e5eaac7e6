//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (pings the data store)
//!
//! # Products
//! GET  /api/products?q=        - Catalog listing, optionally filtered
//! GET  /api/products/featured  - Featured products
//! GET  /api/products/{id}      - Product detail
//!
//! # Cart (requires auth)
//! GET  /api/cart               - Cart lines and totals
//! POST /api/cart/add           - Add one unit of a product
//! POST /api/cart/update        - Set an entry's quantity (<= 0 removes, max 999)
//! POST /api/cart/remove        - Remove an entry
//! GET  /api/cart/count         - Item count badge (0 when signed out)
//!
//! # Auth (rate limited)
//! POST /api/auth/register      - Create account and sign in
//! POST /api/auth/login         - Sign in
//! POST /api/auth/logout        - Sign out
//! GET  /api/auth/me            - Current identity and profile
//!
//! # Wishlist (session only)
//! GET  /api/wishlist           - Wishlisted product ids
//! POST /api/wishlist/toggle    - Add or remove a product
//! ```

pub mod auth;
pub mod cart;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the auth routes router, rate limited when `rate_limit` is set.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));
    if rate_limit {
        router.layer(auth_rate_limiter())
    } else {
        router
    }
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
}

/// Create all routes for the storefront.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/auth", auth_routes(rate_limit))
        .nest("/api/wishlist", wishlist_routes())
}

/// Liveness health check. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check: 503 if the data store is unreachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.client().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
