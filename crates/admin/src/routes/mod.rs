//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (pings the data store)
//!
//! # Auth (login rate limited)
//! POST /api/auth/login                - Sign in (admin role required)
//! POST /api/auth/logout               - Sign out
//! GET  /api/auth/me                   - Current admin
//!
//! # CRUD (admin only; DELETE needs ?confirm=true)
//! GET|POST        /api/products
//! GET|PUT|DELETE  /api/products/{id}
//! GET|POST        /api/buyers         - Listing includes order stats
//! GET|PUT|DELETE  /api/buyers/{id}
//! GET|POST        /api/transactions
//! GET|PUT|DELETE  /api/transactions/{id}
//! GET             /api/transactions/export - CSV download
//!
//! # Setup (admin only)
//! POST /api/setup/seed                - Insert sample products into an empty catalog
//! GET  /api/setup/check               - Store latency and table access report
//! ```

pub mod auth;
pub mod buyers;
pub mod crud;
pub mod setup;
pub mod transactions;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use minimart_backend::Product;

use crate::state::AppState;

/// Create all routes for admin.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/auth", auth::router(rate_limit))
        .nest("/api/products", crud::router::<Product>())
        .nest("/api/buyers", buyers::router())
        .nest("/api/transactions", transactions::router())
        .nest("/api/setup", setup::router())
}

/// Liveness health check.
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
