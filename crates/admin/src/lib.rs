//! MiniMart Online admin library.
//!
//! Back-office JSON API: CRUD over products, buyers, and transactions, CSV
//! export, and first-run setup. Only profiles with the admin role can sign
//! in.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tower_sessions::cookie::KeyError;
use tracing::Span;

use state::AppState;

/// Build the admin router over `state`, keeping sessions in `store`.
///
/// # Errors
///
/// Returns `KeyError` if the session secret cannot be used as a signing key.
pub fn app<S>(state: AppState, store: S) -> Result<Router, KeyError>
where
    S: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(store, state.config())?;
    let rate_limit = state.config().rate_limit;

    Ok(routes::routes(rate_limit)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state))
}
