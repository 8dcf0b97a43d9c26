//! Makrama storefront library.
//!
//! A server-rendered storefront over three upstream HTTP APIs: the shop's
//! WooCommerce instance for catalog and orders, Planet Pay for payments and
//! BLPaczka for parcel delivery. The storefront holds no database; the only
//! state it owns is the visitor's session.
//!
//! The crate is a library so the integration tests can run the exact router
//! the binary serves.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod blpaczka;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod planetpay;
pub mod routes;
pub mod services;
pub mod state;
pub mod woo;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::SecurityHeaders;
use crate::state::AppState;

/// Build the application router with the full middleware stack.
///
/// Layers, outermost first: Sentry request/transaction capture, HTTP
/// tracing, request ids, sessions, security headers. Rate limiters sit on
/// the mutating cart and checkout routes inside [`routes::routes`].
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let security_headers = SecurityHeaders::from_config(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .layer(axum::middleware::from_fn_with_state(
            security_headers,
            middleware::security_headers_middleware,
        ))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the Store API answers before returning OK. Returns 503 Service
/// Unavailable while the shop is unreachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.catalog().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
