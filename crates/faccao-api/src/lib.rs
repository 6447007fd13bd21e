//! # faccao-api - Axum API Service
//!
//! HTTP surface for the brand/supplier order workflow, built on
//! Axum/Tower/Tokio. Route handlers resolve the caller and delegate every
//! lifecycle decision to `faccao-state`.
//!
//! ## Routes
//!
//! - `/v1/companies/*` - onboarding with CNPJ validation
//! - `/v1/documents/cnpj/validate` - stateless CNPJ check
//! - `/v1/orders/*` - orders, transition evaluation, status changes, rework
//! - `/openapi.json` - generated OpenAPI document
//! - `/health/*`, `/metrics` - health checks and Prometheus scrape (unauthenticated)
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → MetricsLayer → AuthLayer
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;

/// Assemble the application router with all routes and middleware.
///
/// Health checks and `/metrics` are mounted outside the auth middleware so
/// orchestrators and scrapers need no credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::companies::router())
        .merge(routes::documents::router())
        .merge(routes::orders::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(middleware::metrics::render))
        .with_state(state);

    Router::new().merge(ops).merge(api)
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}
