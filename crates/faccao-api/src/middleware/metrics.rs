//! # Prometheus Metrics
//!
//! Request counters recorded through the `metrics` facade. A
//! `metrics-exporter-prometheus` recorder, when installed by the binary,
//! collects them and renders the text exposition at `/metrics`. Without a
//! recorder the macros are no-ops.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use faccao_core::Party;
use faccao_state::OrderStatus;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Total HTTP requests, labelled by method, matched route and status.
pub const HTTP_REQUESTS_TOTAL: &str = "faccao_http_requests_total";
/// Request latency histogram, labelled by method and matched route.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "faccao_http_request_duration_seconds";
/// Applied order transitions, labelled by source and target status.
pub const ORDER_TRANSITIONS_TOTAL: &str = "faccao_order_transitions_total";
/// Derived rework orders.
pub const REWORK_ORDERS_TOTAL: &str = "faccao_rework_orders_total";

/// Install the global Prometheus recorder and return its render handle.
///
/// # Errors
///
/// Fails when a global recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Count an applied transition.
pub fn record_transition(from: OrderStatus, to: OrderStatus) {
    ::metrics::counter!(
        ORDER_TRANSITIONS_TOTAL,
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

/// Count a derived rework order.
pub fn record_rework(requested_by: Party) {
    ::metrics::counter!(REWORK_ORDERS_TOTAL, "party" => requested_by.as_str()).increment(1);
}

/// Middleware recording request count and latency.
///
/// Labels use the matched route template (`/v1/orders/{id}`) rather than
/// the raw path to keep cardinality bounded.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    ::metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    ::metrics::histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// GET /metrics - Prometheus text exposition.
pub async fn render(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
