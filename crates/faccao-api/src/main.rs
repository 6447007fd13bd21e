//! # faccao-api - Binary Entry Point
//!
//! Reads configuration from the environment, installs the Prometheus
//! recorder and serves the API.

use anyhow::Context;
use faccao_api::middleware::metrics::install_recorder;
use faccao_api::state::{AppConfig, AppState, LogFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("reading configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    if config.auth_token.is_none() {
        tracing::warn!(
            "AUTH_TOKEN not set, callers are identified by X-Party/X-Company-Id headers"
        );
    }

    let port = config.port;
    let mut state = AppState::with_config(config);
    match install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!("metrics recorder not installed: {e}. /metrics will return 503"),
    }

    let app = faccao_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("faccao API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
