use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::sink::MetricSink;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Read-only scrape router over the shared sink.
pub fn build_router(sink: Arc<MetricSink>) -> Router {
    Router::new()
        .route("/metrics", get(handle_metrics))
        .route("/healthz", get(handle_health))
        .with_state(sink)
}

async fn handle_metrics(State(sink): State<Arc<MetricSink>>) -> Response {
    match sink.render() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn handle_health() -> &'static str {
    "ok"
}

/// Binds the scrape port. Failure here is fatal for the process.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics port {}", port))?;
    info!(%addr, "metrics server listening");
    Ok(listener)
}

pub async fn serve(listener: TcpListener, sink: Arc<MetricSink>) -> Result<()> {
    axum::serve(listener, build_router(sink))
        .await
        .context("metrics server error")
}
