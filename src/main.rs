use std::sync::Arc;

use anyhow::{Context, Result};
use kube::Client;
use tracing::info;

use kube_state_exporter::{load_config, server, KubeSource, MetricSink, MetricsCollector};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;
    info!(
        interval_secs = cfg.collect_interval.as_secs(),
        port = cfg.metrics_port,
        fetch_timeout = ?cfg.fetch_timeout,
        evict_stale_series = cfg.evict_stale_series,
        "starting kube-state-exporter"
    );

    let client = Client::try_default()
        .await
        .context("failed to load cluster credentials")?;

    let sink = Arc::new(MetricSink::new().context("failed to register metrics")?);
    let listener = server::bind(cfg.metrics_port).await?;

    let collector = Arc::new(MetricsCollector::new(
        KubeSource::new(client),
        Arc::clone(&sink),
        cfg,
    ));
    tokio::spawn(collector.run());

    server::serve(listener, sink).await
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
