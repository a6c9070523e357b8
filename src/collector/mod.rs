use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::errors::CollectError;
use crate::kubernetes::SnapshotSource;
use crate::metrics;
use crate::normalize::{self, decode};
use crate::parsing::epoch_seconds;
use crate::sink::{MetricSink, Observation};
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Collecting,
}

/// Outcome of one pass over every resource kind.
#[derive(Debug, Default)]
pub struct PassReport {
    pub collected: Vec<ResourceKind>,
    pub objects: usize,
    pub errors: Vec<CollectError>,
    pub duration: Duration,
}

impl PassReport {
    pub fn failed_kinds(&self) -> Vec<ResourceKind> {
        self.errors
            .iter()
            .filter(|e| e.is_kind_failure())
            .map(|e| e.kind())
            .collect()
    }
}

/// Outcome of collecting a single kind.
#[derive(Debug)]
struct KindReport {
    kind: ResourceKind,
    objects: usize,
    errors: Vec<CollectError>,
    completed: bool,
}

/// Drives collection passes and writes results into the shared sink.
pub struct MetricsCollector<S> {
    source: S,
    sink: Arc<MetricSink>,
    config: Config,
    state: AtomicU8,
}

impl<S: SnapshotSource> MetricsCollector<S> {
    pub fn new(source: S, sink: Arc<MetricSink>, config: Config) -> Self {
        Self {
            source,
            sink,
            config,
            state: AtomicU8::new(0),
        }
    }

    pub fn state(&self) -> CycleState {
        match self.state.load(Ordering::Acquire) {
            0 => CycleState::Idle,
            _ => CycleState::Collecting,
        }
    }

    pub fn sink(&self) -> &Arc<MetricSink> {
        &self.sink
    }

    /// Runs one pass. Kinds are fetched and mapped concurrently; a failure
    /// in one kind never stops the others.
    pub async fn collect_once(&self) -> PassReport {
        self.state.store(1, Ordering::Release);
        let started = Instant::now();
        debug!("collection pass started");

        let reports = tokio::join!(
            self.collect_kind(ResourceKind::Pod),
            self.collect_kind(ResourceKind::Deployment),
            self.collect_kind(ResourceKind::Node),
            self.collect_kind(ResourceKind::CronJob),
            self.collect_kind(ResourceKind::Service),
            self.collect_kind(ResourceKind::Namespace),
        );

        let mut pass = PassReport::default();
        for report in [reports.0, reports.1, reports.2, reports.3, reports.4, reports.5] {
            if report.completed {
                pass.collected.push(report.kind);
            }
            pass.objects += report.objects;
            pass.errors.extend(report.errors);
        }
        pass.duration = started.elapsed();
        self.sink
            .record_pass(pass.duration.as_secs_f64(), epoch_seconds(&Utc::now()));

        self.state.store(0, Ordering::Release);
        pass
    }

    async fn collect_kind(&self, kind: ResourceKind) -> KindReport {
        let mut report = KindReport {
            kind,
            objects: 0,
            errors: Vec::new(),
            completed: false,
        };

        let items = match self.fetch(kind).await {
            Ok(items) => items,
            Err(e) => {
                warn!(kind = %kind, error = %e, "fetch failed, keeping previous values");
                self.sink.inc_collection_error(kind);
                self.sink.discard_kind(kind);
                report.errors.push(e);
                return report;
            }
        };

        for raw in items {
            match map_raw(kind, raw) {
                Ok(observations) => {
                    report.objects += 1;
                    for obs in &observations {
                        if let Err(e) = self.sink.record(obs) {
                            warn!(kind = %kind, error = %e, "series rejected");
                            self.sink.inc_collection_error(kind);
                            report.errors.push(e);
                        }
                    }
                }
                Err(e) => {
                    warn!(kind = %kind, error = %e, "skipping object");
                    self.sink.inc_collection_error(kind);
                    report.errors.push(e);
                }
            }
        }

        let evicted = self.sink.commit_kind(kind, self.config.evict_stale_series);
        debug!(kind = %kind, objects = report.objects, evicted, "kind collected");
        report.completed = true;
        report
    }

    async fn fetch(&self, kind: ResourceKind) -> Result<Vec<Value>, CollectError> {
        let list = self.source.list(kind);
        let result = match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, list)
                .await
                .map_err(|_| CollectError::Timeout {
                    kind,
                    timeout_ms: limit.as_millis() as u64,
                })?,
            None => list.await,
        };
        result.map_err(|source| CollectError::Fetch { kind, source })
    }
}

impl<S: SnapshotSource + 'static> MetricsCollector<S> {
    /// Collects forever: one pass, then a fixed sleep, never overlapping.
    ///
    /// Each pass runs in its own task so a panic inside it is logged and the
    /// loop continues with the next tick.
    pub async fn run(self: Arc<Self>) {
        let interval = self.config.collect_interval;
        info!(interval_secs = interval.as_secs_f64(), "starting collection loop");
        loop {
            let collector = Arc::clone(&self);
            match tokio::spawn(async move { collector.collect_once().await }).await {
                Ok(pass) => {
                    let failed = pass.failed_kinds();
                    if pass.errors.is_empty() {
                        info!(
                            objects = pass.objects,
                            elapsed_ms = pass.duration.as_millis() as u64,
                            "collection pass complete"
                        );
                    } else {
                        warn!(
                            objects = pass.objects,
                            errors = pass.errors.len(),
                            failed_kinds = ?failed,
                            elapsed_ms = pass.duration.as_millis() as u64,
                            "collection pass complete with errors"
                        );
                    }
                }
                Err(e) => {
                    self.state.store(0, Ordering::Release);
                    error!(error = %e, "collection pass aborted");
                }
            }
            tokio::time::sleep(interval).await;
        }
    }
}

/// Decodes, normalises and maps one raw object of the given kind.
pub fn map_raw(kind: ResourceKind, raw: Value) -> Result<Vec<Observation>, CollectError> {
    let observations = match kind {
        ResourceKind::Pod => metrics::map_pod(&normalize::normalize_pod(&decode(kind, raw)?)?),
        ResourceKind::Deployment => {
            metrics::map_deployment(&normalize::normalize_deployment(&decode(kind, raw)?)?)
        }
        ResourceKind::Node => metrics::map_node(&normalize::normalize_node(&decode(kind, raw)?)?),
        ResourceKind::CronJob => {
            metrics::map_cronjob(&normalize::normalize_cronjob(&decode(kind, raw)?)?)
        }
        ResourceKind::Service => {
            metrics::map_service(&normalize::normalize_service(&decode(kind, raw)?)?)
        }
        ResourceKind::Namespace => {
            metrics::map_namespace(&normalize::normalize_namespace(&decode(kind, raw)?)?)
        }
    };
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_raw_dispatches_per_kind() {
        let obs = map_raw(
            ResourceKind::Service,
            json!({
                "metadata": {"name": "db", "namespace": "shop"},
                "spec": {"clusterIP": "10.0.0.9", "type": "NodePort"}
            }),
        )
        .unwrap();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].labels, vec!["shop", "db", "10.0.0.9", "NodePort"]);

        let obs = map_raw(
            ResourceKind::Namespace,
            json!({"metadata": {"name": "kube-system"}, "status": {"phase": "Active"}}),
        )
        .unwrap();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].value, 1.0);
    }

    #[test]
    fn test_map_raw_reports_shape_errors() {
        let err = map_raw(ResourceKind::Deployment, json!({"metadata": {"name": "x"}}))
            .unwrap_err();
        assert_eq!(err.kind(), ResourceKind::Deployment);
        assert!(!err.is_kind_failure());

        let err = map_raw(
            ResourceKind::Node,
            json!({"metadata": {"name": "node-a"}, "status": {"conditions": 5}}),
        )
        .unwrap_err();
        assert!(matches!(err, CollectError::Shape { .. }));
    }
}
