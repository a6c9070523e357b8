//! Prometheus-backed metric sink.
//!
//! One [`MetricSink`] is built at startup and shared (behind an `Arc`) by the
//! collector and the HTTP handler. Every kube_* series is a `GaugeVec` whose
//! label keys are fixed by [`Metric::labels`].

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use prometheus::{Encoder, Gauge, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::errors::CollectError;
use crate::types::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    PodInfo,
    PodStatusPhase,
    PodContainerStatusReady,
    PodContainerStatusRestarts,
    PodLabels,
    PodStartTime,
    PodCompletionTime,
    PodCreated,
    DeploymentSpecReplicas,
    DeploymentStatusReplicas,
    DeploymentStatusReplicasAvailable,
    NodeInfo,
    NodeStatusCondition,
    CronJobInfo,
    CronJobStatusActive,
    CronJobNextScheduleTime,
    CronJobStatusLastScheduleTime,
    CronJobSpecSuspend,
    ServiceInfo,
    NamespaceCreated,
    NamespaceStatusPhase,
}

impl Metric {
    pub const ALL: [Metric; 21] = [
        Metric::PodInfo,
        Metric::PodStatusPhase,
        Metric::PodContainerStatusReady,
        Metric::PodContainerStatusRestarts,
        Metric::PodLabels,
        Metric::PodStartTime,
        Metric::PodCompletionTime,
        Metric::PodCreated,
        Metric::DeploymentSpecReplicas,
        Metric::DeploymentStatusReplicas,
        Metric::DeploymentStatusReplicasAvailable,
        Metric::NodeInfo,
        Metric::NodeStatusCondition,
        Metric::CronJobInfo,
        Metric::CronJobStatusActive,
        Metric::CronJobNextScheduleTime,
        Metric::CronJobStatusLastScheduleTime,
        Metric::CronJobSpecSuspend,
        Metric::ServiceInfo,
        Metric::NamespaceCreated,
        Metric::NamespaceStatusPhase,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::PodInfo => "kube_pod_info",
            Metric::PodStatusPhase => "kube_pod_status_phase",
            Metric::PodContainerStatusReady => "kube_pod_container_status_ready",
            Metric::PodContainerStatusRestarts => "kube_pod_container_status_restarts_total",
            Metric::PodLabels => "kube_pod_labels",
            Metric::PodStartTime => "kube_pod_start_time",
            Metric::PodCompletionTime => "kube_pod_completion_time",
            Metric::PodCreated => "kube_pod_created",
            Metric::DeploymentSpecReplicas => "kube_deployment_spec_replicas",
            Metric::DeploymentStatusReplicas => "kube_deployment_status_replicas",
            Metric::DeploymentStatusReplicasAvailable => "kube_deployment_status_replicas_available",
            Metric::NodeInfo => "kube_node_info",
            Metric::NodeStatusCondition => "kube_node_status_condition",
            Metric::CronJobInfo => "kube_cronjob_info",
            Metric::CronJobStatusActive => "kube_cronjob_status_active",
            Metric::CronJobNextScheduleTime => "kube_cronjob_next_schedule_time",
            Metric::CronJobStatusLastScheduleTime => "kube_cronjob_status_last_schedule_time",
            Metric::CronJobSpecSuspend => "kube_cronjob_spec_suspend",
            Metric::ServiceInfo => "kube_service_info",
            Metric::NamespaceCreated => "kube_namespace_created",
            Metric::NamespaceStatusPhase => "kube_namespace_status_phase",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Metric::PodInfo => "Pod information",
            Metric::PodStatusPhase => "Pod phase",
            Metric::PodContainerStatusReady => "Container ready status",
            Metric::PodContainerStatusRestarts => "Container restarts",
            Metric::PodLabels => "Pod labels",
            Metric::PodStartTime => "Pod start time",
            Metric::PodCompletionTime => "Pod completion time",
            Metric::PodCreated => "Pod creation time",
            Metric::DeploymentSpecReplicas => "Desired replicas",
            Metric::DeploymentStatusReplicas => "Deployment replicas",
            Metric::DeploymentStatusReplicasAvailable => "Available replicas",
            Metric::NodeInfo => "Node information",
            Metric::NodeStatusCondition => "Node condition",
            Metric::CronJobInfo => "CronJob information",
            Metric::CronJobStatusActive => "Active jobs count",
            Metric::CronJobNextScheduleTime => "Next schedule time",
            Metric::CronJobStatusLastScheduleTime => "Last schedule time",
            Metric::CronJobSpecSuspend => "CronJob suspend status",
            Metric::ServiceInfo => "Service information",
            Metric::NamespaceCreated => "Namespace creation time",
            Metric::NamespaceStatusPhase => "Namespace phase",
        }
    }

    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Metric::PodInfo => &["namespace", "pod", "node", "pod_ip", "uid"],
            Metric::PodStatusPhase => &["namespace", "pod", "phase"],
            Metric::PodContainerStatusReady | Metric::PodContainerStatusRestarts => {
                &["namespace", "pod", "container"]
            }
            Metric::PodLabels => &["namespace", "pod", "label_app"],
            Metric::PodStartTime | Metric::PodCompletionTime | Metric::PodCreated => {
                &["namespace", "pod"]
            }
            Metric::DeploymentSpecReplicas
            | Metric::DeploymentStatusReplicas
            | Metric::DeploymentStatusReplicasAvailable => &["namespace", "deployment"],
            Metric::NodeInfo => &["node", "kernel_version", "os_image", "container_runtime_version"],
            Metric::NodeStatusCondition => &["node", "condition", "status"],
            Metric::CronJobInfo
            | Metric::CronJobStatusActive
            | Metric::CronJobNextScheduleTime
            | Metric::CronJobStatusLastScheduleTime
            | Metric::CronJobSpecSuspend => &["namespace", "cronjob"],
            Metric::ServiceInfo => &["namespace", "service", "cluster_ip", "type"],
            Metric::NamespaceCreated => &["namespace"],
            Metric::NamespaceStatusPhase => &["namespace", "phase"],
        }
    }

    pub fn kind(self) -> ResourceKind {
        match self {
            Metric::PodInfo
            | Metric::PodStatusPhase
            | Metric::PodContainerStatusReady
            | Metric::PodContainerStatusRestarts
            | Metric::PodLabels
            | Metric::PodStartTime
            | Metric::PodCompletionTime
            | Metric::PodCreated => ResourceKind::Pod,
            Metric::DeploymentSpecReplicas
            | Metric::DeploymentStatusReplicas
            | Metric::DeploymentStatusReplicasAvailable => ResourceKind::Deployment,
            Metric::NodeInfo | Metric::NodeStatusCondition => ResourceKind::Node,
            Metric::CronJobInfo
            | Metric::CronJobStatusActive
            | Metric::CronJobNextScheduleTime
            | Metric::CronJobStatusLastScheduleTime
            | Metric::CronJobSpecSuspend => ResourceKind::CronJob,
            Metric::ServiceInfo => ResourceKind::Service,
            Metric::NamespaceCreated | Metric::NamespaceStatusPhase => ResourceKind::Namespace,
        }
    }
}

/// One value destined for one labelled series.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: Metric,
    pub labels: Vec<String>,
    pub value: f64,
}

impl Observation {
    pub fn new(metric: Metric, labels: Vec<String>, value: f64) -> Self {
        Self { metric, labels, value }
    }

    /// Presence series, always exported as 1.
    pub fn info(metric: Metric, labels: Vec<String>) -> Self {
        Self::new(metric, labels, 1.0)
    }

    pub fn flag(metric: Metric, labels: Vec<String>, on: bool) -> Self {
        Self::new(metric, labels, if on { 1.0 } else { 0.0 })
    }
}

type LabelSets = HashMap<Metric, HashSet<Vec<String>>>;

pub struct MetricSink {
    registry: Registry,
    gauges: HashMap<Metric, GaugeVec>,
    collection_errors: IntCounterVec,
    last_pass_duration: Gauge,
    last_pass_timestamp: Gauge,
    /// Label sets written since the kind was last committed.
    pending: Mutex<LabelSets>,
    /// Label sets written by the last committed pass of each kind.
    live: Mutex<LabelSets>,
}

impl MetricSink {
    /// Creates and registers all metrics with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let mut gauges = HashMap::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let vec = GaugeVec::new(Opts::new(metric.name(), metric.help()), metric.labels())?;
            registry.register(Box::new(vec.clone()))?;
            gauges.insert(metric, vec);
        }

        let collection_errors = IntCounterVec::new(
            Opts::new(
                "kube_state_exporter_collection_errors_total",
                "Failed list calls and skipped objects per resource kind",
            ),
            &["kind"],
        )?;
        let last_pass_duration = Gauge::new(
            "kube_state_exporter_last_pass_duration_seconds",
            "Wall time of the last collection pass",
        )?;
        let last_pass_timestamp = Gauge::new(
            "kube_state_exporter_last_pass_timestamp_seconds",
            "Unix time at which the last collection pass finished",
        )?;
        registry.register(Box::new(collection_errors.clone()))?;
        registry.register(Box::new(last_pass_duration.clone()))?;
        registry.register(Box::new(last_pass_timestamp.clone()))?;

        Ok(Self {
            registry,
            gauges,
            collection_errors,
            last_pass_duration,
            last_pass_timestamp,
            pending: Mutex::new(HashMap::new()),
            live: Mutex::new(HashMap::new()),
        })
    }

    fn gauge(&self, metric: Metric) -> &GaugeVec {
        // every Metric is registered in new()
        &self.gauges[&metric]
    }

    /// Sets one series. Overwrites any previous value for the same labels.
    pub fn record(&self, obs: &Observation) -> Result<(), CollectError> {
        let labels: Vec<&str> = obs.labels.iter().map(String::as_str).collect();
        let gauge = self
            .gauge(obs.metric)
            .get_metric_with_label_values(&labels)
            .map_err(|source| CollectError::Sink {
                metric: obs.metric,
                labels: obs.labels.clone(),
                source,
            })?;
        gauge.set(obs.value);

        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(obs.metric)
            .or_default()
            .insert(obs.labels.clone());
        Ok(())
    }

    /// Current value of one series, if it exists.
    pub fn value(&self, metric: Metric, labels: &[&str]) -> Option<f64> {
        if labels.len() != metric.labels().len() {
            return None;
        }
        let families = self.registry.gather();
        let family = families.iter().find(|f| f.get_name() == metric.name())?;
        family
            .get_metric()
            .iter()
            .find(|m| {
                metric.labels().iter().zip(labels).all(|(key, val)| {
                    m.get_label()
                        .iter()
                        .any(|p| p.get_name() == *key && p.get_value() == *val)
                })
            })
            .map(|m| m.get_gauge().get_value())
    }

    /// Number of live series under one metric name.
    pub fn series_count(&self, metric: Metric) -> usize {
        self.registry
            .gather()
            .iter()
            .find(|family| family.get_name() == metric.name())
            .map(|family| family.get_metric().len())
            .unwrap_or(0)
    }

    /// Closes the pass for `kind`. With `evict` set, series of this kind that
    /// were live before but not written since the last commit are removed.
    /// Returns the number of evicted series.
    pub fn commit_kind(&self, kind: ResourceKind, evict: bool) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        let mut evicted = 0;
        for metric in Metric::ALL.into_iter().filter(|m| m.kind() == kind) {
            let written = pending.remove(&metric).unwrap_or_default();
            let previous = live.insert(metric, written);
            if !evict {
                continue;
            }
            let current = &live[&metric];
            for labels in previous.unwrap_or_default().difference(current) {
                let values: Vec<&str> = labels.iter().map(String::as_str).collect();
                if self.gauge(metric).remove_label_values(&values).is_ok() {
                    evicted += 1;
                }
            }
        }
        if evicted > 0 {
            debug!(kind = %kind, evicted, "removed stale series");
        }
        evicted
    }

    /// Drops label sets recorded for a kind whose pass did not complete.
    pub fn discard_kind(&self, kind: ResourceKind) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|metric, _| metric.kind() != kind);
    }

    pub fn inc_collection_error(&self, kind: ResourceKind) {
        self.collection_errors.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn collection_errors(&self, kind: ResourceKind) -> u64 {
        self.collection_errors.with_label_values(&[kind.as_str()]).get()
    }

    pub fn record_pass(&self, duration_secs: f64, finished_at: f64) {
        self.last_pass_duration.set(duration_secs);
        self.last_pass_timestamp.set(finished_at);
    }

    /// Renders every registered family in the text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
