use thiserror::Error;

use crate::sink::Metric;
use crate::types::ResourceKind;

/// Failures surfaced by one collection pass. None of them escape a tick.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("failed to list {kind}: {source}")]
    Fetch {
        kind: ResourceKind,
        #[source]
        source: kube::Error,
    },

    #[error("listing {kind} timed out after {timeout_ms}ms")]
    Timeout { kind: ResourceKind, timeout_ms: u64 },

    #[error("skipping malformed {kind} {object}: {reason}")]
    Shape {
        kind: ResourceKind,
        object: String,
        reason: String,
    },

    #[error("metric {} rejected labels {:?}: {}", .metric.name(), .labels, .source)]
    Sink {
        metric: Metric,
        labels: Vec<String>,
        #[source]
        source: prometheus::Error,
    },
}

impl CollectError {
    pub fn kind(&self) -> ResourceKind {
        match self {
            CollectError::Fetch { kind, .. }
            | CollectError::Timeout { kind, .. }
            | CollectError::Shape { kind, .. } => *kind,
            CollectError::Sink { metric, .. } => metric.kind(),
        }
    }

    /// Whether the whole kind was skipped, as opposed to a single object.
    pub fn is_kind_failure(&self) -> bool {
        matches!(self, CollectError::Fetch { .. } | CollectError::Timeout { .. })
    }
}
