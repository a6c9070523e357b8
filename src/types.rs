use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub collect_interval: Duration,
    pub metrics_port: u16,
    pub fetch_timeout: Option<Duration>,
    pub evict_stale_series: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collect_interval: Duration::from_secs(15),
            metrics_port: 8080,
            fetch_timeout: None,
            evict_stale_series: false,
        }
    }
}

/// Resource kinds listed on every tick, in collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pod,
    Deployment,
    Node,
    CronJob,
    Service,
    Namespace,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Pod,
        ResourceKind::Deployment,
        ResourceKind::Node,
        ResourceKind::CronJob,
        ResourceKind::Service,
        ResourceKind::Namespace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Pod => "pod",
            ResourceKind::Deployment => "deployment",
            ResourceKind::Node => "node",
            ResourceKind::CronJob => "cronjob",
            ResourceKind::Service => "service",
            ResourceKind::Namespace => "namespace",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PodRecord {
    pub namespace: String,
    pub name: String,
    pub uid: String,
    pub node: String,
    pub pod_ip: String,
    pub phase: String,
    pub app_label: String,
    pub start_time: Option<f64>,
    pub created: Option<f64>,
    /// Last transition time of the first `Ready` condition carrying one.
    pub ready_transition: Option<f64>,
    pub containers: Vec<ContainerRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    pub name: String,
    pub ready: bool,
    pub restart_count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRecord {
    pub namespace: String,
    pub name: String,
    pub spec_replicas: i32,
    pub replicas: i32,
    pub available_replicas: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub name: String,
    pub kernel_version: String,
    pub os_image: String,
    pub container_runtime_version: String,
    pub conditions: Vec<NodeConditionRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeConditionRecord {
    pub type_: String,
    /// Tri-state as reported by the API: "True", "False" or "Unknown".
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CronJobRecord {
    pub namespace: String,
    pub name: String,
    pub schedule: String,
    pub suspend: bool,
    pub active_jobs: usize,
    pub last_schedule_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    pub namespace: String,
    pub name: String,
    pub cluster_ip: String,
    pub type_: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceRecord {
    pub name: String,
    pub phase: String,
    pub created: Option<f64>,
}
