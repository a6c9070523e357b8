//! Field normalisation: turns typed API objects into flat records where every
//! field used by the mappers has a deterministic default.
//!
//! Missing names, addresses and counts become `""` / `0`. Missing timestamps
//! stay `None` so the mapper can skip the series instead of exporting zero.
//! The only hard failures are missing identity fields, reported as
//! [`CollectError::Shape`] so the caller can skip that object alone.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::CollectError;
use crate::parsing::time_to_epoch;
use crate::types::*;

const DEFAULT_POD_PHASE: &str = "Unknown";
const DEFAULT_SERVICE_TYPE: &str = "ClusterIP";
const DEFAULT_NAMESPACE_PHASE: &str = "Active";

/// Decodes one raw list item, so a malformed object fails alone.
pub fn decode<K: DeserializeOwned>(kind: ResourceKind, raw: Value) -> Result<K, CollectError> {
    let object = describe_raw(&raw);
    serde_json::from_value(raw).map_err(|e| CollectError::Shape {
        kind,
        object,
        reason: e.to_string(),
    })
}

fn describe_raw(raw: &Value) -> String {
    let meta = &raw["metadata"];
    match (meta["namespace"].as_str(), meta["name"].as_str()) {
        (Some(ns), Some(name)) => format!("{}/{}", ns, name),
        (None, Some(name)) => name.to_string(),
        _ => "<unnamed>".to_string(),
    }
}

fn object_name(kind: ResourceKind, meta: &ObjectMeta) -> Result<String, CollectError> {
    match meta.name.as_deref() {
        Some(n) if !n.is_empty() => Ok(n.to_string()),
        _ => Err(CollectError::Shape {
            kind,
            object: meta.uid.clone().unwrap_or_else(|| "<unnamed>".to_string()),
            reason: "metadata.name is missing".to_string(),
        }),
    }
}

fn namespaced_identity(kind: ResourceKind, meta: &ObjectMeta) -> Result<(String, String), CollectError> {
    let name = object_name(kind, meta)?;
    match meta.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => Ok((ns.to_string(), name)),
        _ => Err(CollectError::Shape {
            kind,
            object: name,
            reason: "metadata.namespace is missing".to_string(),
        }),
    }
}

pub fn normalize_pod(pod: &Pod) -> Result<PodRecord, CollectError> {
    let (namespace, name) = namespaced_identity(ResourceKind::Pod, &pod.metadata)?;
    let status = pod.status.as_ref();

    let ready_transition = status
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| {
            conditions
                .iter()
                .find(|c| c.type_ == "Ready" && c.last_transition_time.is_some())
                .and_then(|c| time_to_epoch(c.last_transition_time.as_ref()))
        });

    let containers = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| {
            statuses
                .iter()
                .map(|cs| ContainerRecord {
                    name: cs.name.clone(),
                    ready: cs.ready,
                    restart_count: cs.restart_count,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(PodRecord {
        namespace,
        name,
        uid: pod.metadata.uid.clone().unwrap_or_default(),
        node: pod
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .unwrap_or_default(),
        pod_ip: status.and_then(|s| s.pod_ip.clone()).unwrap_or_default(),
        phase: status
            .and_then(|s| s.phase.clone())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_POD_PHASE.to_string()),
        app_label: pod
            .metadata
            .labels
            .as_ref()
            .and_then(|l| l.get("app").cloned())
            .unwrap_or_default(),
        start_time: time_to_epoch(status.and_then(|s| s.start_time.as_ref())),
        created: time_to_epoch(pod.metadata.creation_timestamp.as_ref()),
        ready_transition,
        containers,
    })
}

pub fn normalize_deployment(deployment: &Deployment) -> Result<DeploymentRecord, CollectError> {
    let (namespace, name) = namespaced_identity(ResourceKind::Deployment, &deployment.metadata)?;
    let status = deployment.status.as_ref();

    Ok(DeploymentRecord {
        namespace,
        name,
        spec_replicas: deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0),
        replicas: status.and_then(|s| s.replicas).unwrap_or(0),
        available_replicas: status.and_then(|s| s.available_replicas).unwrap_or(0),
    })
}

pub fn normalize_node(node: &Node) -> Result<NodeRecord, CollectError> {
    let name = object_name(ResourceKind::Node, &node.metadata)?;
    let status = node.status.as_ref();
    let info = status.and_then(|s| s.node_info.as_ref());

    let conditions = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .map(|c| NodeConditionRecord {
                    type_: c.type_.clone(),
                    status: c.status.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(NodeRecord {
        name,
        kernel_version: info.map(|i| i.kernel_version.clone()).unwrap_or_default(),
        os_image: info.map(|i| i.os_image.clone()).unwrap_or_default(),
        container_runtime_version: info
            .map(|i| i.container_runtime_version.clone())
            .unwrap_or_default(),
        conditions,
    })
}

pub fn normalize_cronjob(cronjob: &CronJob) -> Result<CronJobRecord, CollectError> {
    let (namespace, name) = namespaced_identity(ResourceKind::CronJob, &cronjob.metadata)?;
    let spec = cronjob.spec.as_ref();
    let status = cronjob.status.as_ref();

    Ok(CronJobRecord {
        namespace,
        name,
        schedule: spec.map(|s| s.schedule.clone()).unwrap_or_default(),
        suspend: spec.and_then(|s| s.suspend).unwrap_or(false),
        active_jobs: status
            .and_then(|s| s.active.as_ref())
            .map(|a| a.len())
            .unwrap_or(0),
        last_schedule_time: time_to_epoch(status.and_then(|s| s.last_schedule_time.as_ref())),
    })
}

pub fn normalize_service(service: &Service) -> Result<ServiceRecord, CollectError> {
    let (namespace, name) = namespaced_identity(ResourceKind::Service, &service.metadata)?;
    let spec = service.spec.as_ref();

    Ok(ServiceRecord {
        namespace,
        name,
        cluster_ip: spec.and_then(|s| s.cluster_ip.clone()).unwrap_or_default(),
        type_: spec
            .and_then(|s| s.type_.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string()),
    })
}

pub fn normalize_namespace(namespace: &Namespace) -> Result<NamespaceRecord, CollectError> {
    let name = object_name(ResourceKind::Namespace, &namespace.metadata)?;

    Ok(NamespaceRecord {
        name,
        phase: namespace
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE_PHASE.to_string()),
        created: time_to_epoch(namespace.metadata.creation_timestamp.as_ref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use k8s_openapi::api::apps::v1::DeploymentSpec;
    use k8s_openapi::api::batch::v1::{CronJobSpec, CronJobStatus};
    use k8s_openapi::api::core::v1::{
        ContainerStatus, NodeStatus, NodeSystemInfo, ObjectReference, PodCondition, PodSpec,
        PodStatus, ServiceSpec,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use std::collections::BTreeMap;

    fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: namespace.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_rejects_wrong_field_type() {
        let raw = serde_json::json!({
            "metadata": {"name": "web-1", "namespace": "default"},
            "status": {"containerStatuses": "not-a-list"}
        });
        match decode::<Pod>(ResourceKind::Pod, raw) {
            Err(CollectError::Shape { object, .. }) => assert_eq!(object, "default/web-1"),
            other => panic!("expected shape error, got {:?}", other),
        }

        let raw = serde_json::json!({
            "metadata": {"name": "web-1", "namespace": "default"},
            "status": {"phase": "Running"}
        });
        let pod: Pod = decode(ResourceKind::Pod, raw).unwrap();
        assert_eq!(normalize_pod(&pod).unwrap().phase, "Running");
    }

    #[test]
    fn test_normalize_bare_pod_uses_defaults() {
        let pod = Pod {
            metadata: meta(Some("default"), "web-1"),
            ..Default::default()
        };

        let record = normalize_pod(&pod).unwrap();
        assert_eq!(record.namespace, "default");
        assert_eq!(record.name, "web-1");
        assert_eq!(record.uid, "");
        assert_eq!(record.node, "");
        assert_eq!(record.pod_ip, "");
        assert_eq!(record.phase, "Unknown");
        assert_eq!(record.app_label, "");
        assert_eq!(record.start_time, None);
        assert_eq!(record.created, None);
        assert_eq!(record.ready_transition, None);
        assert!(record.containers.is_empty());
    }

    #[test]
    fn test_normalize_full_pod() {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "frontend".to_string());

        let pod = Pod {
            metadata: ObjectMeta {
                uid: Some("uid-1".to_string()),
                labels: Some(labels),
                creation_timestamp: Some(Time(Utc.timestamp_opt(900, 0).unwrap())),
                ..meta(Some("shop"), "web-2")
            },
            spec: Some(PodSpec {
                node_name: Some("node-a".to_string()),
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some("Succeeded".to_string()),
                pod_ip: Some("10.0.0.7".to_string()),
                start_time: Some(Time(Utc.timestamp_opt(1000, 0).unwrap())),
                conditions: Some(vec![
                    PodCondition {
                        type_: "Initialized".to_string(),
                        status: "True".to_string(),
                        last_transition_time: Some(Time(Utc.timestamp_opt(1001, 0).unwrap())),
                        ..Default::default()
                    },
                    PodCondition {
                        type_: "Ready".to_string(),
                        status: "False".to_string(),
                        ..Default::default()
                    },
                    PodCondition {
                        type_: "Ready".to_string(),
                        status: "False".to_string(),
                        last_transition_time: Some(Time(Utc.timestamp_opt(1200, 0).unwrap())),
                        ..Default::default()
                    },
                    PodCondition {
                        type_: "Ready".to_string(),
                        status: "True".to_string(),
                        last_transition_time: Some(Time(Utc.timestamp_opt(1100, 0).unwrap())),
                        ..Default::default()
                    },
                ]),
                container_statuses: Some(vec![ContainerStatus {
                    name: "app".to_string(),
                    ready: false,
                    restart_count: 3,
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        };

        let record = normalize_pod(&pod).unwrap();
        assert_eq!(record.uid, "uid-1");
        assert_eq!(record.node, "node-a");
        assert_eq!(record.pod_ip, "10.0.0.7");
        assert_eq!(record.phase, "Succeeded");
        assert_eq!(record.app_label, "frontend");
        assert_eq!(record.start_time, Some(1000.0));
        assert_eq!(record.created, Some(900.0));
        // first Ready condition with a timestamp, in source order
        assert_eq!(record.ready_transition, Some(1200.0));
        assert_eq!(
            record.containers,
            vec![ContainerRecord {
                name: "app".to_string(),
                ready: false,
                restart_count: 3
            }]
        );
    }

    #[test]
    fn test_missing_identity_is_shape_error() {
        let pod = Pod {
            metadata: ObjectMeta {
                uid: Some("abc".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        match normalize_pod(&pod) {
            Err(CollectError::Shape { kind, object, .. }) => {
                assert_eq!(kind, ResourceKind::Pod);
                assert_eq!(object, "abc");
            }
            other => panic!("expected shape error, got {:?}", other),
        }

        let deployment = Deployment {
            metadata: meta(None, "api"),
            ..Default::default()
        };
        assert!(matches!(
            normalize_deployment(&deployment),
            Err(CollectError::Shape { kind: ResourceKind::Deployment, .. })
        ));

        // cluster-scoped kinds only need a name
        let node = Node {
            metadata: meta(None, "node-a"),
            ..Default::default()
        };
        assert!(normalize_node(&node).is_ok());
    }

    #[test]
    fn test_normalize_deployment_defaults_to_zero() {
        let deployment = Deployment {
            metadata: meta(Some("default"), "api"),
            spec: Some(DeploymentSpec {
                replicas: Some(3),
                ..Default::default()
            }),
            status: None,
        };

        let record = normalize_deployment(&deployment).unwrap();
        assert_eq!(record.spec_replicas, 3);
        assert_eq!(record.replicas, 0);
        assert_eq!(record.available_replicas, 0);
    }

    #[test]
    fn test_normalize_node_without_info() {
        let node = Node {
            metadata: meta(None, "node-a"),
            status: Some(NodeStatus::default()),
            ..Default::default()
        };
        let record = normalize_node(&node).unwrap();
        assert_eq!(record.kernel_version, "");
        assert_eq!(record.os_image, "");
        assert_eq!(record.container_runtime_version, "");
        assert!(record.conditions.is_empty());

        let node = Node {
            metadata: meta(None, "node-b"),
            status: Some(NodeStatus {
                node_info: Some(NodeSystemInfo {
                    kernel_version: "6.1.0".to_string(),
                    os_image: "Debian 12".to_string(),
                    container_runtime_version: "containerd://1.7.2".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = normalize_node(&node).unwrap();
        assert_eq!(record.kernel_version, "6.1.0");
        assert_eq!(record.os_image, "Debian 12");
        assert_eq!(record.container_runtime_version, "containerd://1.7.2");
    }

    #[test]
    fn test_normalize_cronjob() {
        let cronjob = CronJob {
            metadata: meta(Some("ops"), "backup"),
            spec: Some(CronJobSpec {
                schedule: "*/10 * * * *".to_string(),
                suspend: Some(true),
                ..Default::default()
            }),
            status: Some(CronJobStatus {
                active: Some(vec![ObjectReference::default(), ObjectReference::default()]),
                last_schedule_time: Some(Time(Utc.timestamp_opt(1000, 0).unwrap())),
                ..Default::default()
            }),
        };
        let record = normalize_cronjob(&cronjob).unwrap();
        assert_eq!(record.schedule, "*/10 * * * *");
        assert!(record.suspend);
        assert_eq!(record.active_jobs, 2);
        assert_eq!(record.last_schedule_time, Some(1000.0));

        let bare = CronJob {
            metadata: meta(Some("ops"), "idle"),
            ..Default::default()
        };
        let record = normalize_cronjob(&bare).unwrap();
        assert_eq!(record.schedule, "");
        assert!(!record.suspend);
        assert_eq!(record.active_jobs, 0);
        assert_eq!(record.last_schedule_time, None);
    }

    #[test]
    fn test_normalize_service_and_namespace_defaults() {
        let service = Service {
            metadata: meta(Some("default"), "kubernetes"),
            spec: Some(ServiceSpec {
                cluster_ip: Some("10.96.0.1".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = normalize_service(&service).unwrap();
        assert_eq!(record.cluster_ip, "10.96.0.1");
        assert_eq!(record.type_, "ClusterIP");

        let namespace = Namespace {
            metadata: meta(None, "default"),
            ..Default::default()
        };
        let record = normalize_namespace(&namespace).unwrap();
        assert_eq!(record.phase, "Active");
        assert_eq!(record.created, None);
    }
}
