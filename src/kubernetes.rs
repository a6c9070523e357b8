use std::sync::Arc;

use async_trait::async_trait;
use http::Request as HttpRequest;
use kube::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::types::ResourceKind;

/// Lists every object of one kind across all namespaces.
///
/// Items come back undecoded so that a malformed object can be skipped on
/// its own instead of failing the whole list.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Value>, kube::Error>;
}

#[async_trait]
impl<T: SnapshotSource + ?Sized> SnapshotSource for Arc<T> {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Value>, kube::Error> {
        (**self).list(kind).await
    }
}

#[derive(Debug, Deserialize)]
struct RawList {
    #[serde(default)]
    items: Vec<Value>,
}

pub fn list_path(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Pod => "/api/v1/pods",
        ResourceKind::Deployment => "/apis/apps/v1/deployments",
        ResourceKind::Node => "/api/v1/nodes",
        ResourceKind::CronJob => "/apis/batch/v1/cronjobs",
        ResourceKind::Service => "/api/v1/services",
        ResourceKind::Namespace => "/api/v1/namespaces",
    }
}

/// Snapshot source backed by the cluster API.
#[derive(Clone)]
pub struct KubeSource {
    client: Client,
}

impl KubeSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SnapshotSource for KubeSource {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Value>, kube::Error> {
        let req = HttpRequest::builder()
            .method("GET")
            .uri(list_path(kind))
            .body(Vec::new())
            .map_err(kube::Error::HttpError)?;
        let list: RawList = self.client.request(req).await?;
        Ok(list.items)
    }
}
