//! Cluster access adapter.
//!
//! `ClusterOps` is the read-only query surface the evaluators and the
//! aggregator run against; `KubeCluster` implements it over an
//! authenticated `kube::Client`. No business logic lives here — just
//! typed listings, error mapping, and the per-query timeout.
//!
//! The metrics API is an optional capability: a 404 from
//! `metrics.k8s.io` means metrics-server is not installed, which is an
//! expected condition reported as `None`, never an error.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Endpoints, Namespace, Node, Pod, Service};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use kube::api::{Api, ApiResource, DynamicObject, ListParams};
use kube::core::GroupVersionKind;
use kube::Client;
use tracing::{debug, warn};

use crate::error::{DiagnosticError, DiagnosticResult};

/// API server version info
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterVersion {
    pub git_version: String,
    pub platform: String,
}

/// One node's raw usage sample from the metrics API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeUsage {
    pub name: String,

    /// CPU quantity string as reported (e.g. "1528731n")
    pub cpu: String,

    /// Memory quantity string as reported (e.g. "7903344Ki")
    pub memory: String,
}

/// Read-only query surface over the cluster API.
///
/// Implementations must be safe for concurrent reads; no method
/// mutates cluster state.
#[async_trait]
pub trait ClusterOps: Send + Sync {
    async fn version(&self) -> DiagnosticResult<ClusterVersion>;

    async fn list_nodes(&self) -> DiagnosticResult<Vec<Node>>;

    /// List pods in one namespace, or across all when `namespace` is `None`
    async fn list_pods(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Pod>>;

    async fn list_namespaces(&self) -> DiagnosticResult<Vec<Namespace>>;

    async fn list_services(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Service>>;

    async fn list_deployments(&self) -> DiagnosticResult<Vec<Deployment>>;

    async fn list_endpoints(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Endpoints>>;

    async fn list_network_policies(
        &self,
        namespace: Option<&str>,
    ) -> DiagnosticResult<Vec<NetworkPolicy>>;

    /// Per-node usage samples, or `None` when no metrics provider is
    /// installed in the cluster
    async fn node_metrics(&self) -> DiagnosticResult<Option<Vec<NodeUsage>>>;
}

/// `ClusterOps` over a live `kube::Client`
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    query_timeout: Duration,
}

impl KubeCluster {
    /// Connect using the standard credential fallback: in-cluster
    /// service account first, then local kubeconfig.
    pub async fn connect(query_timeout: Duration) -> DiagnosticResult<Self> {
        let client = Client::try_default().await.map_err(|e| {
            DiagnosticError::unreachable(format!("failed to build cluster client: {}", e))
        })?;
        debug!(namespace = %client.default_namespace(), "cluster client ready");
        Ok(Self {
            client,
            query_timeout,
        })
    }

    pub fn with_client(client: Client, query_timeout: Duration) -> Self {
        Self {
            client,
            query_timeout,
        }
    }

    /// Run one cluster query under the per-query timeout
    async fn guarded<T, F>(&self, fut: F) -> DiagnosticResult<T>
    where
        F: Future<Output = Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(map_kube_error(err)),
            Err(_) => Err(DiagnosticError::timeout(self.query_timeout)),
        }
    }

    async fn list_all<K>(&self) -> DiagnosticResult<Vec<K>>
    where
        K: kube::Resource<Scope = k8s_openapi::ClusterResourceScope>
            + Clone
            + serde::de::DeserializeOwned
            + std::fmt::Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let list = self.guarded(api.list(&ListParams::default())).await?;
        Ok(list.items)
    }

    async fn list_scoped<K>(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<K>>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + serde::de::DeserializeOwned
            + std::fmt::Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let list = self.guarded(api.list(&ListParams::default())).await?;
        Ok(list.items)
    }
}

#[async_trait]
impl ClusterOps for KubeCluster {
    async fn version(&self) -> DiagnosticResult<ClusterVersion> {
        let info = self.guarded(self.client.apiserver_version()).await?;
        Ok(ClusterVersion {
            git_version: info.git_version,
            platform: info.platform,
        })
    }

    async fn list_nodes(&self) -> DiagnosticResult<Vec<Node>> {
        self.list_all().await
    }

    async fn list_pods(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Pod>> {
        self.list_scoped(namespace).await
    }

    async fn list_namespaces(&self) -> DiagnosticResult<Vec<Namespace>> {
        self.list_all().await
    }

    async fn list_services(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Service>> {
        self.list_scoped(namespace).await
    }

    async fn list_deployments(&self) -> DiagnosticResult<Vec<Deployment>> {
        self.list_scoped(None).await
    }

    async fn list_endpoints(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Endpoints>> {
        self.list_scoped(namespace).await
    }

    async fn list_network_policies(
        &self,
        namespace: Option<&str>,
    ) -> DiagnosticResult<Vec<NetworkPolicy>> {
        self.list_scoped(namespace).await
    }

    async fn node_metrics(&self) -> DiagnosticResult<Option<Vec<NodeUsage>>> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "NodeMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "nodes");
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        let params = ListParams::default();
        let listed = tokio::time::timeout(self.query_timeout, api.list(&params));
        match listed.await {
            Err(_) => Err(DiagnosticError::timeout(self.query_timeout)),
            Ok(Err(kube::Error::Api(resp))) if resp.code == 404 => {
                warn!("metrics.k8s.io not served; resource usage will be reported unavailable");
                Ok(None)
            }
            Ok(Err(err)) => Err(map_kube_error(err)),
            Ok(Ok(list)) => {
                let samples = list
                    .items
                    .into_iter()
                    .filter_map(|obj| {
                        let name = obj.metadata.name.clone()?;
                        let usage = obj.data.get("usage")?;
                        Some(NodeUsage {
                            name,
                            cpu: usage.get("cpu")?.as_str()?.to_string(),
                            memory: usage.get("memory")?.as_str()?.to_string(),
                        })
                    })
                    .collect();
                Ok(Some(samples))
            }
        }
    }
}

/// Map a kube client error onto a diagnostic error kind
fn map_kube_error(err: kube::Error) -> DiagnosticError {
    match err {
        kube::Error::Api(resp) if resp.code == 401 || resp.code == 403 => {
            DiagnosticError::unauthorized(resp.message)
        }
        kube::Error::Auth(inner) => DiagnosticError::unauthorized(inner.to_string()),
        other => DiagnosticError::unreachable(other.to_string()),
    }
}
