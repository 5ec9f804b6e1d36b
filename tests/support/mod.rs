//! Shared fixtures: a canned in-memory cluster and resource builders.

// not every builder is used by every test binary
#![allow(dead_code)]

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateWaiting, ContainerStatus, Endpoints, Namespace, Node,
    NodeCondition, NodeStatus, Pod, PodStatus, Service,
};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::ObjectMeta;

use kube_sentry::cluster::{ClusterOps, ClusterVersion, NodeUsage};
use kube_sentry::error::{DiagnosticError, DiagnosticResult};

/// In-memory `ClusterOps` backed by canned listings
#[derive(Default)]
pub struct FakeCluster {
    pub nodes: Vec<Node>,
    pub pods: Vec<Pod>,
    pub namespaces: Vec<Namespace>,
    pub services: Vec<Service>,
    pub deployments: Vec<Deployment>,
    pub endpoints: Vec<Endpoints>,
    pub network_policies: Vec<NetworkPolicy>,

    /// `None` simulates a cluster without metrics-server
    pub metrics: Option<Vec<NodeUsage>>,

    /// When set, node and metrics listings fail with this message
    pub fail_nodes: Option<String>,
    pub fail_metrics: Option<String>,
}

fn filter_ns<T: Clone>(items: &[T], namespace: Option<&str>, ns_of: impl Fn(&T) -> Option<String>) -> Vec<T> {
    match namespace {
        None => items.to_vec(),
        Some(ns) => items
            .iter()
            .filter(|item| ns_of(item).as_deref() == Some(ns))
            .cloned()
            .collect(),
    }
}

#[async_trait]
impl ClusterOps for FakeCluster {
    async fn version(&self) -> DiagnosticResult<ClusterVersion> {
        Ok(ClusterVersion {
            git_version: "v1.31.2".to_string(),
            platform: "linux/amd64".to_string(),
        })
    }

    async fn list_nodes(&self) -> DiagnosticResult<Vec<Node>> {
        if let Some(message) = &self.fail_nodes {
            return Err(DiagnosticError::unreachable(message.clone()));
        }
        Ok(self.nodes.clone())
    }

    async fn list_pods(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Pod>> {
        Ok(filter_ns(&self.pods, namespace, |p| {
            p.metadata.namespace.clone()
        }))
    }

    async fn list_namespaces(&self) -> DiagnosticResult<Vec<Namespace>> {
        Ok(self.namespaces.clone())
    }

    async fn list_services(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Service>> {
        Ok(filter_ns(&self.services, namespace, |s| {
            s.metadata.namespace.clone()
        }))
    }

    async fn list_deployments(&self) -> DiagnosticResult<Vec<Deployment>> {
        Ok(self.deployments.clone())
    }

    async fn list_endpoints(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Endpoints>> {
        Ok(filter_ns(&self.endpoints, namespace, |e| {
            e.metadata.namespace.clone()
        }))
    }

    async fn list_network_policies(
        &self,
        namespace: Option<&str>,
    ) -> DiagnosticResult<Vec<NetworkPolicy>> {
        Ok(filter_ns(&self.network_policies, namespace, |p| {
            p.metadata.namespace.clone()
        }))
    }

    async fn node_metrics(&self) -> DiagnosticResult<Option<Vec<NodeUsage>>> {
        if let Some(message) = &self.fail_metrics {
            return Err(DiagnosticError::unreachable(message.clone()));
        }
        Ok(self.metrics.clone())
    }
}

// ============================================================================
// Resource builders
// ============================================================================

pub fn node(name: &str, ready: bool, pressures: &[&str]) -> Node {
    let mut conditions = vec![NodeCondition {
        type_: "Ready".to_string(),
        status: if ready { "True" } else { "False" }.to_string(),
        ..Default::default()
    }];
    for pressure in pressures {
        conditions.push(NodeCondition {
            type_: pressure.to_string(),
            status: "True".to_string(),
            ..Default::default()
        });
    }
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        status: Some(NodeStatus {
            conditions: Some(conditions),
            allocatable: Some(
                [
                    ("cpu".to_string(), Quantity("4".to_string())),
                    ("memory".to_string(), Quantity("8Gi".to_string())),
                    ("pods".to_string(), Quantity("110".to_string())),
                ]
                .into(),
            ),
            capacity: Some(
                [
                    ("cpu".to_string(), Quantity("4".to_string())),
                    ("memory".to_string(), Quantity("8Gi".to_string())),
                ]
                .into(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn pod(namespace: &str, name: &str, phase: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn running_pod(namespace: &str, name: &str, restarts: i32, waiting: Option<&str>) -> Pod {
    let mut p = pod(namespace, name, "Running");
    p.status.as_mut().unwrap().container_statuses = Some(vec![ContainerStatus {
        name: "app".to_string(),
        ready: waiting.is_none(),
        restart_count: restarts,
        state: waiting.map(|reason| ContainerState {
            waiting: Some(ContainerStateWaiting {
                reason: Some(reason.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }]);
    p
}

pub fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn usage(name: &str, cpu: &str, memory: &str) -> NodeUsage {
    NodeUsage {
        name: name.to_string(),
        cpu: cpu.to_string(),
        memory: memory.to_string(),
    }
}
