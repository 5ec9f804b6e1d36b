//! Report aggregation.
//!
//! One method per diagnostic tool. Each method fans out the cluster
//! queries it needs with `tokio::join!`, runs the pure evaluators over
//! the results, and assembles the response type. Merge order is fixed
//! (nodes, then pods by namespace, then usage) so repeated calls
//! against an unchanged cluster produce identical reports.

use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use tracing::{debug, info, warn};

use crate::cluster::ClusterOps;
use crate::config::SentryConfig;
use crate::error::{DiagnosticError, DiagnosticResult};
use crate::evaluate;
use crate::report::{
    Category, ClusterInfo, DiagnosticReport, Finding, NamespaceSummaryReport, NetworkReport,
    NodeHealthReport, NodeUtilization, PodHealthReport, ResourceUsageReport, Severity,
    SeverityCounts,
};

/// Builds tool responses from cluster listings
pub struct Aggregator {
    cluster: Arc<dyn ClusterOps>,
    config: SentryConfig,
}

impl Aggregator {
    pub fn new(cluster: Arc<dyn ClusterOps>, config: SentryConfig) -> Self {
        Self { cluster, config }
    }

    pub async fn cluster_info(&self) -> DiagnosticResult<ClusterInfo> {
        let (version, nodes, namespaces) = tokio::join!(
            self.cluster.version(),
            self.cluster.list_nodes(),
            self.cluster.list_namespaces(),
        );
        let version = version?;
        let info = ClusterInfo {
            version: version.git_version,
            platform: version.platform,
            node_count: nodes?.len(),
            namespace_count: namespaces?.len(),
        };
        debug!(nodes = info.node_count, namespaces = info.namespace_count, "cluster info");
        Ok(info)
    }

    pub async fn node_health(&self) -> DiagnosticResult<NodeHealthReport> {
        let mut nodes = self.cluster.list_nodes().await?;
        nodes.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));

        let mut findings: Vec<Finding> =
            nodes.iter().filter_map(evaluate::node_finding).collect();
        let states = nodes.iter().map(evaluate::node_health).collect();
        crate::report::sort_by_severity(&mut findings);

        let summary = SeverityCounts::from_findings(&findings);
        Ok(NodeHealthReport {
            nodes: states,
            findings,
            summary,
        })
    }

    pub async fn pod_health(&self, namespace: Option<String>) -> DiagnosticResult<PodHealthReport> {
        let pods = self.sorted_pods(namespace.as_deref()).await?;

        let mut phase_counts: BTreeMap<String, usize> = BTreeMap::new();
        for pod in &pods {
            *phase_counts.entry(evaluate::pod_phase(pod)).or_insert(0) += 1;
        }

        // pods are pre-sorted by namespace then name; findings inherit
        // that listing order, the summary carries the severity breakdown
        let findings: Vec<Finding> = pods
            .iter()
            .filter_map(|p| evaluate::pod_finding(p, self.config.restart_threshold))
            .collect();

        let summary = SeverityCounts::from_findings(&findings);
        Ok(PodHealthReport {
            namespace,
            phase_counts,
            findings,
            summary,
        })
    }

    /// Resource usage from the metrics API. Absence of a metrics
    /// provider is reported as `available: false`; any other listing
    /// failure fails the call.
    pub async fn resource_usage(&self) -> DiagnosticResult<ResourceUsageReport> {
        let (nodes, metrics) = tokio::join!(self.cluster.list_nodes(), self.cluster.node_metrics());
        let nodes = nodes?;

        let Some(samples) = metrics? else {
            let reason = DiagnosticError::metrics_unavailable(
                "metrics.k8s.io is not served by this cluster",
            );
            return Ok(ResourceUsageReport::unavailable(&reason));
        };

        Ok(ResourceUsageReport {
            available: true,
            unavailable_reason: None,
            nodes: self.utilizations(&samples, &nodes),
        })
    }

    /// Full cluster diagnosis. Node and pod listings must succeed;
    /// metrics failures of any kind only mark usage unavailable.
    pub async fn diagnose(&self) -> DiagnosticResult<DiagnosticReport> {
        let (nodes, pods, metrics) = tokio::join!(
            self.cluster.list_nodes(),
            self.cluster.list_pods(None),
            self.cluster.node_metrics(),
        );
        let mut nodes = nodes?;
        let mut pods = pods?;
        nodes.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        sort_pods(&mut pods);

        let mut findings: Vec<Finding> =
            nodes.iter().filter_map(evaluate::node_finding).collect();
        findings.extend(
            pods.iter()
                .filter_map(|p| evaluate::pod_finding(p, self.config.restart_threshold)),
        );

        let usage_available = match metrics {
            Ok(Some(samples)) => {
                let utilizations = self.utilizations(&samples, &nodes);
                findings.extend(
                    utilizations
                        .iter()
                        .filter_map(|u| evaluate::utilization_finding(u, &self.config)),
                );
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!(error = %err, "metrics query failed during diagnosis");
                false
            }
        };

        let report = DiagnosticReport::new(findings, usage_available);
        info!(
            verdict = ?report.verdict,
            critical = report.summary.critical,
            warning = report.summary.warning,
            "cluster diagnosis complete"
        );
        Ok(report)
    }

    pub async fn namespace_summary(&self) -> DiagnosticResult<NamespaceSummaryReport> {
        let (namespaces, pods, services, deployments) = tokio::join!(
            self.cluster.list_namespaces(),
            self.cluster.list_pods(None),
            self.cluster.list_services(None),
            self.cluster.list_deployments(),
        );
        Ok(NamespaceSummaryReport {
            namespaces: evaluate::summarize_namespaces(
                &namespaces?,
                &pods?,
                &services?,
                &deployments?,
            ),
        })
    }

    pub async fn networking(&self, namespace: Option<String>) -> DiagnosticResult<NetworkReport> {
        let ns = namespace.as_deref();
        let (services, endpoints, policies) = tokio::join!(
            self.cluster.list_services(ns),
            self.cluster.list_endpoints(ns),
            self.cluster.list_network_policies(ns),
        );

        let missing = evaluate::services_without_endpoints(&services?, &endpoints?);
        let mut findings: Vec<Finding> = missing
            .iter()
            .map(|key| {
                let (ns, name) = key.split_once('/').unwrap_or(("", key));
                Finding::new(
                    name,
                    Category::Networking,
                    Severity::Warning,
                    "service has no ready endpoints",
                )
                .in_namespace(ns)
            })
            .collect();
        crate::report::sort_by_severity(&mut findings);

        let summary = SeverityCounts::from_findings(&findings);
        Ok(NetworkReport {
            namespace,
            services_without_endpoints: missing,
            network_policies: evaluate::network_policy_counts(&policies?),
            findings,
            summary,
        })
    }

    async fn sorted_pods(&self, namespace: Option<&str>) -> DiagnosticResult<Vec<Pod>> {
        let mut pods = self.cluster.list_pods(namespace).await?;
        sort_pods(&mut pods);
        Ok(pods)
    }

    fn utilizations(
        &self,
        samples: &[crate::cluster::NodeUsage],
        nodes: &[k8s_openapi::api::core::v1::Node],
    ) -> Vec<NodeUtilization> {
        let mut samples: Vec<_> = samples.to_vec();
        samples.sort_by(|a, b| a.name.cmp(&b.name));
        samples
            .iter()
            .map(|s| evaluate::node_utilization(s, nodes))
            .collect()
    }
}

fn sort_pods(pods: &mut [Pod]) {
    pods.sort_by(|a, b| {
        a.metadata
            .namespace
            .cmp(&b.metadata.namespace)
            .then_with(|| a.metadata.name.cmp(&b.metadata.name))
    });
}
