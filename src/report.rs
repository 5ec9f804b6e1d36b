//! Diagnostic report model.
//!
//! A `Finding` is one normalized observation about a cluster subject; a
//! `DiagnosticReport` correlates all findings into an overall verdict.
//! Invariants: severity counts always equal the per-severity finding
//! counts, and every evaluated subject with a non-ok condition yields
//! exactly one finding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Severity of a single finding, ordered from benign to critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Info,
    Warning,
    Critical,
}

/// What aspect of cluster health a finding concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Readiness,
    Capacity,
    Scheduling,
    ResourcePressure,
    Restarts,
    Networking,
}

/// One normalized observation about a cluster subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Node name, pod name, or service name
    pub subject: String,

    /// Namespace of the subject, absent for cluster-scoped resources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    pub category: Category,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(
        subject: impl Into<String>,
        category: Category,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            namespace: None,
            category,
            severity,
            message: message.into(),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Overall verdict derived from the maximum finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Healthy,
    Degraded,
    Critical,
}

impl Verdict {
    /// Critical if any finding is critical, degraded if the maximum
    /// severity is warning, healthy otherwise. Info findings do not
    /// degrade the verdict.
    pub fn from_findings(findings: &[Finding]) -> Self {
        let max = findings.iter().map(|f| f.severity).max();
        match max {
            Some(Severity::Critical) => Verdict::Critical,
            Some(Severity::Warning) => Verdict::Degraded,
            _ => Verdict::Healthy,
        }
    }
}

/// Per-severity finding counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub info: usize,
    pub warning: usize,
    pub critical: usize,
}

impl SeverityCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Ok => {}
                Severity::Info => counts.info += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Critical => counts.critical += 1,
            }
        }
        counts
    }
}

/// Stable sort: most severe first, then namespace, then subject.
///
/// Stability matters: within one severity the aggregator's merge order
/// (nodes, then pods by namespace, then usage) is preserved.
pub fn sort_by_severity(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.namespace.cmp(&b.namespace))
            .then_with(|| a.subject.cmp(&b.subject))
    });
}

/// The terminal artifact of `diagnose_cluster`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
    pub summary: SeverityCounts,

    /// False when the metrics API is absent or failed; node/pod
    /// findings are still complete in that case
    pub usage_available: bool,
}

impl DiagnosticReport {
    pub fn new(mut findings: Vec<Finding>, usage_available: bool) -> Self {
        sort_by_severity(&mut findings);
        let verdict = Verdict::from_findings(&findings);
        let summary = SeverityCounts::from_findings(&findings);
        Self {
            verdict,
            findings,
            summary,
            usage_available,
        }
    }
}

// ============================================================================
// Per-tool response types
// ============================================================================

/// Response for get_cluster_info
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterInfo {
    pub version: String,
    pub platform: String,
    pub node_count: usize,
    pub namespace_count: usize,
}

/// Raw capacity/allocatable figures for one node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceFigures {
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub pods: Option<String>,
}

/// Per-node state in the node health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeHealth {
    pub name: String,
    pub ready: bool,

    /// Active pressure condition names (MemoryPressure, DiskPressure, ...)
    pub pressures: Vec<String>,

    pub capacity: ResourceFigures,
    pub allocatable: ResourceFigures,
}

/// Response for check_node_health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeHealthReport {
    pub nodes: Vec<NodeHealth>,
    pub findings: Vec<Finding>,
    pub summary: SeverityCounts,
}

/// Response for check_pod_health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodHealthReport {
    /// Namespace filter, absent when scanning all namespaces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Pod counts per phase (Running, Pending, Failed, Succeeded, Unknown)
    pub phase_counts: BTreeMap<String, usize>,

    pub findings: Vec<Finding>,
    pub summary: SeverityCounts,
}

/// Measured utilization for one node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeUtilization {
    pub name: String,
    pub cpu_used_cores: f64,
    pub cpu_allocatable_cores: Option<f64>,
    pub cpu_ratio: Option<f64>,
    pub memory_used_bytes: f64,
    pub memory_allocatable_bytes: Option<f64>,
    pub memory_ratio: Option<f64>,
}

/// Response for get_resource_usage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUsageReport {
    /// False when the metrics API is absent; `nodes` is then empty
    pub available: bool,

    /// Why usage is unavailable, absent when `available` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<crate::error::StructuredError>,

    pub nodes: Vec<NodeUtilization>,
}

impl ResourceUsageReport {
    pub fn unavailable(error: &crate::error::DiagnosticError) -> Self {
        Self {
            available: false,
            unavailable_reason: Some(error.to_structured()),
            nodes: Vec::new(),
        }
    }
}

/// Per-namespace resource counts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespaceSummary {
    pub name: String,
    pub pods: usize,
    pub running: usize,
    pub pending: usize,
    pub failed: usize,
    pub services: usize,
    pub deployments: usize,
}

/// Response for get_namespace_summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceSummaryReport {
    pub namespaces: Vec<NamespaceSummary>,
}

/// Response for check_networking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// `namespace/name` of every non-headless ClusterIP service with no
    /// ready endpoint addresses
    pub services_without_endpoints: Vec<String>,

    /// NetworkPolicy counts per namespace
    pub network_policies: BTreeMap<String, usize>,

    pub findings: Vec<Finding>,
    pub summary: SeverityCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(subject: &str, severity: Severity) -> Finding {
        Finding::new(subject, Category::Readiness, severity, "test")
    }

    #[test]
    fn test_verdict_derivation() {
        assert_eq!(Verdict::from_findings(&[]), Verdict::Healthy);
        assert_eq!(
            Verdict::from_findings(&[finding("a", Severity::Info)]),
            Verdict::Healthy
        );
        assert_eq!(
            Verdict::from_findings(&[finding("a", Severity::Warning)]),
            Verdict::Degraded
        );
        assert_eq!(
            Verdict::from_findings(&[
                finding("a", Severity::Warning),
                finding("b", Severity::Critical)
            ]),
            Verdict::Critical
        );
    }

    #[test]
    fn test_counts_match_findings() {
        let findings = vec![
            finding("a", Severity::Critical),
            finding("b", Severity::Warning),
            finding("c", Severity::Warning),
            finding("d", Severity::Info),
        ];
        let counts = SeverityCounts::from_findings(&findings);
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.warning, 2);
        assert_eq!(counts.info, 1);
        assert_eq!(
            counts.critical + counts.warning + counts.info,
            findings.len()
        );
    }

    #[test]
    fn test_sort_most_severe_first() {
        let mut findings = vec![
            finding("z", Severity::Info),
            finding("a", Severity::Critical),
            finding("m", Severity::Warning),
        ];
        sort_by_severity(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[1].severity, Severity::Warning);
        assert_eq!(findings[2].severity, Severity::Info);
    }

    #[test]
    fn test_sort_ties_broken_by_namespace_then_subject() {
        let mut findings = vec![
            finding("pod-b", Severity::Warning).in_namespace("kube-system"),
            finding("pod-a", Severity::Warning).in_namespace("default"),
            finding("pod-c", Severity::Warning).in_namespace("default"),
        ];
        sort_by_severity(&mut findings);
        assert_eq!(findings[0].subject, "pod-a");
        assert_eq!(findings[1].subject, "pod-c");
        assert_eq!(findings[2].subject, "pod-b");
    }

    #[test]
    fn test_report_invariants() {
        let report = DiagnosticReport::new(
            vec![
                finding("a", Severity::Warning),
                finding("b", Severity::Critical),
            ],
            false,
        );
        assert_eq!(report.verdict, Verdict::Critical);
        assert_eq!(report.summary.critical, 1);
        assert_eq!(report.summary.warning, 1);
        assert!(!report.usage_available);
        // most severe first
        assert_eq!(report.findings[0].subject, "b");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Ok < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }
}
