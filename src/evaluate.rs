//! Resource evaluators.
//!
//! Pure functions, one per resource class, turning raw listings into
//! normalized facts. Each evaluated subject with a non-ok condition
//! yields exactly one finding; healthy subjects yield none. Nothing
//! here touches the network, which is what keeps the aggregation
//! logic testable with canned objects.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Endpoints, Namespace, Node, Pod, Service};
use k8s_openapi::api::networking::v1::NetworkPolicy;

use crate::cluster::NodeUsage;
use crate::config::SentryConfig;
use crate::quantity::{parse_cpu_cores, parse_memory_bytes};
use crate::report::{
    Category, Finding, NamespaceSummary, NodeHealth, NodeUtilization, ResourceFigures, Severity,
};

/// Node conditions that indicate pressure while the node is still Ready
const PRESSURE_CONDITIONS: [&str; 4] = [
    "MemoryPressure",
    "DiskPressure",
    "PIDPressure",
    "NetworkUnavailable",
];

const CRASH_LOOP_REASON: &str = "CrashLoopBackOff";
const UNSCHEDULABLE_REASON: &str = "Unschedulable";

fn node_name(node: &Node) -> String {
    node.metadata.name.clone().unwrap_or_default()
}

fn pod_name(pod: &Pod) -> String {
    pod.metadata.name.clone().unwrap_or_default()
}

fn pod_namespace(pod: &Pod) -> String {
    pod.metadata.namespace.clone().unwrap_or_default()
}

/// Pod phase string, "Unknown" when the API reports none
pub fn pod_phase(pod: &Pod) -> String {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

// ============================================================================
// Node evaluator
// ============================================================================

/// Normalized node facts for the health report
pub fn node_health(node: &Node) -> NodeHealth {
    let mut ready = false;
    let mut pressures = Vec::new();

    if let Some(status) = &node.status {
        for condition in status.conditions.as_deref().unwrap_or_default() {
            if condition.type_ == "Ready" {
                ready = condition.status == "True";
            } else if PRESSURE_CONDITIONS.contains(&condition.type_.as_str())
                && condition.status == "True"
            {
                pressures.push(condition.type_.clone());
            }
        }
    }

    NodeHealth {
        name: node_name(node),
        ready,
        pressures,
        capacity: resource_figures(node, |s| s.capacity.as_ref()),
        allocatable: resource_figures(node, |s| s.allocatable.as_ref()),
    }
}

fn resource_figures<'a, F>(node: &'a Node, pick: F) -> ResourceFigures
where
    F: Fn(
        &'a k8s_openapi::api::core::v1::NodeStatus,
    ) -> Option<
        &'a BTreeMap<String, k8s_openapi::apimachinery::pkg::api::resource::Quantity>,
    >,
{
    let Some(map) = node.status.as_ref().and_then(pick) else {
        return ResourceFigures::default();
    };
    ResourceFigures {
        cpu: map.get("cpu").map(|q| q.0.clone()),
        memory: map.get("memory").map(|q| q.0.clone()),
        pods: map.get("pods").map(|q| q.0.clone()),
    }
}

/// A node is healthy iff Ready is true and no pressure condition is
/// active. Not-ready is critical; pressure while Ready is a warning.
pub fn node_finding(node: &Node) -> Option<Finding> {
    let health = node_health(node);

    if !health.ready {
        return Some(Finding::new(
            health.name,
            Category::Readiness,
            Severity::Critical,
            "node is not Ready",
        ));
    }

    if !health.pressures.is_empty() {
        return Some(Finding::new(
            health.name,
            Category::ResourcePressure,
            Severity::Warning,
            format!("node reports {}", health.pressures.join(", ")),
        ));
    }

    None
}

// ============================================================================
// Pod evaluator
// ============================================================================

/// Classify one pod. Failed/Unknown phases are critical; a Running pod
/// with a crash-looping or restart-heavy or non-ready container is a
/// warning; Pending is informational unless scheduling already failed.
pub fn pod_finding(pod: &Pod, restart_threshold: i32) -> Option<Finding> {
    let name = pod_name(pod);
    let namespace = pod_namespace(pod);
    let phase = pod_phase(pod);

    let finding = match phase.as_str() {
        "Failed" | "Unknown" => Finding::new(
            name,
            Category::Readiness,
            Severity::Critical,
            format!("pod phase is {}", phase),
        ),
        "Pending" => {
            if let Some(reason) = unschedulable_reason(pod) {
                Finding::new(
                    name,
                    Category::Scheduling,
                    Severity::Warning,
                    format!("pod cannot be scheduled: {}", reason),
                )
            } else {
                Finding::new(name, Category::Scheduling, Severity::Info, "pod is Pending")
            }
        }
        "Running" => running_pod_finding(pod, &name, restart_threshold)?,
        // Succeeded, or anything else the API grows
        _ => return None,
    };

    Some(finding.in_namespace(namespace))
}

fn running_pod_finding(pod: &Pod, name: &str, restart_threshold: i32) -> Option<Finding> {
    let statuses = pod.status.as_ref()?.container_statuses.as_deref()?;

    for status in statuses {
        let waiting_reason = status
            .state
            .as_ref()
            .and_then(|s| s.waiting.as_ref())
            .and_then(|w| w.reason.as_deref());
        if waiting_reason == Some(CRASH_LOOP_REASON) || status.restart_count > restart_threshold {
            return Some(Finding::new(
                name,
                Category::Restarts,
                Severity::Warning,
                format!(
                    "container {} restarted {} times",
                    status.name, status.restart_count
                ),
            ));
        }
    }

    for status in statuses {
        if !status.ready {
            return Some(Finding::new(
                name,
                Category::Readiness,
                Severity::Warning,
                format!("container {} is not ready", status.name),
            ));
        }
    }

    None
}

fn unschedulable_reason(pod: &Pod) -> Option<String> {
    pod.status
        .as_ref()?
        .conditions
        .as_deref()?
        .iter()
        .find(|c| {
            c.type_ == "PodScheduled"
                && c.status == "False"
                && c.reason.as_deref() == Some(UNSCHEDULABLE_REASON)
        })
        .map(|c| {
            c.message
                .clone()
                .unwrap_or_else(|| UNSCHEDULABLE_REASON.to_string())
        })
}

// ============================================================================
// Metrics evaluator
// ============================================================================

/// Join one usage sample against its node's allocatable figures.
///
/// Ratios are `None` when the allocatable quantity is missing or
/// unparseable; such nodes still show raw usage but produce no finding.
pub fn node_utilization(usage: &NodeUsage, nodes: &[Node]) -> NodeUtilization {
    let allocatable = nodes
        .iter()
        .find(|n| node_name(n) == usage.name)
        .map(|n| resource_figures(n, |s| s.allocatable.as_ref()))
        .unwrap_or_default();

    let cpu_used = parse_cpu_cores(&usage.cpu).unwrap_or(0.0);
    let memory_used = parse_memory_bytes(&usage.memory).unwrap_or(0.0);
    let cpu_allocatable = allocatable.cpu.as_deref().and_then(parse_cpu_cores);
    let memory_allocatable = allocatable.memory.as_deref().and_then(parse_memory_bytes);

    NodeUtilization {
        name: usage.name.clone(),
        cpu_used_cores: cpu_used,
        cpu_allocatable_cores: cpu_allocatable,
        cpu_ratio: ratio(cpu_used, cpu_allocatable),
        memory_used_bytes: memory_used,
        memory_allocatable_bytes: memory_allocatable,
        memory_ratio: ratio(memory_used, memory_allocatable),
    }
}

fn ratio(used: f64, allocatable: Option<f64>) -> Option<f64> {
    match allocatable {
        Some(total) if total > 0.0 => Some(used / total),
        _ => None,
    }
}

/// Flag a node whose CPU or memory utilization crosses the watermarks
pub fn utilization_finding(util: &NodeUtilization, config: &SentryConfig) -> Option<Finding> {
    let worst = [("CPU", util.cpu_ratio), ("memory", util.memory_ratio)]
        .into_iter()
        .filter_map(|(label, r)| r.map(|r| (label, r)))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let (label, value) = worst;
    let severity = if value >= config.usage_critical_ratio {
        Severity::Critical
    } else if value >= config.usage_warn_ratio {
        Severity::Warning
    } else {
        return None;
    };

    Some(Finding::new(
        util.name.clone(),
        Category::Capacity,
        severity,
        format!("{} utilization at {:.0}%", label, value * 100.0),
    ))
}

// ============================================================================
// Namespace evaluator (descriptive only, no findings)
// ============================================================================

/// Count pods/services/deployments per namespace, in lexical order
pub fn summarize_namespaces(
    namespaces: &[Namespace],
    pods: &[Pod],
    services: &[Service],
    deployments: &[Deployment],
) -> Vec<NamespaceSummary> {
    let mut summaries: BTreeMap<String, NamespaceSummary> = namespaces
        .iter()
        .filter_map(|ns| ns.metadata.name.clone())
        .map(|name| {
            let summary = NamespaceSummary {
                name: name.clone(),
                ..Default::default()
            };
            (name, summary)
        })
        .collect();

    for pod in pods {
        if let Some(summary) = summaries.get_mut(&pod_namespace(pod)) {
            summary.pods += 1;
            match pod_phase(pod).as_str() {
                "Running" => summary.running += 1,
                "Pending" => summary.pending += 1,
                "Failed" => summary.failed += 1,
                _ => {}
            }
        }
    }

    for service in services {
        if let Some(ns) = &service.metadata.namespace {
            if let Some(summary) = summaries.get_mut(ns) {
                summary.services += 1;
            }
        }
    }

    for deployment in deployments {
        if let Some(ns) = &deployment.metadata.namespace {
            if let Some(summary) = summaries.get_mut(ns) {
                summary.deployments += 1;
            }
        }
    }

    summaries.into_values().collect()
}

// ============================================================================
// Networking evaluator
// ============================================================================

/// `namespace/name` of every ClusterIP service with no ready endpoint
/// addresses. Headless and ExternalName services are skipped — they
/// legitimately have no cluster endpoints.
pub fn services_without_endpoints(services: &[Service], endpoints: &[Endpoints]) -> Vec<String> {
    let ready_addresses: BTreeMap<String, usize> = endpoints
        .iter()
        .filter_map(|ep| {
            let key = format!(
                "{}/{}",
                ep.metadata.namespace.clone().unwrap_or_default(),
                ep.metadata.name.clone().unwrap_or_default()
            );
            let count = ep
                .subsets
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|subset| subset.addresses.as_deref().unwrap_or_default().len())
                .sum();
            Some((key, count))
        })
        .collect();

    let mut missing: Vec<String> = services
        .iter()
        .filter(|svc| {
            let spec = match &svc.spec {
                Some(spec) => spec,
                None => return false,
            };
            if spec.type_.as_deref() == Some("ExternalName") {
                return false;
            }
            if spec.cluster_ip.as_deref() == Some("None") {
                return false;
            }
            true
        })
        .filter_map(|svc| {
            let key = format!(
                "{}/{}",
                svc.metadata.namespace.clone().unwrap_or_default(),
                svc.metadata.name.clone().unwrap_or_default()
            );
            match ready_addresses.get(&key).copied().unwrap_or(0) {
                0 => Some(key),
                _ => None,
            }
        })
        .collect();

    missing.sort();
    missing
}

/// NetworkPolicy counts per namespace
pub fn network_policy_counts(policies: &[NetworkPolicy]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for policy in policies {
        let ns = policy.metadata.namespace.clone().unwrap_or_default();
        *counts.entry(ns).or_insert(0) += 1;
    }
    counts
}
