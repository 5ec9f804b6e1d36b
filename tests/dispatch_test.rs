//! Tool dispatch behavior: names, argument validation, scoping.

mod support;

use std::sync::Arc;

use serde_json::{json, Value};

use kube_sentry::{Aggregator, Dispatcher, SentryConfig};
use support::{namespace, node, pod, running_pod, FakeCluster};

fn dispatcher(cluster: FakeCluster) -> Dispatcher {
    Dispatcher::new(Aggregator::new(Arc::new(cluster), SentryConfig::default()))
}

fn sample_cluster() -> FakeCluster {
    FakeCluster {
        nodes: vec![node("n1", true, &[])],
        namespaces: vec![namespace("default"), namespace("kube-system")],
        pods: vec![
            running_pod("kube-system", "dns", 0, None),
            pod("default", "broken", "Failed"),
            running_pod("default", "web", 0, None),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn unknown_tool_is_rejected() {
    let err = dispatcher(sample_cluster())
        .dispatch("restart_pod", Value::Null)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_TOOL");
    assert!(err.to_string().contains("restart_pod"));
}

#[tokio::test]
async fn non_string_namespace_is_rejected() {
    let err = dispatcher(sample_cluster())
        .dispatch("check_pod_health", json!({"namespace": 42}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENTS");
    assert!(err.to_string().contains("check_pod_health"));
}

#[tokio::test]
async fn unexpected_argument_is_rejected() {
    let err = dispatcher(sample_cluster())
        .dispatch("check_pod_health", json!({"namepsace": "default"}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENTS");
}

#[tokio::test]
async fn null_arguments_mean_no_filter() {
    let response = dispatcher(sample_cluster())
        .dispatch("check_pod_health", Value::Null)
        .await
        .unwrap();
    let total: u64 = response["phase_counts"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(total, 3);
    assert!(response.get("namespace").is_none() || response["namespace"].is_null());
}

#[tokio::test]
async fn namespace_filter_scopes_the_scan() {
    let response = dispatcher(sample_cluster())
        .dispatch("check_pod_health", json!({"namespace": "default"}))
        .await
        .unwrap();
    assert_eq!(response["namespace"], "default");
    assert_eq!(response["phase_counts"]["Failed"], 1);
    assert_eq!(response["phase_counts"]["Running"], 1);
    assert!(response["phase_counts"].get("Succeeded").is_none());

    // only the broken pod in default yields a finding
    let findings = response["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["subject"], "broken");
    assert_eq!(findings[0]["namespace"], "default");
}

#[tokio::test]
async fn every_registered_tool_dispatches() {
    let dispatcher = dispatcher(sample_cluster());
    let names: Vec<String> = dispatcher
        .registry()
        .descriptors()
        .iter()
        .map(|d| d.name.to_string())
        .collect();
    assert_eq!(names.len(), 7);

    for name in names {
        let response = dispatcher.dispatch(&name, Value::Null).await;
        assert!(response.is_ok(), "{} failed: {:?}", name, response.err());
    }
}

#[tokio::test]
async fn cluster_info_shape() {
    let response = dispatcher(sample_cluster())
        .dispatch("get_cluster_info", Value::Null)
        .await
        .unwrap();
    assert_eq!(response["version"], "v1.31.2");
    assert_eq!(response["platform"], "linux/amd64");
    assert_eq!(response["node_count"], 1);
    assert_eq!(response["namespace_count"], 2);
}

#[tokio::test]
async fn resource_usage_reports_unavailable_without_metrics() {
    let response = dispatcher(sample_cluster())
        .dispatch("get_resource_usage", Value::Null)
        .await
        .unwrap();
    assert_eq!(response["available"], false);
    assert_eq!(response["nodes"].as_array().unwrap().len(), 0);
    assert_eq!(response["unavailable_reason"]["code"], "METRICS_UNAVAILABLE");
}

#[tokio::test]
async fn no_argument_tools_reject_extra_arguments() {
    let dispatcher = dispatcher(sample_cluster());
    for name in [
        "get_cluster_info",
        "check_node_health",
        "get_resource_usage",
        "diagnose_cluster",
        "get_namespace_summary",
    ] {
        let err = dispatcher
            .dispatch(name, json!({"bogus": true}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENTS", "{} accepted bogus args", name);
    }

    // an empty object is still fine
    let response = dispatcher
        .dispatch("get_cluster_info", json!({}))
        .await
        .unwrap();
    assert_eq!(response["node_count"], 1);
}
