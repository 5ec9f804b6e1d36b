//! Tool registry.
//!
//! The registry is the single source of truth for the tool surface:
//! names, descriptions, and input schemas. `tools/list` renders it and
//! the dispatcher validates against it, so the two can never drift
//! apart.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

/// Tool names, kept as constants so dispatch and tests share them
pub mod names {
    pub const GET_CLUSTER_INFO: &str = "get_cluster_info";
    pub const CHECK_NODE_HEALTH: &str = "check_node_health";
    pub const CHECK_POD_HEALTH: &str = "check_pod_health";
    pub const GET_RESOURCE_USAGE: &str = "get_resource_usage";
    pub const DIAGNOSE_CLUSTER: &str = "diagnose_cluster";
    pub const GET_NAMESPACE_SUMMARY: &str = "get_namespace_summary";
    pub const CHECK_NETWORKING: &str = "check_networking";
}

/// Static description of one tool
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Tools that take no arguments
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoArguments {}

/// Arguments for check_pod_health
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PodHealthRequest {
    /// Namespace to inspect; omit to scan all namespaces
    #[schemars(description = "Namespace to inspect; omit to scan all namespaces")]
    pub namespace: Option<String>,
}

/// Arguments for check_networking
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NetworkingRequest {
    /// Namespace to inspect; omit to scan all namespaces
    #[schemars(description = "Namespace to inspect; omit to scan all namespaces")]
    pub namespace: Option<String>,
}

fn schema_of<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
}

/// The fixed tool table served by this process
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn standard() -> Self {
        let tools = vec![
            ToolDescriptor {
                name: names::GET_CLUSTER_INFO,
                description: "Report the cluster's version, platform, node count, and namespace count.",
                input_schema: schema_of::<NoArguments>(),
            },
            ToolDescriptor {
                name: names::CHECK_NODE_HEALTH,
                description: "Evaluate every node's readiness, pressure conditions, and capacity figures.",
                input_schema: schema_of::<NoArguments>(),
            },
            ToolDescriptor {
                name: names::CHECK_POD_HEALTH,
                description: "Evaluate pod health (phases, restarts, container readiness), optionally scoped to one namespace.",
                input_schema: schema_of::<PodHealthRequest>(),
            },
            ToolDescriptor {
                name: names::GET_RESOURCE_USAGE,
                description: "Report per-node CPU and memory utilization from the metrics API, when installed.",
                input_schema: schema_of::<NoArguments>(),
            },
            ToolDescriptor {
                name: names::DIAGNOSE_CLUSTER,
                description: "Run the full diagnosis: nodes, pods, and utilization merged into one verdict.",
                input_schema: schema_of::<NoArguments>(),
            },
            ToolDescriptor {
                name: names::GET_NAMESPACE_SUMMARY,
                description: "Count pods, services, and deployments per namespace.",
                input_schema: schema_of::<NoArguments>(),
            },
            ToolDescriptor {
                name: names::CHECK_NETWORKING,
                description: "Find services without ready endpoints and count NetworkPolicies, optionally scoped to one namespace.",
                input_schema: schema_of::<NetworkingRequest>(),
            },
        ];
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }
}
