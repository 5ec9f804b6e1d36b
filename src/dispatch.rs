//! Tool dispatch.
//!
//! Maps a validated tool name and argument object onto the matching
//! aggregator method. Transport-agnostic: both the stdio and the HTTP
//! server hand calls to the same dispatcher, which is also what the
//! integration tests drive directly.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::aggregate::Aggregator;
use crate::error::{DiagnosticError, DiagnosticResult};
use crate::registry::{names, NetworkingRequest, NoArguments, PodHealthRequest, ToolRegistry};

pub struct Dispatcher {
    registry: ToolRegistry,
    aggregator: Aggregator,
}

impl Dispatcher {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            registry: ToolRegistry::standard(),
            aggregator,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one tool call and return its JSON response
    #[instrument(skip(self, arguments))]
    pub async fn dispatch(&self, name: &str, arguments: Value) -> DiagnosticResult<Value> {
        if self.registry.get(name).is_none() {
            return Err(DiagnosticError::unknown_tool(name));
        }
        debug!(tool = name, "dispatching tool call");

        let response = match name {
            names::GET_CLUSTER_INFO => {
                let _: NoArguments = parse_arguments(name, arguments)?;
                to_json(self.aggregator.cluster_info().await?)?
            }
            names::CHECK_NODE_HEALTH => {
                let _: NoArguments = parse_arguments(name, arguments)?;
                to_json(self.aggregator.node_health().await?)?
            }
            names::CHECK_POD_HEALTH => {
                let request: PodHealthRequest = parse_arguments(name, arguments)?;
                to_json(self.aggregator.pod_health(request.namespace).await?)?
            }
            names::GET_RESOURCE_USAGE => {
                let _: NoArguments = parse_arguments(name, arguments)?;
                to_json(self.aggregator.resource_usage().await?)?
            }
            names::DIAGNOSE_CLUSTER => {
                let _: NoArguments = parse_arguments(name, arguments)?;
                to_json(self.aggregator.diagnose().await?)?
            }
            names::GET_NAMESPACE_SUMMARY => {
                let _: NoArguments = parse_arguments(name, arguments)?;
                to_json(self.aggregator.namespace_summary().await?)?
            }
            names::CHECK_NETWORKING => {
                let request: NetworkingRequest = parse_arguments(name, arguments)?;
                to_json(self.aggregator.networking(request.namespace).await?)?
            }
            // unreachable: the registry check above covers every name
            other => return Err(DiagnosticError::unknown_tool(other)),
        };
        Ok(response)
    }
}

fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> DiagnosticResult<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| DiagnosticError::invalid_arguments(tool, e.to_string()))
}

fn to_json<T: serde::Serialize>(value: T) -> DiagnosticResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| DiagnosticError::evaluation(format!("response serialization: {}", e)))
}
