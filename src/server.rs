//! MCP server handler.
//!
//! One handler serves both transports. It renders the tool registry
//! for `tools/list` and forwards `tools/call` to the dispatcher.
//! Protocol misuse (unknown tool, malformed arguments) becomes a JSON-RPC
//! error; cluster trouble becomes a structured error payload inside the
//! tool result, so one failing call never tears down the session.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData, ServerHandler};
use serde_json::Value;
use tracing::warn;

use crate::aggregate::Aggregator;
use crate::cluster::ClusterOps;
use crate::config::SentryConfig;
use crate::dispatch::Dispatcher;
use crate::error::DiagnosticError;

const INSTRUCTIONS: &str = "Read-only Kubernetes cluster diagnostics.\n\
     Tools answer health questions (node readiness, pod restarts, resource \
     utilization, namespace inventory, service endpoints) from live API \
     listings. Nothing is mutated; every call is safe to repeat.\n\
     Start with diagnose_cluster for an overall verdict, then drill down \
     with the scoped tools. Resource usage requires metrics-server; when it \
     is absent the usage section is reported unavailable and everything \
     else still works.";

/// The diagnostic MCP server, shared by the stdio and HTTP transports
#[derive(Clone)]
pub struct SentryServer {
    dispatcher: Arc<Dispatcher>,
}

impl SentryServer {
    pub fn new(cluster: Arc<dyn ClusterOps>, config: SentryConfig) -> Self {
        let aggregator = Aggregator::new(cluster, config);
        Self {
            dispatcher: Arc::new(Dispatcher::new(aggregator)),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl ServerHandler for SentryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self
            .dispatcher
            .registry()
            .descriptors()
            .iter()
            .map(|descriptor| {
                let schema: JsonObject = descriptor
                    .input_schema
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                Tool::new(descriptor.name, descriptor.description, Arc::new(schema))
            })
            .collect();
        Ok(ListToolsResult {
            next_cursor: None,
            tools,
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request
            .arguments
            .map(Value::Object)
            .unwrap_or(Value::Null);

        match self.dispatcher.dispatch(&request.name, arguments).await {
            Ok(value) => {
                let text =
                    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(
                err @ (DiagnosticError::UnknownTool { .. }
                | DiagnosticError::InvalidArguments { .. }),
            ) => Err(ErrorData::invalid_params(err.to_string(), None)),
            Err(err) => {
                warn!(tool = %request.name, error = %err, "tool call failed");
                Ok(CallToolResult::error(vec![Content::text(
                    err.to_structured_json(),
                )]))
            }
        }
    }
}
