//! Diagnostic error types.
//!
//! Every failing tool call surfaces a structured payload with a
//! machine-readable kind, so callers can tell an unreachable cluster
//! apart from a bad argument without parsing prose. Metrics absence is
//! the one deliberately soft kind: it degrades a report section instead
//! of failing the call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for diagnostic operations
pub type DiagnosticResult<T> = Result<T, DiagnosticError>;

/// Errors that can occur while serving a diagnostic tool call
#[derive(Error, Debug)]
pub enum DiagnosticError {
    /// The cluster API could not be reached (network, DNS, TLS, ...)
    #[error("cluster API unreachable: {message}")]
    ClusterUnreachable { message: String },

    /// The cluster rejected our credentials
    #[error("cluster rejected credentials: {message}")]
    Unauthorized { message: String },

    /// The metrics API (metrics.k8s.io) is not installed or not serving
    #[error("metrics API unavailable: {message}")]
    MetricsUnavailable { message: String },

    /// Tool name not present in the registry
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// Arguments did not match the tool's declared schema
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// A cluster query exceeded the per-query timeout
    #[error("cluster query timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// A cluster object had an unexpected shape
    #[error("evaluation error: {message}")]
    Evaluation { message: String },
}

impl DiagnosticError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::ClusterUnreachable {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn metrics_unavailable(message: impl Into<String>) -> Self {
        Self::MetricsUnavailable {
            message: message.into(),
        }
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    pub fn invalid_arguments(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout {
            seconds: duration.as_secs(),
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Machine-readable error code for structured results
    pub fn code(&self) -> &'static str {
        match self {
            Self::ClusterUnreachable { .. } => "CLUSTER_UNREACHABLE",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::MetricsUnavailable { .. } => "METRICS_UNAVAILABLE",
            Self::UnknownTool { .. } => "UNKNOWN_TOOL",
            Self::InvalidArguments { .. } => "INVALID_ARGUMENTS",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Evaluation { .. } => "EVALUATION_ERROR",
        }
    }

    /// Whether retrying the same call may succeed without operator action
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ClusterUnreachable { .. } | Self::Timeout { .. }
        )
    }

    /// Actionable hint for the caller
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::ClusterUnreachable { .. } => {
                "Check that the API server is reachable from this process (network, VPN, kubeconfig server address)."
            }
            Self::Unauthorized { .. } => {
                "Check kubeconfig credentials or the service account's RBAC bindings. Only read verbs (get/list) are needed."
            }
            Self::MetricsUnavailable { .. } => {
                "Install metrics-server in the cluster to enable resource usage reporting. Other diagnostics work without it."
            }
            Self::UnknownTool { .. } => {
                "Call tools/list to see the available tool names."
            }
            Self::InvalidArguments { .. } => {
                "Check the tool's input schema; the namespace argument, when present, must be a string."
            }
            Self::Timeout { .. } => {
                "Retry; if timeouts persist, raise KUBE_SENTRY_QUERY_TIMEOUT_SECS or investigate API server latency."
            }
            Self::Evaluation { .. } => {
                "A cluster object had an unexpected shape; check the server log for the offending resource."
            }
        }
    }

    /// Convert to a structured error payload for tool results
    pub fn to_structured(&self) -> StructuredError {
        StructuredError {
            code: self.code().to_string(),
            message: self.to_string(),
            recovery_hint: self.recovery_hint().to_string(),
            retryable: self.is_retryable(),
        }
    }

    /// Structured error payload as a JSON string
    pub fn to_structured_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_structured())
            .unwrap_or_else(|_| format!(r#"{{"code":"{}","message":"{}"}}"#, self.code(), self))
    }
}

/// Structured error response carried inside a tool result.
///
/// Delivered through the same channel as a success, so a transport
/// session never dies on a single bad call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable kind (e.g. "CLUSTER_UNREACHABLE", "TIMEOUT")
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Actionable hint for the caller
    pub recovery_hint: String,

    /// Whether the failure is transient
    #[serde(default)]
    pub retryable: bool,
}
