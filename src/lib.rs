//! Read-only Kubernetes cluster diagnostics served over MCP.
//!
//! The crate is layered: `cluster` lists resources, `evaluate` turns
//! listings into findings, `aggregate` assembles per-tool reports, and
//! `dispatch`/`server` expose the tool surface over stdio and
//! streamable HTTP.

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod evaluate;
pub mod http;
pub mod quantity;
pub mod registry;
pub mod report;
pub mod server;

pub use aggregate::Aggregator;
pub use cluster::{ClusterOps, ClusterVersion, KubeCluster, NodeUsage};
pub use config::SentryConfig;
pub use dispatch::Dispatcher;
pub use error::{DiagnosticError, DiagnosticResult, StructuredError};
pub use report::{DiagnosticReport, Finding, Severity, Verdict};
pub use server::SentryServer;
