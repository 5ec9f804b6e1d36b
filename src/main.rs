//! kube-sentry entry point.
//!
//! Stdio transport by default (for MCP clients that spawn the server as
//! a subprocess); `--http` serves the streamable HTTP transport
//! instead. Logs always go to stderr so stdout stays clean for the
//! stdio protocol stream.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rmcp::ServiceExt;
use tracing::info;

use kube_sentry::cluster::KubeCluster;
use kube_sentry::config::SentryConfig;
use kube_sentry::http::serve_http;
use kube_sentry::server::SentryServer;

#[derive(Parser, Debug)]
#[command(name = "kube-sentry", about = "Read-only Kubernetes diagnostics over MCP")]
struct Args {
    /// Serve streamable HTTP instead of stdio
    #[arg(long)]
    http: bool,

    /// Listen address for the HTTP transport
    #[arg(long, default_value = "0.0.0.0:8000")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kube_sentry=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SentryConfig::from_env();
    let cluster = KubeCluster::connect(config.query_timeout).await?;
    let server = SentryServer::new(Arc::new(cluster), config);

    if args.http {
        serve_http(server, args.listen).await?;
    } else {
        info!("serving MCP over stdio");
        let service = server
            .serve((tokio::io::stdin(), tokio::io::stdout()))
            .await?;
        service.waiting().await?;
    }

    Ok(())
}
