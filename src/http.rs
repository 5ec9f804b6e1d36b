//! Streamable HTTP transport.
//!
//! Mounts the MCP service under `/mcp` on an axum router, with a plain
//! `/healthz` endpoint for probes. Sessions are kept in-process; each
//! HTTP session gets a clone of the shared handler.

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use tracing::info;

use crate::server::SentryServer;

async fn healthz() -> &'static str {
    "ok"
}

/// Serve MCP over streamable HTTP until ctrl-c
pub async fn serve_http(server: SentryServer, addr: SocketAddr) -> anyhow::Result<()> {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let app = Router::new()
        .route("/healthz", get(healthz))
        .nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "MCP streamable HTTP server listening on /mcp");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
