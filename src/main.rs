//! Dictapp gateway · entitlement-aware API for the vocabulary app
//!
//! - Axum HTTP + WebSocket API in front of the vocabulary backend
//! - Chapter gating computed server-side from the caller's role
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   DICTAPP_CONFIG_PATH : path to TOML config (backend, catalog, access, lounge)
//!   BACKEND_BASE_URL    : overrides [backend].base_url
//!   PAYPAL_SANDBOX      : "true"/"1" to build sandbox checkout links
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use dictapp_gateway::config::GatewayConfig;
use dictapp_gateway::routes::build_router;
use dictapp_gateway::state::AppState;
use dictapp_gateway::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = GatewayConfig::load_from_env();
  let state = Arc::new(AppState::new(&cfg)?);
  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "dictapp_gateway", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "dictapp_gateway", error = %e, "Failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  info!(target: "dictapp_gateway", "Shutdown signal received");
}
