//! Application state shared by HTTP and WebSocket handlers.
//!
//! Holds no per-user data: the role is refetched from the backend on every
//! request (HTTP) or focus event (WebSocket session).

use std::sync::Arc;

use tracing::{info, instrument};

use crate::backend::{Backend, BackendError, HttpBackend};
use crate::catalog::ChapterCatalog;
use crate::config::{GatewayConfig, LoungeCfg};
use crate::entitlement::AccessPolicy;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub catalog: ChapterCatalog,
    pub policy: AccessPolicy,
    pub lounge: LoungeCfg,
    pub paypal_sandbox: bool,
}

impl AppState {
    /// Build state from config with the reqwest-backed client.
    #[instrument(level = "info", skip_all)]
    pub fn new(cfg: &GatewayConfig) -> Result<Self, BackendError> {
        let backend = HttpBackend::new(&cfg.backend)?;
        info!(
            target: "dictapp_gateway",
            base_url = %backend.base_url,
            chapters = cfg.catalog.chapter_count,
            page_size = cfg.catalog.page_size,
            tier_mode = ?cfg.access.tier_mode,
            "Gateway state ready"
        );
        Ok(Self::with_backend(cfg, Arc::new(backend)))
    }

    pub fn with_backend(cfg: &GatewayConfig, backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            catalog: cfg.catalog(),
            policy: cfg.policy(),
            lounge: cfg.lounge.clone(),
            paypal_sandbox: cfg.backend.paypal_sandbox,
        }
    }
}
