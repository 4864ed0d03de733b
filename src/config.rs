//! Gateway configuration: TOML file at DICTAPP_CONFIG_PATH plus env overrides.
//!
//! Every section is optional; missing fields take the defaults below.
//!
//! ```toml
//! [backend]
//! base_url = "https://dictserver-main.vercel.app"
//! timeout_secs = 15
//! paypal_sandbox = false
//!
//! [catalog]
//! chapter_count = 12
//! page_size = 6
//!
//! [access]
//! tier_mode = "exact"   # or "cumulative"
//!
//! [lounge]
//! heartbeat_secs = 30
//! presence_secs = 15
//! ```

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::catalog::ChapterCatalog;
use crate::entitlement::{AccessPolicy, TierMode};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GatewayConfig {
  #[serde(default)]
  pub backend: BackendCfg,
  #[serde(default)]
  pub catalog: CatalogCfg,
  #[serde(default)]
  pub access: AccessCfg,
  #[serde(default)]
  pub lounge: LoungeCfg,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BackendCfg {
  pub base_url: String,
  pub timeout_secs: u64,
  pub paypal_sandbox: bool,
}

impl Default for BackendCfg {
  fn default() -> Self {
    Self {
      base_url: "https://dictserver-main.vercel.app".into(),
      timeout_secs: 15,
      paypal_sandbox: false,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CatalogCfg {
  pub chapter_count: u32,
  pub page_size: u32,
}

impl Default for CatalogCfg {
  fn default() -> Self { Self { chapter_count: 12, page_size: 6 } }
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct AccessCfg {
  pub tier_mode: TierMode,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoungeCfg {
  pub heartbeat_secs: u64,
  pub presence_secs: u64,
}

impl Default for LoungeCfg {
  fn default() -> Self { Self { heartbeat_secs: 30, presence_secs: 15 } }
}

impl LoungeCfg {
  pub fn heartbeat_every(&self) -> Duration { Duration::from_secs(self.heartbeat_secs.max(1)) }
  pub fn presence_every(&self) -> Duration { Duration::from_secs(self.presence_secs.max(1)) }
}

impl GatewayConfig {
  pub fn catalog(&self) -> ChapterCatalog {
    ChapterCatalog::new(self.catalog.chapter_count, self.catalog.page_size)
  }

  pub fn policy(&self) -> AccessPolicy {
    AccessPolicy::new(self.access.tier_mode)
  }

  pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str::<GatewayConfig>(s)
  }

  /// Load from DICTAPP_CONFIG_PATH (if set), then apply BACKEND_BASE_URL and
  /// PAYPAL_SANDBOX. IO or parse errors are logged and defaults are used.
  pub fn load_from_env() -> Self {
    let mut cfg = match std::env::var("DICTAPP_CONFIG_PATH") {
      Ok(path) => match std::fs::read_to_string(&path) {
        Ok(s) => match Self::from_toml(&s) {
          Ok(cfg) => {
            info!(target: "dictapp_gateway", %path, "Loaded gateway config (TOML)");
            cfg
          }
          Err(e) => {
            error!(target: "dictapp_gateway", %path, error = %e, "Failed to parse TOML config; using defaults");
            Self::default()
          }
        },
        Err(e) => {
          error!(target: "dictapp_gateway", %path, error = %e, "Failed to read TOML config file; using defaults");
          Self::default()
        }
      },
      Err(_) => Self::default(),
    };

    if let Ok(url) = std::env::var("BACKEND_BASE_URL") {
      cfg.backend.base_url = url;
    }
    match std::env::var("PAYPAL_SANDBOX").as_deref() {
      Ok("1") | Ok("true") => cfg.backend.paypal_sandbox = true,
      Ok("0") | Ok("false") => cfg.backend.paypal_sandbox = false,
      Ok(other) => warn!(target: "dictapp_gateway", value = %other, "Ignoring unrecognized PAYPAL_SANDBOX"),
      Err(_) => {}
    }
    cfg.backend.base_url = cfg.backend.base_url.trim_end_matches('/').to_string();
    cfg
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_toml_gives_defaults() {
    let cfg = GatewayConfig::from_toml("").unwrap();
    assert_eq!(cfg.catalog.chapter_count, 12);
    assert_eq!(cfg.catalog.page_size, 6);
    assert_eq!(cfg.access.tier_mode, TierMode::Exact);
    assert_eq!(cfg.lounge.presence_every(), Duration::from_secs(15));
    assert_eq!(cfg.lounge.heartbeat_every(), Duration::from_secs(30));
  }

  #[test]
  fn partial_sections_keep_other_defaults() {
    let cfg = GatewayConfig::from_toml(
      r#"
        [access]
        tier_mode = "cumulative"
        [catalog]
        page_size = 4
        [backend]
        base_url = "http://localhost:5000"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.policy().mode, TierMode::Cumulative);
    assert_eq!(cfg.catalog().total_pages(), 3);
    assert_eq!(cfg.backend.base_url, "http://localhost:5000");
    assert_eq!(cfg.backend.timeout_secs, 15);
  }

  #[test]
  fn bad_tier_mode_is_an_error() {
    assert!(GatewayConfig::from_toml("[access]\ntier_mode = \"everything\"").is_err());
  }
}
