//! Client for the vocabulary backend (user directory, chapters, quiz results,
//! payments, community lounge).
//!
//! The `Backend` trait is the service boundary; `HttpBackend` is the reqwest
//! implementation. Calls are instrumented with path, status and latency. The
//! bearer token is attached per call and never logged.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::config::BackendCfg;
use crate::domain::{CommunityMessage, OnlineUser, QuizResult, VocabItem};
use crate::entitlement::{ChapterIndex, ProficiencyLevel, Role};
use crate::util::trunc_for_log;

#[derive(Debug, Error)]
pub enum BackendError {
  #[error("no session token")]
  Unauthenticated,
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("backend HTTP {status}: {body}")]
  Status { status: u16, body: String },
  #[error("unexpected response: {0}")]
  Decode(String),
}

impl BackendError {
  /// Upstream rejected the token.
  pub fn is_auth(&self) -> bool {
    matches!(self, BackendError::Unauthenticated | BackendError::Status { status: 401 | 403, .. })
  }
}

/// Operations the gateway needs from the backend. `token` is the caller's
/// bearer token as received; `None` means an anonymous caller.
#[async_trait]
pub trait Backend: Send + Sync {
  async fn fetch_role(&self, token: Option<&str>) -> Result<Option<Role>, BackendError>;
  async fn fetch_chapter(&self, token: Option<&str>, chapter: ChapterIndex, level: ProficiencyLevel) -> Result<Vec<VocabItem>, BackendError>;
  async fn save_quiz_result(&self, token: &str, result: &QuizResult) -> Result<(), BackendError>;
  async fn quiz_results(&self, token: &str) -> Result<Vec<QuizResult>, BackendError>;
  async fn create_order(&self, token: &str, level: ProficiencyLevel) -> Result<String, BackendError>;
  async fn community_messages(&self, token: &str) -> Result<Vec<CommunityMessage>, BackendError>;
  async fn post_message(&self, token: &str, text: &str) -> Result<(), BackendError>;
  async fn heartbeat(&self, token: &str) -> Result<(), BackendError>;
  async fn online_users(&self, token: &str) -> Result<Vec<OnlineUser>, BackendError>;
  async fn search(&self, token: Option<&str>, word: &str) -> Result<Option<serde_json::Value>, BackendError>;
}

/// Fetch the role, folding every failure into "no role".
///
/// Anonymous callers skip the round trip entirely.
pub async fn fetch_role_or_absent(backend: &dyn Backend, token: Option<&str>) -> Option<Role> {
  if token.is_none() {
    return None;
  }
  match backend.fetch_role(token).await {
    Ok(role) => role,
    Err(e) => {
      warn!(target: "access", error = %e, "Role fetch failed; treating as no role");
      None
    }
  }
}

/// Checkout page for an order id returned by `create_order`.
pub fn approval_url(order_id: &str, sandbox: bool) -> String {
  let host = if sandbox { "www.sandbox.paypal.com" } else { "www.paypal.com" };
  format!("https://{host}/checkoutnow?token={order_id}")
}

#[derive(Deserialize)]
struct RoleOut {
  #[serde(default)]
  role: Option<String>,
}

#[derive(Serialize)]
struct OrderIn {
  level: ProficiencyLevel,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderOut {
  #[serde(default)]
  order_id: Option<String>,
}

#[derive(Serialize)]
struct MessageIn<'a> {
  text: &'a str,
}

#[derive(Clone)]
pub struct HttpBackend {
  pub client: reqwest::Client,
  pub base_url: String,
}

impl HttpBackend {
  pub fn new(cfg: &BackendCfg) -> Result<Self, BackendError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
      .build()?;
    Ok(Self { client, base_url: cfg.base_url.trim_end_matches('/').to_string() })
  }

  fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
    let url = format!("{}{}", self.base_url, path);
    let rb = self.client.request(method, url).header(USER_AGENT, "dictapp-gateway/0.1");
    match token {
      Some(t) => rb.header(AUTHORIZATION, format!("Bearer {t}")),
      None => rb,
    }
  }

  /// Send and check the status; body left for the caller.
  async fn send(&self, rb: RequestBuilder, path: &str) -> Result<reqwest::Response, BackendError> {
    let start = Instant::now();
    let res = rb.send().await.map_err(|e| {
      error!(target: "dictapp_gateway", %path, error = %e, "Backend request failed");
      BackendError::Transport(e)
    })?;
    let status = res.status();
    debug!(target: "dictapp_gateway", %path, status = status.as_u16(), elapsed = ?start.elapsed(), "Backend responded");
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      return Err(BackendError::Status { status: status.as_u16(), body: trunc_for_log(&body, 200) });
    }
    Ok(res)
  }

  async fn send_json<T: DeserializeOwned>(&self, rb: RequestBuilder, path: &str) -> Result<T, BackendError> {
    let res = self.send(rb, path).await?;
    let text = res.text().await?;
    serde_json::from_str::<T>(&text).map_err(|e| BackendError::Decode(format!("{path}: {e}")))
  }

  /// Lists come back as `null` when empty.
  async fn send_list<T: DeserializeOwned>(&self, rb: RequestBuilder, path: &str) -> Result<Vec<T>, BackendError> {
    let items: Option<Vec<T>> = self.send_json(rb, path).await?;
    Ok(items.unwrap_or_default())
  }
}

#[async_trait]
impl Backend for HttpBackend {
  #[instrument(level = "info", skip_all, fields(has_token = token.is_some()))]
  async fn fetch_role(&self, token: Option<&str>) -> Result<Option<Role>, BackendError> {
    let path = "/users/role/me";
    let out: RoleOut = self.send_json(self.request(Method::GET, path, token), path).await?;
    Ok(Role::from_wire(out.role.as_deref()))
  }

  #[instrument(level = "info", skip_all, fields(%chapter, %level))]
  async fn fetch_chapter(&self, token: Option<&str>, chapter: ChapterIndex, level: ProficiencyLevel) -> Result<Vec<VocabItem>, BackendError> {
    let path = format!("/chapter/{chapter}");
    let rb = self.request(Method::GET, &path, token).query(&[("level", level.as_str())]);
    self.send_list(rb, &path).await
  }

  #[instrument(level = "info", skip_all, fields(chapter = %result.chapter, level = %result.level))]
  async fn save_quiz_result(&self, token: &str, result: &QuizResult) -> Result<(), BackendError> {
    let path = "/quiz-results";
    self.send(self.request(Method::PUT, path, Some(token)).json(result), path).await?;
    Ok(())
  }

  #[instrument(level = "info", skip_all)]
  async fn quiz_results(&self, token: &str) -> Result<Vec<QuizResult>, BackendError> {
    let path = "/quiz-results";
    self.send_list(self.request(Method::GET, path, Some(token)), path).await
  }

  #[instrument(level = "info", skip_all, fields(%level))]
  async fn create_order(&self, token: &str, level: ProficiencyLevel) -> Result<String, BackendError> {
    let path = "/paypal/create-order";
    let rb = self.request(Method::POST, path, Some(token)).json(&OrderIn { level });
    let out: OrderOut = self.send_json(rb, path).await?;
    out.order_id
      .filter(|id| !id.is_empty())
      .ok_or_else(|| BackendError::Decode("create-order returned no orderId".into()))
  }

  #[instrument(level = "debug", skip_all)]
  async fn community_messages(&self, token: &str) -> Result<Vec<CommunityMessage>, BackendError> {
    let path = "/community/messages";
    self.send_list(self.request(Method::GET, path, Some(token)), path).await
  }

  #[instrument(level = "info", skip_all, fields(text_len = text.len()))]
  async fn post_message(&self, token: &str, text: &str) -> Result<(), BackendError> {
    let path = "/community/messages";
    self.send(self.request(Method::POST, path, Some(token)).json(&MessageIn { text }), path).await?;
    Ok(())
  }

  #[instrument(level = "debug", skip_all)]
  async fn heartbeat(&self, token: &str) -> Result<(), BackendError> {
    let path = "/me/heartbeat";
    self.send(self.request(Method::POST, path, Some(token)), path).await?;
    Ok(())
  }

  #[instrument(level = "debug", skip_all)]
  async fn online_users(&self, token: &str) -> Result<Vec<OnlineUser>, BackendError> {
    let path = "/online-users";
    self.send_list(self.request(Method::GET, path, Some(token)), path).await
  }

  #[instrument(level = "info", skip_all, fields(word_len = word.len()))]
  async fn search(&self, token: Option<&str>, word: &str) -> Result<Option<serde_json::Value>, BackendError> {
    let path = "/search";
    let rb = self.request(Method::GET, path, token).query(&[("word", word)]);
    let value: serde_json::Value = self.send_json(rb, path).await?;
    let empty = match &value {
      serde_json::Value::Null => true,
      serde_json::Value::Object(m) => m.is_empty(),
      serde_json::Value::Array(a) => a.is_empty(),
      _ => false,
    };
    Ok(if empty { None } else { Some(value) })
  }
}
