//! In-memory `Backend` used by unit and router tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{Backend, BackendError};
use crate::domain::{CommunityMessage, OnlineUser, QuizResult, VocabItem};
use crate::entitlement::{ChapterIndex, ProficiencyLevel, Role};

#[derive(Default)]
pub struct FakeBackend {
  /// token → role; tokens not listed are rejected with 401.
  pub roles: Mutex<HashMap<String, Option<Role>>>,
  pub fail_all: bool,
  pub saved: Mutex<Vec<QuizResult>>,
  pub messages: Mutex<Vec<CommunityMessage>>,
  pub online: Vec<OnlineUser>,
  pub heartbeats: AtomicUsize,
  pub presence_calls: AtomicUsize,
  /// Per-call latency for `fetch_role`, consumed front to back.
  pub role_delays: Mutex<VecDeque<Duration>>,
}

impl FakeBackend {
  pub fn with_role(self, token: &str, role: Option<Role>) -> Self {
    self.roles.lock().unwrap().insert(token.to_string(), role);
    self
  }

  pub fn with_role_delays(self, delays: &[Duration]) -> Self {
    self.role_delays.lock().unwrap().extend(delays.iter().copied());
    self
  }

  pub fn set_role(&self, token: &str, role: Option<Role>) {
    self.roles.lock().unwrap().insert(token.to_string(), role);
  }

  fn check(&self, token: Option<&str>) -> Result<(), BackendError> {
    if self.fail_all {
      return Err(BackendError::Status { status: 503, body: "down".into() });
    }
    match token {
      Some(t) if self.roles.lock().unwrap().contains_key(t) => Ok(()),
      Some(_) => Err(BackendError::Status { status: 401, body: "bad token".into() }),
      None => Err(BackendError::Unauthenticated),
    }
  }
}

pub fn vocab(word: &str) -> VocabItem {
  VocabItem { word: word.into(), english: format!("{word}-en"), sentence: format!("{word}!"), ..Default::default() }
}

#[async_trait]
impl Backend for FakeBackend {
  async fn fetch_role(&self, token: Option<&str>) -> Result<Option<Role>, BackendError> {
    let delay = self.role_delays.lock().unwrap().pop_front();
    if let Some(d) = delay {
      tokio::time::sleep(d).await;
    }
    self.check(token)?;
    Ok(token.and_then(|t| self.roles.lock().unwrap().get(t).cloned().flatten()))
  }

  async fn fetch_chapter(&self, _token: Option<&str>, chapter: ChapterIndex, level: ProficiencyLevel) -> Result<Vec<VocabItem>, BackendError> {
    if self.fail_all {
      return Err(BackendError::Status { status: 503, body: "down".into() });
    }
    Ok(vec![vocab(&format!("{level}-{chapter}"))])
  }

  async fn save_quiz_result(&self, token: &str, result: &QuizResult) -> Result<(), BackendError> {
    self.check(Some(token))?;
    self.saved.lock().unwrap().push(result.clone());
    Ok(())
  }

  async fn quiz_results(&self, token: &str) -> Result<Vec<QuizResult>, BackendError> {
    self.check(Some(token))?;
    Ok(self.saved.lock().unwrap().clone())
  }

  async fn create_order(&self, token: &str, level: ProficiencyLevel) -> Result<String, BackendError> {
    self.check(Some(token))?;
    Ok(format!("ORDER-{level}"))
  }

  async fn community_messages(&self, token: &str) -> Result<Vec<CommunityMessage>, BackendError> {
    self.check(Some(token))?;
    Ok(self.messages.lock().unwrap().clone())
  }

  async fn post_message(&self, token: &str, text: &str) -> Result<(), BackendError> {
    self.check(Some(token))?;
    self.messages.lock().unwrap().push(CommunityMessage {
      text: text.into(),
      user_email: format!("{token}@example.com"),
      display_name: None,
      created_at: None,
    });
    Ok(())
  }

  async fn heartbeat(&self, token: &str) -> Result<(), BackendError> {
    self.heartbeats.fetch_add(1, Ordering::SeqCst);
    self.check(Some(token))
  }

  async fn online_users(&self, token: &str) -> Result<Vec<OnlineUser>, BackendError> {
    self.presence_calls.fetch_add(1, Ordering::SeqCst);
    self.check(Some(token))?;
    Ok(self.online.clone())
  }

  async fn search(&self, token: Option<&str>, word: &str) -> Result<Option<serde_json::Value>, BackendError> {
    if self.fail_all {
      return Err(BackendError::Status { status: 503, body: "down".into() });
    }
    let _ = token;
    Ok(if word == "haus" { Some(serde_json::json!({ "word": "Haus", "english": "house" })) } else { None })
  }
}
