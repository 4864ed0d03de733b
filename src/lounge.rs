//! Speaking lounge: heartbeat + online-user polling, and the community chat.
//!
//! Presence is best effort. Polling runs as two periodic tasks that are
//! aborted when the poller is shut down or dropped, so a closed session never
//! leaves timers behind.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, BackendError};
use crate::config::LoungeCfg;
use crate::domain::{CommunityMessage, OnlineUser};

#[derive(Debug, Error)]
pub enum ChatError {
  #[error("message is empty")]
  Empty,
  #[error(transparent)]
  Backend(#[from] BackendError),
}

pub struct LoungePoller {
  heartbeat: JoinHandle<()>,
  presence: JoinHandle<()>,
}

impl LoungePoller {
  /// Start both loops. Each fires immediately, then on its interval.
  /// Presence snapshots go to `sink`; the presence loop ends when `sink` is closed.
  pub fn spawn(backend: Arc<dyn Backend>, token: String, cfg: &LoungeCfg, sink: mpsc::Sender<Vec<OnlineUser>>) -> Self {
    info!(target: "lounge", heartbeat = ?cfg.heartbeat_every(), presence = ?cfg.presence_every(), "Lounge polling started");
    let heartbeat = tokio::spawn(heartbeat_loop(backend.clone(), token.clone(), cfg.heartbeat_every()));
    let presence = tokio::spawn(presence_loop(backend, token, cfg.presence_every(), sink));
    Self { heartbeat, presence }
  }

  pub fn shutdown(self) {
    // Drop does the work.
  }
}

impl Drop for LoungePoller {
  fn drop(&mut self) {
    self.heartbeat.abort();
    self.presence.abort();
    info!(target: "lounge", "Lounge polling stopped");
  }
}

async fn heartbeat_loop(backend: Arc<dyn Backend>, token: String, every: Duration) {
  let mut tick = interval(every);
  tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
  loop {
    tick.tick().await;
    if let Err(e) = backend.heartbeat(&token).await {
      debug!(target: "lounge", error = %e, "Heartbeat failed; ignored");
    }
  }
}

async fn presence_loop(backend: Arc<dyn Backend>, token: String, every: Duration, sink: mpsc::Sender<Vec<OnlineUser>>) {
  let mut tick = interval(every);
  tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
  loop {
    tick.tick().await;
    match backend.online_users(&token).await {
      Ok(users) => {
        if sink.send(users).await.is_err() {
          break;
        }
      }
      Err(e) => warn!(target: "lounge", error = %e, "Online users fetch failed"),
    }
  }
}

#[instrument(level = "debug", skip_all)]
pub async fn load_messages(backend: &dyn Backend, token: &str) -> Result<Vec<CommunityMessage>, ChatError> {
  Ok(backend.community_messages(token).await?)
}

/// Post a trimmed message and return the reloaded list.
#[instrument(level = "info", skip_all, fields(text_len = text.len()))]
pub async fn send_message(backend: &dyn Backend, token: &str, text: &str) -> Result<Vec<CommunityMessage>, ChatError> {
  let text = text.trim();
  if text.is_empty() {
    return Err(ChatError::Empty);
  }
  backend.post_message(token, text).await?;
  load_messages(backend, token).await
}
