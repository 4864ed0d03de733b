//! WebSocket session channel.
//!
//! One socket is one foreground app session. `focus` refetches the role with a
//! tagged request and replies with a fresh chapter list. Tickets are issued in
//! message order, and a listing is written only while its ticket is still the
//! latest applied one, so replies from older refetches that finish late are
//! dropped. While a token is present the lounge
//! poller pushes presence snapshots; it is torn down on logout or disconnect.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  http::HeaderMap,
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::domain::{CommunityMessage, OnlineUser, Surface};
use crate::logic::listing_for;
use crate::lounge::{load_messages, send_message, LoungePoller};
use crate::protocol::{ClientWsMessage, MessageOut, PresenceOut, ServerWsMessage, WsQuery};
use crate::session::{FetchTicket, Refetch, RoleTracker};
use crate::state::AppState;
use crate::util::bearer_token;

#[instrument(level = "info", skip_all)]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<WsQuery>,
) -> impl IntoResponse {
  let token = bearer_token(&headers).or(q.token.filter(|t| !t.trim().is_empty()));
  info!(target: "dictapp_gateway", has_token = token.is_some(), "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state, token))
}

/// A listing tagged with the refetch that produced it.
struct Outbound {
  ticket: FetchTicket,
  msg: ServerWsMessage,
}

struct Session {
  id: Uuid,
  state: Arc<AppState>,
  token: Option<String>,
  tracker: RoleTracker,
  out: mpsc::Sender<Outbound>,
  presence: mpsc::Sender<Vec<OnlineUser>>,
  poller: Option<LoungePoller>,
}

impl Session {
  fn new(state: Arc<AppState>, token: Option<String>) -> (Self, mpsc::Receiver<Outbound>, mpsc::Receiver<Vec<OnlineUser>>) {
    let (out_tx, out_rx) = mpsc::channel(16);
    let (presence_tx, presence_rx) = mpsc::channel(4);
    let session = Self {
      id: Uuid::new_v4(),
      state,
      token,
      tracker: RoleTracker::new(),
      out: out_tx,
      presence: presence_tx,
      poller: None,
    };
    (session, out_rx, presence_rx)
  }

  fn start_lounge(&mut self) {
    if let Some(token) = &self.token {
      self.poller = Some(LoungePoller::spawn(self.state.backend.clone(), token.clone(), &self.state.lounge, self.presence.clone()));
    }
  }

  /// Login counts as a focus event.
  async fn connect(&mut self) {
    self.start_lounge();
    self.focus(Surface::Learn, 1).await;
  }

  /// Issue a ticket now, then refetch and render in the background.
  async fn focus(&self, surface: Surface, page: u32) {
    let ticket = self.tracker.begin_fetch().await;
    let state = self.state.clone();
    let tracker = self.tracker.clone();
    let token = self.token.clone();
    let out = self.out.clone();
    let id = self.id;
    tokio::spawn(async move {
      let role = match tracker.refresh(ticket, state.backend.as_ref(), token.as_deref()).await {
        Refetch::Applied(role) => role,
        Refetch::Superseded => {
          debug!(target: "access", session = %id, seq = ticket.seq(), "Focus superseded; listing not sent");
          return;
        }
      };
      let msg = match listing_for(&state, surface, role.as_ref(), page) {
        Ok(listing) => ServerWsMessage::Chapters { listing },
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      };
      let _ = out.send(Outbound { ticket, msg }).await;
    });
  }

  /// Listings overtaken by a newer focus or a logout are not written.
  async fn deliver(&self, outbound: Outbound) -> Option<ServerWsMessage> {
    if self.tracker.is_latest(outbound.ticket).await {
      Some(outbound.msg)
    } else {
      debug!(target: "access", session = %self.id, seq = outbound.ticket.seq(), "Dropping overtaken listing");
      None
    }
  }

  async fn logout(&mut self) {
    self.poller.take();
    self.token = None;
    self.tracker.logout().await;
    info!(target: "dictapp_gateway", session = %self.id, "Session logged out");
  }

  async fn handle_text(&mut self, txt: &str) -> Option<ServerWsMessage> {
    match serde_json::from_str::<ClientWsMessage>(txt) {
      Ok(msg) => {
        debug!(target: "dictapp_gateway", session = %self.id, "WS received: {:?}", &msg);
        self.handle(msg).await
      }
      Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
    }
  }

  async fn handle(&mut self, msg: ClientWsMessage) -> Option<ServerWsMessage> {
    match msg {
      ClientWsMessage::Ping => Some(ServerWsMessage::Pong),
      ClientWsMessage::Focus { surface, page } => {
        self.focus(surface, page).await;
        None
      }
      ClientWsMessage::Logout => {
        self.logout().await;
        Some(ServerWsMessage::LoggedOut)
      }
      ClientWsMessage::LoadMessages => {
        let Some(token) = self.token.as_deref() else {
          return Some(login_required());
        };
        Some(match load_messages(self.state.backend.as_ref(), token).await {
          Ok(list) => messages_out(list),
          Err(e) => ServerWsMessage::Error { message: e.to_string() },
        })
      }
      ClientWsMessage::SendMessage { text } => {
        let Some(token) = self.token.as_deref() else {
          return Some(login_required());
        };
        Some(match send_message(self.state.backend.as_ref(), token, &text).await {
          Ok(list) => messages_out(list),
          Err(e) => ServerWsMessage::Error { message: e.to_string() },
        })
      }
    }
  }
}

fn login_required() -> ServerWsMessage {
  ServerWsMessage::Error { message: "login required".into() }
}

fn messages_out(list: Vec<CommunityMessage>) -> ServerWsMessage {
  ServerWsMessage::Messages { messages: list.into_iter().map(MessageOut::from).collect() }
}

async fn send_json(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  if let Err(e) = socket.send(Message::Text(out)).await {
    error!(target: "dictapp_gateway", error = %e, "WS send error");
    return false;
  }
  true
}

#[instrument(level = "info", skip_all)]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, token: Option<String>) {
  let (mut session, mut out_rx, mut presence_rx) = Session::new(state, token);
  info!(target: "dictapp_gateway", session = %session.id, "WebSocket connected");
  session.connect().await;

  loop {
    tokio::select! {
      incoming = socket.recv() => {
        let txt = match incoming {
          Some(Ok(Message::Text(txt))) => txt,
          Some(Ok(Message::Ping(payload))) => { let _ = socket.send(Message::Pong(payload)).await; continue; }
          Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
          Some(Ok(_)) => continue,
        };
        if let Some(reply) = session.handle_text(&txt).await {
          if !send_json(&mut socket, &reply).await { break; }
        }
      }
      Some(users) = presence_rx.recv() => {
        if session.poller.is_none() { continue; }
        let users = users.into_iter().map(PresenceOut::from).collect();
        if !send_json(&mut socket, &ServerWsMessage::Presence { users }).await { break; }
      }
      Some(outbound) = out_rx.recv() => {
        let Some(msg) = session.deliver(outbound).await else { continue; };
        if !send_json(&mut socket, &msg).await { break; }
      }
    }
  }

  session.poller.take();
  info!(target: "dictapp_gateway", session = %session.id, "WebSocket disconnected");
}
