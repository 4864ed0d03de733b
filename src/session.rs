//! Per-session role state.
//!
//! The role is refetched on login and on every focus. Refetches may overlap,
//! so each one is tagged with a ticket and a response is applied only if no
//! newer response has landed and the session has not logged out since the
//! ticket was issued.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::backend::{fetch_role_or_absent, Backend};
use crate::entitlement::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
  seq: u64,
  epoch: u64,
}

impl FetchTicket {
  pub fn seq(&self) -> u64 { self.seq }
}

#[derive(Debug, Default)]
struct TrackerState {
  role: Option<Role>,
  issued: u64,
  applied: u64,
  /// Bumped on logout; tickets from an older epoch are dropped.
  epoch: u64,
}

#[derive(Clone, Debug, Default)]
pub struct RoleTracker {
  state: Arc<RwLock<TrackerState>>,
}

impl RoleTracker {
  pub fn new() -> Self { Self::default() }

  pub async fn current(&self) -> Option<Role> {
    self.state.read().await.role.clone()
  }

  pub async fn begin_fetch(&self) -> FetchTicket {
    let mut st = self.state.write().await;
    st.issued += 1;
    FetchTicket { seq: st.issued, epoch: st.epoch }
  }

  /// Apply a fetched role. Returns false when the response is stale.
  pub async fn complete(&self, ticket: FetchTicket, role: Option<Role>) -> bool {
    let mut st = self.state.write().await;
    if ticket.epoch != st.epoch || ticket.seq <= st.applied {
      debug!(target: "access", seq = ticket.seq, applied = st.applied, "Discarding stale role response");
      return false;
    }
    st.applied = ticket.seq;
    if st.role != role {
      info!(target: "access", seq = ticket.seq, role = ?role.as_ref().map(Role::as_str), "Session role changed");
    }
    st.role = role;
    true
  }

  /// Back to "no role"; in-flight fetches are invalidated.
  pub async fn logout(&self) {
    let mut st = self.state.write().await;
    st.epoch += 1;
    st.applied = st.issued;
    st.role = None;
  }

  /// True while `ticket` is the last applied response of the current login.
  pub async fn is_latest(&self, ticket: FetchTicket) -> bool {
    let st = self.state.read().await;
    st.epoch == ticket.epoch && st.applied == ticket.seq
  }

  /// Fetch the role for an already issued ticket and apply it. Returns the
  /// applied role, or `Refetch::Superseded` when a newer response or a logout
  /// got there first.
  #[instrument(level = "debug", skip_all, fields(seq = ticket.seq, has_token = token.is_some()))]
  pub async fn refresh(&self, ticket: FetchTicket, backend: &dyn Backend, token: Option<&str>) -> Refetch {
    let role = fetch_role_or_absent(backend, token).await;
    if self.complete(ticket, role.clone()).await {
      Refetch::Applied(role)
    } else {
      Refetch::Superseded
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Refetch {
  Applied(Option<Role>),
  Superseded,
}
