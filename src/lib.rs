//! Dictapp gateway: chapter entitlement for the vocabulary app.
//!
//! The `entitlement` module is the pure policy every screen asks (role →
//! level, chapter → open/locked). The rest wraps it for the mobile client:
//! a backend client, per-session role refresh, the chapter catalog, quiz
//! performance, the speaking lounge poller, and an axum HTTP/WebSocket surface.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod entitlement;
pub mod logic;
pub mod lounge;
pub mod performance;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;
