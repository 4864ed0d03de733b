//! Router assembly: HTTP endpoints, WebSocket session, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket session at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/level", get(http::http_get_level))
        .route("/api/v1/chapters", get(http::http_get_chapters))
        .route("/api/v1/chapters/:number", get(http::http_get_chapter))
        .route("/api/v1/quiz-results", put(http::http_put_quiz_result))
        .route("/api/v1/performance", get(http::http_get_performance))
        .route("/api/v1/plans", get(http::http_get_plans))
        .route("/api/v1/checkout", post(http::http_post_checkout))
        .route("/api/v1/search", get(http::http_get_search))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
