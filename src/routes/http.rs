//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! The bearer token is passed through to the backend; only its presence is logged.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::domain::subscription_plans;
use crate::logic::{self, GatewayError};
use crate::protocol::*;
use crate::state::AppState;
use crate::util::bearer_token;

impl IntoResponse for GatewayError {
  fn into_response(self) -> Response {
    let status = match &self {
      GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
      GatewayError::BadPage(_) | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
      GatewayError::NoSuchChapter(_) => StatusCode::NOT_FOUND,
      GatewayError::Locked { .. } | GatewayError::SearchLocked => StatusCode::FORBIDDEN,
      GatewayError::Upstream(e) if e.is_auth() => StatusCode::UNAUTHORIZED,
      GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
      warn!(target: "dictapp_gateway", error = %self, "Request failed upstream");
    }
    (status, Json(ErrorOut { error: self.to_string() })).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip_all)]
pub async fn http_get_level(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
  let token = bearer_token(&headers);
  Json(logic::level_for(&state, token.as_deref()).await)
}

#[instrument(level = "info", skip(state, headers), fields(surface = ?q.surface, page = q.page))]
pub async fn http_get_chapters(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<ChaptersQuery>,
) -> Result<impl IntoResponse, GatewayError> {
  let token = bearer_token(&headers);
  let listing = logic::list_chapters(&state, token.as_deref(), q.surface, q.page).await?;
  let open = listing.chapters.iter().filter(|c| !c.locked).count();
  info!(target: "access", level = %listing.level, page = listing.page, open, "Chapter list served");
  Ok(Json(listing))
}

#[instrument(level = "info", skip(state, headers, q))]
pub async fn http_get_chapter(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(number): Path<u32>,
  Query(q): Query<ChapterQuery>,
) -> Result<impl IntoResponse, GatewayError> {
  let token = bearer_token(&headers);
  let out = logic::open_chapter(&state, token.as_deref(), number, &q).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip_all)]
pub async fn http_put_quiz_result(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<QuizResultIn>,
) -> Result<impl IntoResponse, GatewayError> {
  let token = bearer_token(&headers);
  logic::record_quiz_result(&state, token.as_deref(), body).await?;
  Ok(Json(SavedOut { ok: true }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_get_performance(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
  let token = bearer_token(&headers);
  Ok(Json(logic::performance(&state, token.as_deref()).await?))
}

#[instrument(level = "info")]
pub async fn http_get_plans() -> impl IntoResponse { Json(subscription_plans()) }

#[instrument(level = "info", skip_all, fields(level = %body.level))]
pub async fn http_post_checkout(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CheckoutIn>,
) -> Result<impl IntoResponse, GatewayError> {
  let token = bearer_token(&headers);
  Ok(Json(logic::checkout(&state, token.as_deref(), body.level).await?))
}

#[instrument(level = "info", skip_all, fields(word_len = q.word.len()))]
pub async fn http_get_search(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<SearchQuery>,
) -> Result<impl IntoResponse, GatewayError> {
  let token = bearer_token(&headers);
  let result = logic::search(&state, token.as_deref(), &q.word).await?;
  Ok(Json(SearchOut { found: result.is_some(), result }))
}
