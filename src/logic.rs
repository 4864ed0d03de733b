//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Every gated operation fetches the caller's role fresh, resolves the level,
//! and asks the one `AccessPolicy`. A failed role fetch is "no role".

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::backend::{approval_url, fetch_role_or_absent, BackendError};
use crate::catalog::ChapterListing;
use crate::domain::{QuizResult, Surface};
use crate::entitlement::{can_search, resolve_level, ChapterIndex, ProficiencyLevel, Role};
use crate::lounge::ChatError;
use crate::performance::PerformanceSummary;
use crate::protocol::{ChapterOut, ChapterQuery, CheckoutOut, LevelOut, QuizResultIn, VocabItemOut};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("login required")]
  Unauthenticated,
  #[error("page {0} is out of range")]
  BadPage(u32),
  #[error("{0}")]
  BadRequest(String),
  #[error("chapter {0} does not exist")]
  NoSuchChapter(u32),
  #[error("chapter {chapter} is locked at level {level}")]
  Locked { chapter: ChapterIndex, level: ProficiencyLevel },
  #[error("search needs a paid plan")]
  SearchLocked,
  #[error("backend unavailable: {0}")]
  Upstream(#[from] BackendError),
}

impl From<ChatError> for GatewayError {
  fn from(e: ChatError) -> Self {
    match e {
      ChatError::Empty => GatewayError::BadRequest("message is empty".into()),
      ChatError::Backend(b) => GatewayError::Upstream(b),
    }
  }
}

fn require_token(token: Option<&str>) -> Result<&str, GatewayError> {
  token.ok_or(GatewayError::Unauthenticated)
}

#[instrument(level = "debug", skip_all, fields(has_token = token.is_some()))]
pub async fn current_role(state: &AppState, token: Option<&str>) -> Option<Role> {
  fetch_role_or_absent(state.backend.as_ref(), token).await
}

pub async fn level_for(state: &AppState, token: Option<&str>) -> LevelOut {
  let role = current_role(state, token).await;
  LevelOut { level: resolve_level(role.as_ref()), role }
}

/// Render a page of the Learn or Quiz list for a known role.
pub fn listing_for(state: &AppState, surface: Surface, role: Option<&Role>, page: u32) -> Result<ChapterListing, GatewayError> {
  state
    .catalog
    .listing(surface, role, &state.policy, page)
    .ok_or(GatewayError::BadPage(page))
}

#[instrument(level = "info", skip(state, token), fields(has_token = token.is_some()))]
pub async fn list_chapters(state: &AppState, token: Option<&str>, surface: Surface, page: u32) -> Result<ChapterListing, GatewayError> {
  if state.catalog.page(page).is_none() {
    return Err(GatewayError::BadPage(page));
  }
  let role = current_role(state, token).await;
  listing_for(state, surface, role.as_ref(), page)
}

/// Navigation attempt into a chapter: gate, then fetch its words.
#[instrument(level = "info", skip(state, token, q), fields(has_token = token.is_some(), surface = ?q.surface))]
pub async fn open_chapter(state: &AppState, token: Option<&str>, number: u32, q: &ChapterQuery) -> Result<ChapterOut, GatewayError> {
  let chapter = ChapterIndex::new(number)
    .filter(|c| state.catalog.contains(*c))
    .ok_or(GatewayError::NoSuchChapter(number))?;

  let role = current_role(state, token).await;
  let level = q.level.unwrap_or_else(|| resolve_level(role.as_ref()));
  if !state.policy.decide_at(chapter, role.as_ref(), level).is_allowed() {
    info!(target: "access", %chapter, %level, role = ?role.as_ref().map(Role::as_str), "Chapter locked");
    return Err(GatewayError::Locked { chapter, level });
  }

  let items = state.backend.fetch_chapter(token, chapter, level).await?;
  let items = items
    .into_iter()
    .map(|item| VocabItemOut { gloss: item.gloss(q.language).to_string(), item })
    .collect();
  Ok(ChapterOut { number: chapter, level, surface: q.surface, items })
}

/// Save a self-graded quiz answer; the chapter must be open at that level.
#[instrument(level = "info", skip(state, token, body), fields(chapter = %body.chapter, level = %body.level))]
pub async fn record_quiz_result(state: &AppState, token: Option<&str>, body: QuizResultIn) -> Result<(), GatewayError> {
  let token = require_token(token)?;
  if !state.catalog.contains(body.chapter) {
    return Err(GatewayError::NoSuchChapter(body.chapter.get()));
  }
  let role = current_role(state, Some(token)).await;
  if !state.policy.decide_at(body.chapter, role.as_ref(), body.level).is_allowed() {
    return Err(GatewayError::Locked { chapter: body.chapter, level: body.level });
  }
  let row = QuizResult {
    chapter: body.chapter,
    level: body.level.as_str().to_string(),
    result: body.result,
    word: body.word,
    bangla: body.bangla,
    english: body.english,
    sentence: body.sentence,
  };
  state.backend.save_quiz_result(token, &row).await?;
  Ok(())
}

#[instrument(level = "info", skip_all)]
pub async fn performance(state: &AppState, token: Option<&str>) -> Result<PerformanceSummary, GatewayError> {
  let token = require_token(token)?;
  let level = resolve_level(current_role(state, Some(token)).await.as_ref());
  let results = state.backend.quiz_results(token).await?;
  Ok(PerformanceSummary::for_level(&results, level))
}

#[instrument(level = "info", skip_all, fields(%level))]
pub async fn checkout(state: &AppState, token: Option<&str>, level: ProficiencyLevel) -> Result<CheckoutOut, GatewayError> {
  let token = require_token(token)?;
  let order_id = state.backend.create_order(token, level).await?;
  info!(target: "dictapp_gateway", %level, "Checkout order created");
  Ok(CheckoutOut { approval_url: approval_url(&order_id, state.paypal_sandbox), order_id })
}

#[instrument(level = "info", skip_all, fields(word_len = word.len()))]
pub async fn search(state: &AppState, token: Option<&str>, word: &str) -> Result<Option<serde_json::Value>, GatewayError> {
  let word = word.trim();
  if word.is_empty() {
    return Err(GatewayError::BadRequest("word is empty".into()));
  }
  let token = require_token(token)?;
  let role = current_role(state, Some(token)).await;
  if !can_search(role.as_ref()) {
    info!(target: "access", role = ?role.as_ref().map(Role::as_str), "Search locked");
    return Err(GatewayError::SearchLocked);
  }
  match state.backend.search(Some(token), word).await {
    Ok(v) => Ok(v),
    Err(e) => {
      warn!(target: "dictapp_gateway", error = %e, "Search failed");
      Err(e.into())
    }
  }
}
