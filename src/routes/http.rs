//! HTTP endpoint handlers. Read-only views over shared state plus a payload preview.
//! Gameplay itself runs over the WebSocket, where each session owns its engine.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::parser::parse_qr_payload;
use crate::persistence::load_profile;
use crate::protocol::*;
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, persistent: state.persistent })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let entries = state.leaderboard.load();
  info!(target: "leaderboard", count = entries.len(), "HTTP leaderboard served");
  Json(LeaderboardOut { entries })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_profile(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(load_profile(state.kv.as_ref(), &state.config.profile))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.config.rules.clone())
}

#[instrument(level = "info", skip(body), fields(payload_len = body.payload.len()))]
pub async fn http_post_parse(Json(body): Json<ParseIn>) -> impl IntoResponse {
  let q = parse_qr_payload(&body.payload);
  info!(target: "scan", id = %q.id, kind = ?q.kind, payload = %trunc_for_log(&body.payload, 80), "HTTP payload preview");
  Json(ParseOut { has_answer: q.answer.is_some(), question: to_out(&q) })
}
