//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs sizes and basic result info, never code or hint text.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::config::DEFAULT_TEMPERATURE;
use crate::logic::{generate_hint, list_problems, select_problem};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    inference: state.client.health().label(),
    model: state.client.model().to_string(),
    base_url: state.client.base_url().to_string(),
    problems: state.store.len(),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_problems(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(ProblemsOut { problems: list_problems(&state) })
}

#[instrument(level = "info", skip(state, body), fields(selection = %body.selection))]
pub async fn http_post_select(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SelectIn>,
) -> impl IntoResponse {
  let sel = select_problem(&state, &body.selection).await;
  info!(target: "problem", resolved = ?sel.resolved_id, "HTTP problem selected");
  Json(SelectOut::from(sel))
}

#[instrument(level = "info", skip(state, body), fields(code_len = body.user_code.len(), problem_id = ?body.problem_id))]
pub async fn http_post_hint(
  State(state): State<Arc<AppState>>,
  Json(body): Json<HintIn>,
) -> impl IntoResponse {
  let temperature = body.temperature.unwrap_or(DEFAULT_TEMPERATURE);
  let reply = generate_hint(&state, &body.user_code, temperature, body.problem_id.as_deref()).await;
  info!(target: "hint_backend", has_metrics = !reply.metrics.is_empty(), "HTTP hint served");
  Json(HintOut { hint: reply.hint, metrics: reply.metrics })
}
