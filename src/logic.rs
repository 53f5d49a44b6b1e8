//! Caller-facing operations shared by the HTTP handlers.
//!
//! This includes:
//!   - listing problems for the picker
//!   - selecting a problem (updates the session)
//!   - generating one hint and formatting it with its metrics
//!
//! Validation failures are answered without touching the inference server.

use tracing::{info, instrument, warn};

use crate::domain::Problem;
use crate::error::HintError;
use crate::inference::{GenerationParams, InferenceRequest, InferenceResult};
use crate::prompt::build_prompt;
use crate::session::Selection;
use crate::state::AppState;

pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// Text pair returned to the caller: the hint (or error text) and metrics Markdown.
#[derive(Debug, Clone, PartialEq)]
pub struct HintReply {
  pub hint: String,
  pub metrics: String,
}

pub fn list_problems(state: &AppState) -> Vec<String> {
  state.store.labels()
}

#[instrument(level = "info", skip(state))]
pub async fn select_problem(state: &AppState, selection: &str) -> Selection {
  let mut session = state.session.write().await;
  let previous = session.selected_id().map(String::from);
  let sel = session.select(&state.store, selection, &state.prompts.starter_code);
  info!(target: "problem", ?previous, resolved = ?sel.resolved_id, "Problem selection");
  sel
}

/// Validate, build the prompt and run the inference call.
/// `Err` only for problems caught before the call.
#[instrument(level = "info", skip(state, user_code), fields(code_len = user_code.len(), %temperature, ?problem_id))]
pub async fn request_hint(
  state: &AppState,
  user_code: &str,
  temperature: f32,
  problem_id: Option<&str>,
) -> Result<InferenceResult, HintError> {
  let explicit = problem_id.map(str::trim).filter(|id| !id.is_empty()).map(String::from);
  let problem: Problem = match explicit {
    Some(id) => state.store.find(&id).cloned().ok_or(HintError::ProblemNotFound(id))?,
    None => state
      .session
      .read()
      .await
      .current_problem()
      .cloned()
      .ok_or_else(|| HintError::InvalidInput("Please select a problem first.".into()))?,
  };

  if user_code.trim().is_empty() {
    return Err(HintError::InvalidInput("Please enter your code.".into()));
  }
  if !temperature.is_finite() || !TEMPERATURE_RANGE.contains(&temperature) {
    return Err(HintError::InvalidInput(format!(
      "Temperature must be between {} and {} (got {temperature}).",
      TEMPERATURE_RANGE.start(),
      TEMPERATURE_RANGE.end()
    )));
  }

  let prompt = build_prompt(&state.prompts.hint_template, Some(&problem), user_code)?;
  let g = &state.generation;
  let req = InferenceRequest {
    prompt,
    params: GenerationParams {
      max_tokens: g.max_tokens,
      temperature,
      top_p: g.top_p,
      frequency_penalty: g.frequency_penalty,
      presence_penalty: g.presence_penalty,
    },
    system_prompt: state.prompts.hint_system.clone(),
  };
  Ok(state.client.generate_hint(&req).await)
}

/// Full pipeline, flattened to `(hint_text, metrics_text)`; errors come back as `(error_text, "")`.
#[instrument(level = "info", skip(state, user_code), fields(code_len = user_code.len()))]
pub async fn generate_hint(state: &AppState, user_code: &str, temperature: f32, problem_id: Option<&str>) -> HintReply {
  match request_hint(state, user_code, temperature, problem_id).await {
    Ok(InferenceResult::Success { hint, elapsed, model, tokens, .. }) => {
      let hint = if hint.is_empty() { "(empty response)".to_string() } else { hint };
      HintReply {
        hint,
        metrics: format!(
          "\n## Inference metrics\n- **Elapsed:** {:.3}s\n- **Temperature:** {temperature}\n- **Model:** {model}\n- **Tokens:** {tokens}\n",
          elapsed.as_secs_f64()
        ),
      }
    }
    Ok(InferenceResult::Failure { error, elapsed, .. }) => {
      warn!(target: "hint_backend", kind = error.kind(), ?elapsed, "Hint request failed at the inference server");
      HintReply { hint: format!("❌ Generation failed: {error}"), metrics: String::new() }
    }
    Err(error) => {
      info!(target: "hint_backend", kind = error.kind(), "Hint request rejected");
      HintReply { hint: format!("❌ {error}"), metrics: String::new() }
    }
  }
}
