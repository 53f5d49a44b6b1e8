//! Client for an OpenAI-compatible inference server (vLLM).
//!
//! Two calls only: `GET /models` as a health probe at startup, and one
//! non-streaming `POST /chat/completions` per hint. Every outcome of a hint
//! call is folded into `InferenceResult`; nothing escapes as an error.
//!
//! NOTE: prompts and completions are never logged, only their sizes.

use std::{future::Future, time::{Duration, Instant}};

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::HintError;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a Socratic programming mentor.
Do not give the student direct answers; ask questions and offer hints so they think and discover on their own.
Never mention function names or variable names from the code directly.";

const BACKOFF_BASE: Duration = Duration::from_millis(500);
const BACKOFF_MAX: Duration = Duration::from_secs(8);

#[derive(Debug, Clone)]
pub struct InferenceConfig {
  pub base_url: String,
  pub model: String,
  pub timeout: Duration,
  pub max_retries: u32,
}

/// Result of the startup probe. Advisory only: degraded clients still make calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Health {
  Unknown,
  Healthy { models: Vec<String> },
  Degraded { reason: String },
}

impl Health {
  pub fn label(&self) -> &'static str {
    match self {
      Health::Unknown => "unknown",
      Health::Healthy { .. } => "healthy",
      Health::Degraded { .. } => "degraded",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
  pub max_tokens: u32,
  pub temperature: f32,
  pub top_p: f32,
  pub frequency_penalty: f32,
  pub presence_penalty: f32,
}

impl Default for GenerationParams {
  fn default() -> Self {
    Self { max_tokens: 512, temperature: 0.7, top_p: 0.9, frequency_penalty: 0.0, presence_penalty: 0.0 }
  }
}

#[derive(Debug, Clone)]
pub struct InferenceRequest {
  pub prompt: String,
  pub params: GenerationParams,
  /// Replaces the default Socratic system prompt when set.
  pub system_prompt: Option<String>,
}

/// Outcome of one hint call.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResult {
  Success {
    hint: String,
    elapsed: Duration,
    model: String,
    tokens: u32,
    finish_reason: String,
  },
  Failure {
    error: HintError,
    elapsed: Duration,
    model: String,
  },
}

/// Raw failure of a single HTTP exchange, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum CallFailure {
  Transport { message: String, connect: bool, timeout: bool },
  Http { status: u16, message: String },
  Decode(String),
}

impl CallFailure {
  fn from_reqwest(e: reqwest::Error) -> Self {
    if e.is_decode() {
      return CallFailure::Decode(error_chain(&e));
    }
    CallFailure::Transport { message: error_chain(&e), connect: e.is_connect(), timeout: e.is_timeout() }
  }

  pub fn message(&self) -> String {
    match self {
      CallFailure::Transport { message, .. } | CallFailure::Decode(message) => message.clone(),
      CallFailure::Http { status, message } => format!("HTTP {status}: {message}"),
    }
  }

  fn retryable(&self) -> bool {
    match self {
      CallFailure::Transport { .. } => true,
      CallFailure::Http { status, .. } => *status == 429 || *status >= 500,
      CallFailure::Decode(_) => false,
    }
  }
}

/// Map a raw failure to the user-facing error kind.
/// Connectivity wins over model errors; anything else passes through as-is.
pub fn classify_failure(failure: &CallFailure, base_url: &str, model: &str) -> HintError {
  if matches!(failure, CallFailure::Transport { connect: true, .. } | CallFailure::Transport { timeout: true, .. }) {
    return HintError::EndpointUnreachable { base_url: base_url.to_string() };
  }
  let message = failure.message();
  let lower = message.to_lowercase();
  if message.contains("Connection") || lower.contains("timeout") {
    HintError::EndpointUnreachable { base_url: base_url.to_string() }
  } else if lower.contains("model") {
    HintError::ModelNotFound { model: model.to_string() }
  } else {
    HintError::Unclassified(message)
  }
}

#[derive(Clone)]
pub struct InferenceClient {
  client: reqwest::Client,
  base_url: String,
  model: String,
  max_retries: u32,
  health: Health,
}

impl InferenceClient {
  /// Build the client without touching the network.
  pub fn new(cfg: InferenceConfig) -> Self {
    let client = reqwest::Client::builder()
      .timeout(cfg.timeout)
      .build()
      .unwrap_or_else(|e| {
        warn!(target: "inference", error = %e, "HTTP client builder failed; using defaults without timeout");
        reqwest::Client::new()
      });
    Self {
      client,
      base_url: cfg.base_url.trim_end_matches('/').to_string(),
      model: cfg.model,
      max_retries: cfg.max_retries,
      health: Health::Unknown,
    }
  }

  /// Build the client and run the health probe. Never fails.
  pub async fn connect(cfg: InferenceConfig) -> Self {
    let mut client = Self::new(cfg);
    client.probe().await;
    client
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn health(&self) -> &Health {
    &self.health
  }

  /// Ask the server which models it serves. Falls back to the first served
  /// model when the configured one is absent.
  #[instrument(level = "info", skip(self), fields(base_url = %self.base_url, model = %self.model))]
  pub async fn probe(&mut self) -> &Health {
    let listed = self.with_retries("models", || self.list_models()).await;
    self.health = match listed {
      Ok(models) if !models.is_empty() => {
        info!(target: "inference", base_url = %self.base_url, available = %models.join(", "), "Inference server reachable");
        if !models.iter().any(|m| m == &self.model) {
          warn!(target: "inference", configured = %self.model, using = %models[0], "Configured model not served; using the first available model");
          self.model = models[0].clone();
        }
        Health::Healthy { models }
      }
      Ok(_) => {
        warn!(target: "inference", base_url = %self.base_url, "Inference server has no models loaded");
        Health::Degraded { reason: "no models loaded".into() }
      }
      Err(f) => {
        let reason = f.message();
        warn!(target: "inference", base_url = %self.base_url, error = %reason, "Inference server unreachable; start it with `docker-compose up`");
        Health::Degraded { reason }
      }
    };
    &self.health
  }

  /// One chat completion for `req`, normalized into `InferenceResult`.
  #[instrument(
    level = "info",
    skip(self, req),
    fields(model = %self.model, prompt_len = req.prompt.len(), max_tokens = req.params.max_tokens, temperature = req.params.temperature)
  )]
  pub async fn generate_hint(&self, req: &InferenceRequest) -> InferenceResult {
    let system = req.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let body = ChatCompletionRequest {
      model: &self.model,
      messages: vec![
        ChatMessageReq { role: "system", content: system },
        ChatMessageReq { role: "user", content: &req.prompt },
      ],
      max_tokens: req.params.max_tokens,
      temperature: req.params.temperature,
      top_p: req.params.top_p,
      frequency_penalty: req.params.frequency_penalty,
      presence_penalty: req.params.presence_penalty,
      n: 1,
      stream: false,
    };

    let start = Instant::now();
    let outcome = self.with_retries("chat", || self.chat_once(&body)).await;
    let elapsed = start.elapsed();

    match outcome.and_then(completion_from_response) {
      Ok((hint, tokens, finish_reason)) => {
        info!(target: "inference", ?elapsed, tokens, %finish_reason, hint_len = hint.len(), "Hint generated");
        InferenceResult::Success { hint, elapsed, model: self.model.clone(), tokens, finish_reason }
      }
      Err(f) => {
        let error = classify_failure(&f, &self.base_url, &self.model);
        warn!(target: "inference", ?elapsed, kind = error.kind(), raw = %crate::util::trunc_for_log(&f.message(), 200), "Hint generation failed");
        InferenceResult::Failure { error, elapsed, model: self.model.clone() }
      }
    }
  }

  async fn list_models(&self) -> Result<Vec<String>, CallFailure> {
    let url = format!("{}/models", self.base_url);
    let req = self.client.get(&url).header(USER_AGENT, "hint-backend/0.1");
    let list: ModelList = send_json(req).await?;
    Ok(list.data.into_iter().map(|m| m.id).collect())
  }

  async fn chat_once(&self, body: &ChatCompletionRequest<'_>) -> Result<ChatCompletionResponse, CallFailure> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = self.client.post(&url)
      .header(USER_AGENT, "hint-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(body);
    let res: ChatCompletionResponse = send_json(req).await?;
    if let Some(usage) = &res.usage {
      info!(target: "inference", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Inference usage");
    }
    Ok(res)
  }

  /// Retry transport errors and 429/5xx with exponential backoff.
  async fn with_retries<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, CallFailure>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallFailure>>,
  {
    let mut attempt = 0u32;
    loop {
      match call().await {
        Err(f) if f.retryable() && attempt < self.max_retries => {
          let delay = backoff(attempt);
          warn!(target: "inference", op, attempt = attempt + 1, max_retries = self.max_retries, ?delay, error = %f.message(), "Retrying inference call");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        other => return other,
      }
    }
  }
}

fn backoff(attempt: u32) -> Duration {
  BACKOFF_BASE.saturating_mul(1u32 << attempt.min(5)).min(BACKOFF_MAX)
}

async fn send_json<T: DeserializeOwned>(req: reqwest::RequestBuilder) -> Result<T, CallFailure> {
  let res = req.send().await.map_err(CallFailure::from_reqwest)?;
  let status = res.status();
  if !status.is_success() {
    let body = res.text().await.unwrap_or_default();
    let message = extract_server_error(&body).unwrap_or(body);
    return Err(CallFailure::Http { status: status.as_u16(), message });
  }
  res.json::<T>().await.map_err(CallFailure::from_reqwest)
}

fn completion_from_response(res: ChatCompletionResponse) -> Result<(String, u32, String), CallFailure> {
  let tokens = res.usage.as_ref().and_then(|u| u.completion_tokens).unwrap_or(0);
  let choice = res.choices.into_iter().next()
    .ok_or_else(|| CallFailure::Decode("response contained no choices".into()))?;
  let hint = choice.message.content.unwrap_or_default().trim().to_string();
  let finish_reason = choice.finish_reason.unwrap_or_else(|| "unknown".into());
  Ok((hint, tokens, finish_reason))
}

/// Full `source()` chain; reqwest keeps the useful part ("Connection refused") in the sources.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
  let mut out = e.to_string();
  let mut cur = e.source();
  while let Some(src) = cur {
    out.push_str(": ");
    out.push_str(&src.to_string());
    cur = src.source();
  }
  out
}

/// OpenAI nests the message under `error`; vLLM puts it at the top level.
fn extract_server_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  if let Ok(w) = serde_json::from_str::<EWrap>(body) {
    return Some(w.error.message);
  }
  serde_json::from_str::<EObj>(body).ok().map(|e| e.message)
}

// --- DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessageReq<'a>>,
  max_tokens: u32,
  temperature: f32,
  top_p: f32,
  frequency_penalty: f32,
  presence_penalty: f32,
  n: u32,
  stream: bool,
}
#[derive(Serialize)]
struct ChatMessageReq<'a> { role: &'a str, content: &'a str }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  #[serde(default)] choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
struct ChatMessageResp { #[serde(default)] content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ModelList { #[serde(default)] data: Vec<ModelEntry> }
#[derive(Deserialize)]
struct ModelEntry { id: String }
