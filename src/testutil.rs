//! Test fixtures: sample problems and a stub OpenAI-compatible server.

use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Mutex,
};

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::domain::Problem;

pub fn sample_problems_json() -> String {
  json!([
    {
      "problem_id": 1001,
      "title": "Two Sum",
      "level": 1,
      "tags": ["array", "hash"],
      "description": "Find two numbers that add up to the target.",
      "input_description": "A list of numbers and a target.",
      "output_description": "The two positions.",
      "examples": [
        { "input": "2 7 11 15", "output": "0 1" },
        { "output": "1 2" }
      ],
      "solutions": [
        { "logic_steps": [{ "goal": "remember numbers seen so far", "detail": "ignored" }] }
      ]
    },
    {
      "problem_id": "abc",
      "title": "Reverse Words",
      "level": 2,
      "tags": ["string"],
      "description": "Reverse the order of words.",
      "input_description": "One line of text.",
      "output_description": "The words in reverse order.",
      "examples": [{ "input": "hello world", "output": "world hello" }]
    }
  ])
  .to_string()
}

pub fn sample_problems() -> Vec<Problem> {
  serde_json::from_str(&sample_problems_json()).expect("fixture parses")
}

pub fn chat_ok() -> Value {
  json!({
    "choices": [{
      "message": { "role": "assistant", "content": "  What would change if the list were huge?\n" },
      "finish_reason": "stop"
    }],
    "usage": { "prompt_tokens": 120, "completion_tokens": 11, "total_tokens": 131 }
  })
}

/// Canned responses for the two endpoints.
#[derive(Clone)]
pub struct StubBehavior {
  pub models: (StatusCode, Value),
  pub chat: (StatusCode, Value),
}

impl Default for StubBehavior {
  fn default() -> Self {
    Self {
      models: (StatusCode::OK, json!({ "data": [{ "id": "stub/model-a" }, { "id": "stub/model-b" }] })),
      chat: (StatusCode::OK, chat_ok()),
    }
  }
}

struct StubInner {
  behavior: StubBehavior,
  model_calls: AtomicUsize,
  chat_calls: AtomicUsize,
  last_chat: Mutex<Option<Value>>,
}

pub struct StubServer {
  pub base_url: String,
  inner: Arc<StubInner>,
}

impl StubServer {
  pub fn chat_calls(&self) -> usize {
    self.inner.chat_calls.load(Ordering::SeqCst)
  }

  pub fn model_calls(&self) -> usize {
    self.inner.model_calls.load(Ordering::SeqCst)
  }

  pub fn last_chat(&self) -> Option<Value> {
    self.inner.last_chat.lock().expect("stub lock").clone()
  }
}

async fn stub_models(State(inner): State<Arc<StubInner>>) -> (StatusCode, Json<Value>) {
  inner.model_calls.fetch_add(1, Ordering::SeqCst);
  let (status, body) = inner.behavior.models.clone();
  (status, Json(body))
}

async fn stub_chat(State(inner): State<Arc<StubInner>>, Json(req): Json<Value>) -> (StatusCode, Json<Value>) {
  inner.chat_calls.fetch_add(1, Ordering::SeqCst);
  *inner.last_chat.lock().expect("stub lock") = Some(req);
  let (status, body) = inner.behavior.chat.clone();
  (status, Json(body))
}

/// Serve `behavior` on an ephemeral port; `base_url` ends in `/v1`.
pub async fn spawn_stub(behavior: StubBehavior) -> StubServer {
  let inner = Arc::new(StubInner {
    behavior,
    model_calls: AtomicUsize::new(0),
    chat_calls: AtomicUsize::new(0),
    last_chat: Mutex::new(None),
  });
  let app = Router::new()
    .route("/v1/models", get(stub_models))
    .route("/v1/chat/completions", post(stub_chat))
    .with_state(inner.clone());

  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
  let addr = listener.local_addr().expect("stub addr");
  tokio::spawn(async move {
    let _ = axum::serve(listener, app).await;
  });
  StubServer { base_url: format!("http://{addr}/v1"), inner }
}

/// A base URL whose port had a listener a moment ago and now has none.
pub async fn unreachable_base_url() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe port");
  let addr = listener.local_addr().expect("probe addr");
  drop(listener);
  format!("http://{addr}/v1")
}
