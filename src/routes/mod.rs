//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - JSON API under `/api/v1/...`
/// - CORS (allow any origin/method/headers) for a locally served front end
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/problems", get(http::http_get_problems))
        .route("/api/v1/problem/select", post(http::http_post_select))
        .route("/api/v1/hint", post(http::http_post_hint))
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::{GenerationDefaults, Prompts};
    use crate::inference::{InferenceClient, InferenceConfig};
    use crate::store::ProblemStore;
    use crate::testutil::{sample_problems, spawn_stub, StubBehavior, StubServer};

    async fn app() -> (Router, StubServer) {
        let stub = spawn_stub(StubBehavior::default()).await;
        let client = InferenceClient::connect(InferenceConfig {
            base_url: stub.base_url.clone(),
            model: "missing/model".into(),
            timeout: Duration::from_secs(5),
            max_retries: 0,
        })
        .await;
        let state = AppState::with_parts(
            ProblemStore::from_problems(sample_problems()),
            client,
            Prompts::default(),
            GenerationDefaults::default(),
        );
        (build_router(Arc::new(state)), stub)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req.header(CONTENT_TYPE, "application/json").body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_reports_substituted_model() {
        let (app, _stub) = app().await;
        let (status, body) = call(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inference"], "healthy");
        assert_eq!(body["model"], "stub/model-a");
        assert_eq!(body["problems"], 2);
    }

    #[tokio::test]
    async fn select_then_hint_round_trip() {
        let (app, stub) = app().await;
        let (_, list) = call(&app, "GET", "/api/v1/problems", None).await;
        let first = list["problems"][0].as_str().unwrap().to_string();
        assert_eq!(first, "#1001 - Two Sum (Level 1)");

        let (status, sel) = call(&app, "POST", "/api/v1/problem/select", Some(json!({ "selection": first }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sel["problemId"], "1001");
        assert_eq!(sel["starterCode"], "# Write your code here\n");

        let (status, hint) = call(&app, "POST", "/api/v1/hint", Some(json!({ "userCode": "seen = []" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(hint["hint"], "What would change if the list were huge?");
        assert!(hint["metrics"].as_str().unwrap().contains("- **Temperature:** 0.75"));
        assert_eq!(stub.chat_calls(), 1);
    }

    #[tokio::test]
    async fn empty_selection_and_missing_problem_are_plain_replies() {
        let (app, stub) = app().await;
        let (_, sel) = call(&app, "POST", "/api/v1/problem/select", Some(json!({ "selection": "" }))).await;
        assert_eq!(sel["problemId"], Value::Null);
        assert_eq!(sel["status"], crate::session::NO_SELECTION_STATUS);

        let (status, hint) = call(&app, "POST", "/api/v1/hint", Some(json!({ "userCode": "x = 1" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(hint["hint"], "❌ Please select a problem first.");
        assert_eq!(hint["metrics"], "");
        assert_eq!(stub.chat_calls(), 0);
    }
}
