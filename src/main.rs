//! Socratic hint backend
//!
//! - Axum HTTP API: list problems, select one, request a hint for the code so far
//! - Hints come from a local OpenAI-compatible inference server (vLLM)
//! - Problems are loaded once from a JSON file
//!
//! Important env variables (each also has a CLI flag, see `--help`):
//!   DATA_FILE_PATH    : problem JSON (default "data/problems_multi_solution.json")
//!   VLLM_SERVER_URL   : default "http://localhost:8000/v1"
//!   VLLM_MODEL        : model name or alias, default "Qwen/Qwen2.5-Coder-7B-Instruct"
//!   SERVER_HOST       : default "127.0.0.1"
//!   SERVER_PORT       : u16 (default 7860)
//!   HINT_CONFIG_PATH  : TOML with prompt / generation overrides
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod store;
mod session;
mod prompt;
mod inference;
mod state;
mod protocol;
mod logic;
mod routes;
#[cfg(test)]
mod testutil;

use std::sync::Arc;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::{Cli, Settings};
use crate::inference::InferenceClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::ProblemStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = Settings::from_cli(Cli::parse());
  settings.log_summary();

  // Without problem data there is nothing to serve.
  let store = match ProblemStore::load(&settings.data_path) {
    Ok(store) => store,
    Err(e) => {
      error!(target: "hint_backend", error = %e, "Cannot start: copy problems_multi_solution.json into the data directory or set DATA_FILE_PATH");
      std::process::exit(1);
    }
  };

  // Never fails; an unreachable server only degrades health.
  let client = InferenceClient::connect(settings.inference_config()).await;

  let state = Arc::new(AppState::new(store, client, &settings));
  let app = build_router(state);

  let listener = TcpListener::bind((settings.host.as_str(), settings.port)).await?;
  let addr = listener.local_addr()?;
  info!(target: "hint_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "hint_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "hint_backend", "Shutdown signal received");
}
