//! Application state shared by all handlers: the problem store, the single
//! session, the inference client, and the prompt/generation settings.
//!
//! Everything is built in `main` from `Settings` and handed in; nothing here
//! reads the environment.

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::{GenerationDefaults, Prompts, Settings};
use crate::inference::InferenceClient;
use crate::session::SessionState;
use crate::store::ProblemStore;

pub struct AppState {
  pub store: ProblemStore,
  /// Concurrent selects are last-writer-wins; the lock is never held across an inference call.
  pub session: RwLock<SessionState>,
  pub client: InferenceClient,
  pub prompts: Prompts,
  pub generation: GenerationDefaults,
}

impl AppState {
  #[instrument(level = "info", skip_all)]
  pub fn new(store: ProblemStore, client: InferenceClient, settings: &Settings) -> Self {
    info!(
      target: "hint_backend",
      problems = store.len(),
      model = %client.model(),
      health = client.health().label(),
      "Application state ready"
    );
    Self::with_parts(store, client, settings.prompts.clone(), settings.generation.clone())
  }

  pub fn with_parts(store: ProblemStore, client: InferenceClient, prompts: Prompts, generation: GenerationDefaults) -> Self {
    Self {
      store,
      session: RwLock::new(SessionState::new()),
      client,
      prompts,
      generation,
    }
  }
}
