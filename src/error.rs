//! Error taxonomy shared by the store, the prompt builder and the inference client.
//!
//! Every variant renders as user-readable text. Only `DataLoad` is fatal, and
//! only at startup.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HintError {
  /// Problem source missing, unreadable or malformed.
  #[error("Failed to load problem data from '{}': {message}", .path.display())]
  DataLoad { path: PathBuf, message: String },

  #[error("Problem not found. (ID: {0})")]
  ProblemNotFound(String),

  /// Rejected before any network call.
  #[error("{0}")]
  InvalidInput(String),

  #[error("Could not reach the inference server ({base_url}). Start it with `docker-compose up` and try again.")]
  EndpointUnreachable { base_url: String },

  #[error("Model '{model}' was not found. Check VLLM_MODEL in your configuration.")]
  ModelNotFound { model: String },

  /// Passthrough of the underlying failure text.
  #[error("{0}")]
  Unclassified(String),
}

impl HintError {
  pub fn data_load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
    HintError::DataLoad { path: path.into(), message: message.to_string() }
  }

  /// Short machine-friendly kind, used as a log field.
  pub fn kind(&self) -> &'static str {
    match self {
      HintError::DataLoad { .. } => "data_load",
      HintError::ProblemNotFound(_) => "problem_not_found",
      HintError::InvalidInput(_) => "invalid_input",
      HintError::EndpointUnreachable { .. } => "endpoint_unreachable",
      HintError::ModelNotFound { .. } => "model_not_found",
      HintError::Unclassified(_) => "unclassified",
    }
  }
}
