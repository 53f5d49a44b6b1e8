//! Startup configuration: CLI flags / environment, an optional TOML file with
//! prompt and generation overrides, and the catalog of known model aliases.
//!
//! Everything is resolved once in `main` and passed down explicitly as `Settings`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use clap::Parser;
use serde::Deserialize;
use tracing::{error, info};

use crate::inference::InferenceConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "hint-backend", about = "Socratic hint backend for a local vLLM server")]
pub struct Cli {
  /// Address the HTTP API binds to.
  #[arg(long, env = "SERVER_HOST", default_value = "127.0.0.1")]
  pub host: String,
  #[arg(long, env = "SERVER_PORT", default_value_t = 7860)]
  pub port: u16,
  /// JSON file with the problem collection.
  #[arg(long = "data", env = "DATA_FILE_PATH", default_value = "data/problems_multi_solution.json")]
  pub data_path: PathBuf,
  /// OpenAI-compatible base URL of the inference server.
  #[arg(long, env = "VLLM_SERVER_URL", default_value = "http://localhost:8000/v1")]
  pub server_url: String,
  /// Model name or catalog alias (e.g. `qwen-7b`).
  #[arg(long, env = "VLLM_MODEL", default_value = "Qwen/Qwen2.5-Coder-7B-Instruct")]
  pub model: String,
  #[arg(long = "timeout-secs", env = "VLLM_TIMEOUT_SECS", default_value_t = 60)]
  pub timeout_secs: u64,
  #[arg(long, env = "VLLM_MAX_RETRIES", default_value_t = 3)]
  pub max_retries: u32,
  /// TOML file with `[prompts]` / `[generation]` overrides.
  #[arg(long = "config", env = "HINT_CONFIG_PATH")]
  pub config_path: Option<PathBuf>,
}

/// Optional TOML file. Every section and key may be omitted.
#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
  pub prompts: Prompts,
  pub generation: GenerationDefaults,
}

/// Prompt texts. `hint_template` understands `{user_code}` and `{next_step}`.
/// `hint_system` replaces the client's built-in Socratic system prompt.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub hint_system: Option<String>,
  pub hint_template: String,
  pub starter_code: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      hint_system: None,
      hint_template: DEFAULT_HINT_TEMPLATE.into(),
      starter_code: "# Write your code here\n".into(),
    }
  }
}

// Must stay free of programming keywords: the model mirrors what it reads.
const DEFAULT_HINT_TEMPLATE: &str = r#"You are a creative mentor who sparks a student's curiosity and lets them discover answers on their own.

### The student's current code:
```python
{user_code}
```

### Core mission:
Make the student realize, on their own, why the next step "{next_step}" is needed, and make them eager to take it.
Do not hand over the answer. Ask a question that ignites their imagination and curiosity.

### Motivation strategies:

1. **Scale scenario**: What happens when the data grows a thousandfold? When there are a million users?
2. **Real-life connection**: How does a video platform keep track of millions of videos?
3. **Friction**: What would it feel like to copy the same code a hundred times?
4. **Curiosity**: Why do professional developers keep reaching to this pattern?
5. **Payoff preview**: Solve this one thing and the program becomes far more powerful.

### Strictly avoid:
❌ Naming functions, variables or code keywords directly
❌ Technical control-flow terms such as loop or conditional statement names
❌ Direct instructions like "use X"

### Output format:
Write exactly one question. Keep it concise yet striking, within 30-50 words.

Question:"#;

/// Sampling parameters not exposed to the caller.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
  pub max_tokens: u32,
  pub top_p: f32,
  pub frequency_penalty: f32,
  pub presence_penalty: f32,
}

impl Default for GenerationDefaults {
  fn default() -> Self {
    Self { max_tokens: 512, top_p: 0.9, frequency_penalty: 0.0, presence_penalty: 0.0 }
  }
}

/// Temperature used when the caller does not send one.
pub const DEFAULT_TEMPERATURE: f32 = 0.75;

/// Known coding models the inference server is usually started with.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
  pub alias: &'static str,
  pub name: &'static str,
  pub max_tokens: u32,
  pub context_length: u32,
  pub estimated_vram: &'static str,
  pub description: &'static str,
}

pub const MODEL_CATALOG: &[ModelSpec] = &[
  ModelSpec {
    alias: "qwen-7b",
    name: "Qwen/Qwen2.5-Coder-7B-Instruct",
    max_tokens: 4096,
    context_length: 32768,
    estimated_vram: "8GB",
    description: "Recommended coding model (speed/quality balance)",
  },
  ModelSpec {
    alias: "deepseek-7b",
    name: "deepseek-ai/deepseek-coder-7b-instruct-v1.5",
    max_tokens: 4096,
    context_length: 16384,
    estimated_vram: "8GB",
    description: "Code-specialised model",
  },
  ModelSpec {
    alias: "codellama-7b",
    name: "codellama/CodeLlama-7b-Instruct-hf",
    max_tokens: 4096,
    context_length: 16384,
    estimated_vram: "8GB",
    description: "Meta's official coding model",
  },
  ModelSpec {
    alias: "qwen-14b",
    name: "Qwen/Qwen2.5-Coder-14B-Instruct",
    max_tokens: 4096,
    context_length: 32768,
    estimated_vram: "18GB",
    description: "High-quality coding model (16GB+ VRAM recommended)",
  },
];

/// Expand a catalog alias to the full model name; anything else is returned as-is.
pub fn resolve_model_name(name: &str) -> String {
  MODEL_CATALOG
    .iter()
    .find(|m| m.alias == name)
    .map(|m| m.name.to_string())
    .unwrap_or_else(|| name.to_string())
}

pub fn model_spec(name: &str) -> Option<&'static ModelSpec> {
  MODEL_CATALOG.iter().find(|m| m.name == name || m.alias == name)
}

/// Fully resolved settings, consumed once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
  pub host: String,
  pub port: u16,
  pub data_path: PathBuf,
  pub server_url: String,
  pub model: String,
  pub timeout: Duration,
  pub max_retries: u32,
  pub prompts: Prompts,
  pub generation: GenerationDefaults,
}

impl Settings {
  pub fn from_cli(cli: Cli) -> Self {
    let file = cli.config_path.as_deref().and_then(load_file_config).unwrap_or_default();
    Self {
      host: cli.host,
      port: cli.port,
      data_path: cli.data_path,
      server_url: cli.server_url.trim_end_matches('/').to_string(),
      model: resolve_model_name(&cli.model),
      timeout: Duration::from_secs(cli.timeout_secs),
      max_retries: cli.max_retries,
      prompts: file.prompts,
      generation: file.generation,
    }
  }

  pub fn inference_config(&self) -> InferenceConfig {
    InferenceConfig {
      base_url: self.server_url.clone(),
      model: self.model.clone(),
      timeout: self.timeout,
      max_retries: self.max_retries,
    }
  }

  pub fn log_summary(&self) {
    info!(target: "hint_backend", data_path = %self.data_path.display(), "Problem data file");
    info!(target: "hint_backend", server_url = %self.server_url, model = %self.model, timeout_secs = self.timeout.as_secs(), max_retries = self.max_retries, "Inference server");
    if let Some(spec) = model_spec(&self.model) {
      info!(target: "hint_backend", alias = spec.alias, context_length = spec.context_length, max_tokens = spec.max_tokens, vram = spec.estimated_vram, description = spec.description, "Known model");
    }
    info!(target: "hint_backend", host = %self.host, port = self.port, "HTTP API");
  }
}

/// Read the TOML override file. On any IO/parse error, logs and returns None.
pub fn load_file_config(path: &Path) -> Option<FileConfig> {
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<FileConfig>(&s) {
      Ok(cfg) => {
        info!(target: "hint_backend", path = %path.display(), "Loaded config overrides (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "hint_backend", path = %path.display(), error = %e, "Failed to parse TOML config; using defaults");
        None
      }
    },
    Err(e) => {
      error!(target: "hint_backend", path = %path.display(), error = %e, "Failed to read TOML config file; using defaults");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn aliases_expand_to_full_names() {
    assert_eq!(resolve_model_name("qwen-14b"), "Qwen/Qwen2.5-Coder-14B-Instruct");
    assert_eq!(resolve_model_name("my/custom-model"), "my/custom-model");
    assert_eq!(model_spec("Qwen/Qwen2.5-Coder-7B-Instruct").map(|m| m.alias), Some("qwen-7b"));
  }

  #[test]
  fn cli_flags_build_settings() {
    let cli = Cli::try_parse_from([
      "hint-backend",
      "--port", "9000",
      "--server-url", "http://gpu-box:8000/v1/",
      "--model", "deepseek-7b",
      "--max-retries", "0",
    ])
    .unwrap();
    let s = Settings::from_cli(cli);
    assert_eq!(s.port, 9000);
    assert_eq!(s.server_url, "http://gpu-box:8000/v1");
    assert_eq!(s.model, "deepseek-ai/deepseek-coder-7b-instruct-v1.5");
    assert_eq!(s.inference_config().max_retries, 0);
    assert_eq!(s.generation.max_tokens, 512);
  }

  #[test]
  fn partial_toml_keeps_other_defaults() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "[prompts]\nstarter_code = \"# start\\n\"\n\n[generation]\ntop_p = 0.5").unwrap();
    let cfg = load_file_config(f.path()).unwrap();
    assert_eq!(cfg.prompts.starter_code, "# start\n");
    assert_eq!(cfg.prompts.hint_template, DEFAULT_HINT_TEMPLATE);
    assert_eq!(cfg.generation.top_p, 0.5);
    assert_eq!(cfg.generation.max_tokens, 512);
  }

  #[test]
  fn example_config_parses() {
    let cfg = load_file_config(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml"))).unwrap();
    assert!(cfg.prompts.hint_system.is_none());
    assert_eq!(cfg.generation.max_tokens, 512);
  }

  #[test]
  fn broken_toml_falls_back() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "[prompts\nnope").unwrap();
    assert!(load_file_config(f.path()).is_none());
    assert!(load_file_config(Path::new("/definitely/not/here.toml")).is_none());
  }
}
