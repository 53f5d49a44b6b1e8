//! Public HTTP request/response DTOs (serde ready, camelCase on the wire).

use serde::{Deserialize, Serialize};

use crate::session::Selection;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
  pub ok: bool,
  pub inference: &'static str,
  pub model: String,
  pub base_url: String,
  pub problems: usize,
}

#[derive(Debug, Serialize)]
pub struct ProblemsOut {
  pub problems: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectIn {
  #[serde(default)]
  pub selection: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOut {
  pub description: String,
  pub starter_code: String,
  pub problem_id: Option<String>,
  pub status: String,
}

impl From<Selection> for SelectOut {
  fn from(s: Selection) -> Self {
    Self { description: s.description, starter_code: s.starter_code, problem_id: s.resolved_id, status: s.status }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintIn {
  #[serde(default)]
  pub user_code: String,
  #[serde(default)]
  pub temperature: Option<f32>,
  #[serde(default)]
  pub problem_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HintOut {
  pub hint: String,
  pub metrics: String,
}
