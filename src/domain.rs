//! Domain models: exercise problems, their examples and reference solutions.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Problem identifier as it appears in the data file (integer or string).
/// Comparison always goes through the string form.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ProblemId {
  Int(i64),
  Text(String),
}

impl fmt::Display for ProblemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProblemId::Int(n) => write!(f, "{n}"),
      ProblemId::Text(s) => f.write_str(s),
    }
  }
}

/// One exercise record. Immutable once the store has loaded it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
  pub problem_id: ProblemId,
  pub title: String,
  pub level: u32,
  pub tags: Vec<String>,
  pub description: String,
  pub input_description: String,
  pub output_description: String,
  pub examples: Vec<Example>,
  #[serde(default)]
  pub solutions: Vec<Solution>,
}

/// Input/output pair. Either side may be absent in the source data.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Example {
  #[serde(default, deserialize_with = "lenient_text")]
  pub input: Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  pub output: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Solution {
  #[serde(default)]
  pub logic_steps: Vec<LogicStep>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LogicStep {
  #[serde(default)]
  pub goal: Option<String>,
}

impl Problem {
  pub fn id_string(&self) -> String {
    self.problem_id.to_string()
  }

  /// Dropdown label, e.g. `#12 - Two Sum (Level 1)`.
  pub fn label(&self) -> String {
    format!("#{} - {} (Level {})", self.problem_id, self.title, self.level)
  }

  /// Goal of the first logic step of the first reference solution, if any.
  pub fn first_step_goal(&self) -> Option<&str> {
    self.solutions
      .first()
      .and_then(|s| s.logic_steps.first())
      .and_then(|step| step.goal.as_deref())
  }
}

// Example values are usually strings, but numbers and arrays show up in
// hand-written data files; keep them as their JSON text.
fn lenient_text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let v = Option::<serde_json::Value>::deserialize(de)?;
  Ok(match v {
    None | Some(serde_json::Value::Null) => None,
    Some(serde_json::Value::String(s)) => Some(s),
    Some(other) => Some(other.to_string()),
  })
}
