//! Session state: which problem the user is currently working on.
//!
//! One logical session per running instance. `select` is the only mutator, and
//! it returns everything the caller needs to refresh its view.

use std::fmt::Write as _;

use tracing::{debug, instrument};

use crate::domain::Problem;
use crate::store::ProblemStore;

pub const NO_SELECTION_DESCRIPTION: &str = "Select a problem.";
pub const NO_SELECTION_STATUS: &str = "⚠️ Currently selected problem: none";
pub const NOT_FOUND_STATUS: &str = "❌ Problem not found.";

/// Outcome of a selection, shaped for the caller's view.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
  pub description: String,
  pub starter_code: String,
  pub resolved_id: Option<String>,
  pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
  selected_id: Option<String>,
  problem: Option<Problem>,
}

impl SessionState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Resolve `selection` (a display label or a bare id) against the store.
  /// Empty selection and unknown id both clear the state, with distinct statuses.
  #[instrument(level = "debug", skip(self, store, starter_code))]
  pub fn select(&mut self, store: &ProblemStore, selection: &str, starter_code: &str) -> Selection {
    let Some(id) = parse_selection(selection) else {
      self.clear();
      return Selection {
        description: NO_SELECTION_DESCRIPTION.into(),
        starter_code: String::new(),
        resolved_id: None,
        status: NO_SELECTION_STATUS.into(),
      };
    };

    let Some(problem) = store.find(id) else {
      debug!(target: "problem", %id, "Selection did not resolve");
      self.clear();
      return Selection {
        description: NOT_FOUND_STATUS.into(),
        starter_code: String::new(),
        resolved_id: None,
        status: NOT_FOUND_STATUS.into(),
      };
    };

    let id = problem.id_string();
    let description = render_problem_markdown(problem);
    self.selected_id = Some(id.clone());
    self.problem = Some(problem.clone());
    Selection {
      description,
      starter_code: starter_code.to_string(),
      status: format!("✅ Currently selected problem: `{id}`"),
      resolved_id: Some(id),
    }
  }

  pub fn current_problem(&self) -> Option<&Problem> {
    self.problem.as_ref()
  }

  pub fn selected_id(&self) -> Option<&str> {
    self.selected_id.as_deref()
  }

  fn clear(&mut self) {
    self.selected_id = None;
    self.problem = None;
  }
}

/// Extract the id from `#12 - Title (Level 1)` or accept a bare `12`.
/// Returns None for blank input.
pub fn parse_selection(selection: &str) -> Option<&str> {
  let s = selection.trim();
  if s.is_empty() {
    return None;
  }
  let id = match s.split_once('#') {
    Some((_, rest)) => rest.split(" -").next().unwrap_or(rest).trim(),
    None => s,
  };
  (!id.is_empty()).then_some(id)
}

pub fn render_problem_markdown(p: &Problem) -> String {
  let mut md = format!(
    "# {title}\n\n**Difficulty:** Level {level} | **Tags:** {tags}\n\n---\n\n## Description\n{desc}\n\n## Input\n{input}\n\n## Output\n{output}\n\n## Examples\n",
    title = p.title,
    level = p.level,
    tags = p.tags.join(", "),
    desc = p.description,
    input = p.input_description,
    output = p.output_description,
  );
  for (i, ex) in p.examples.iter().enumerate() {
    let input = ex.input.as_deref().unwrap_or("(none)");
    let output = ex.output.as_deref().unwrap_or("(none)");
    // Writing to a String cannot fail.
    let _ = write!(md, "\n**Example {}**\n```\nInput: {input}\nOutput: {output}\n```\n", i + 1);
  }
  md
}
