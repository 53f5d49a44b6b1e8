//! Problem store: the exercise collection loaded once at startup.

use std::{collections::HashMap, path::Path};

use tracing::{info, instrument, warn};

use crate::domain::Problem;
use crate::error::HintError;

#[derive(Debug, Default)]
pub struct ProblemStore {
  problems: Vec<Problem>,
  by_id: HashMap<String, usize>,
}

impl ProblemStore {
  /// Read and parse the JSON problem file. Any IO or schema problem is a `DataLoad` error.
  #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
  pub fn load(path: impl AsRef<Path>) -> Result<Self, HintError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| HintError::data_load(path, e))?;
    let problems: Vec<Problem> =
      serde_json::from_str(&raw).map_err(|e| HintError::data_load(path, e))?;

    let store = Self::from_problems(problems);
    if store.is_empty() {
      warn!(target: "problem", path = %path.display(), "Problem file contains no records");
    }
    info!(target: "problem", count = store.len(), "Problems loaded");
    Ok(store)
  }

  /// Build the index. On duplicate ids the first record wins lookups.
  pub fn from_problems(problems: Vec<Problem>) -> Self {
    let mut by_id = HashMap::with_capacity(problems.len());
    for (idx, p) in problems.iter().enumerate() {
      let id = p.id_string();
      if by_id.contains_key(&id) {
        warn!(target: "problem", %id, "Duplicate problem id; keeping the first record");
        continue;
      }
      by_id.insert(id, idx);
    }
    Self { problems, by_id }
  }

  pub fn find(&self, id: &str) -> Option<&Problem> {
    self.by_id.get(id.trim()).map(|&idx| &self.problems[idx])
  }

  pub fn len(&self) -> usize {
    self.problems.len()
  }

  pub fn is_empty(&self) -> bool {
    self.problems.is_empty()
  }

  /// Display labels in load order.
  pub fn labels(&self) -> Vec<String> {
    self.problems.iter().map(Problem::label).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn write_tmp(content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f
  }

  #[test]
  fn loads_and_finds_by_string_form() {
    let f = write_tmp(&crate::testutil::sample_problems_json());
    let store = ProblemStore::load(f.path()).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.find("1001").unwrap().title, "Two Sum");
    assert_eq!(store.find(" 1001 ").unwrap().title, "Two Sum");
    assert_eq!(store.find("abc").unwrap().title, "Reverse Words");
    assert!(store.find("9999").is_none());
    assert_eq!(
      store.labels(),
      vec!["#1001 - Two Sum (Level 1)".to_string(), "#abc - Reverse Words (Level 2)".to_string()]
    );
  }

  #[test]
  fn missing_file_is_data_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProblemStore::load(dir.path().join("nope.json")).unwrap_err();
    assert_eq!(err.kind(), "data_load");
  }

  #[test]
  fn malformed_json_is_data_load_error() {
    let f = write_tmp("{ not json");
    assert!(matches!(ProblemStore::load(f.path()), Err(HintError::DataLoad { .. })));
  }

  #[test]
  fn missing_required_field_is_data_load_error() {
    let f = write_tmp(r#"[{"problem_id": 1, "level": 1, "tags": [], "description": "",
      "input_description": "", "output_description": "", "examples": []}]"#);
    let err = ProblemStore::load(f.path()).unwrap_err();
    assert!(err.to_string().contains("title"), "{err}");
  }

  #[test]
  fn duplicate_ids_keep_first() {
    let mut problems = crate::testutil::sample_problems();
    let mut dup = problems[0].clone();
    dup.title = "Shadow".into();
    problems.push(dup);
    let store = ProblemStore::from_problems(problems);
    assert_eq!(store.len(), 3);
    assert_eq!(store.find("1001").unwrap().title, "Two Sum");
  }

  #[test]
  fn bundled_data_file_loads() {
    let store = ProblemStore::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/problems_multi_solution.json")).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.find("word-count").unwrap().level, 3);
    assert!(store.find("1001").unwrap().first_step_goal().is_some());
  }

  #[test]
  fn empty_collection_loads() {
    let f = write_tmp("[]");
    let store = ProblemStore::load(f.path()).unwrap();
    assert!(store.is_empty());
    assert!(store.labels().is_empty());
  }
}
