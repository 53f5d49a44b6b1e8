//! Socratic prompt construction. Pure and deterministic: the same problem and
//! code always render the same text.

use crate::domain::Problem;
use crate::error::HintError;
use crate::util::fill_template;

/// Used when the problem has no reference solution steps.
pub const FALLBACK_NEXT_STEP: &str = "solve the problem";

/// The goal the hint should steer the student towards.
pub fn next_step_goal(problem: &Problem) -> &str {
  problem.first_step_goal().unwrap_or(FALLBACK_NEXT_STEP)
}

/// Render the hint prompt from `template` (`{user_code}`, `{next_step}`).
/// User code is embedded verbatim.
pub fn build_prompt(template: &str, problem: Option<&Problem>, user_code: &str) -> Result<String, HintError> {
  let problem = problem.ok_or_else(|| HintError::InvalidInput("No problem selected.".into()))?;
  Ok(fill_template(
    template,
    &[("user_code", user_code), ("next_step", next_step_goal(problem))],
  ))
}
