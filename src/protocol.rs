//! Wire DTOs for the LMS REST endpoints.
//!
//! Response types decode every field the backend emits, with defaults, so a
//! missing field never fails a call. Only a subset is used by the engines.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Lesson;

// ---------- GET /lessons/{id} ----------

#[derive(Debug, Deserialize)]
pub struct LessonEnvelope {
  pub lesson: Lesson,
}

// ---------- POST /code/run, POST /code/submit/{id} ----------

#[derive(Debug, Serialize)]
pub struct CodeIn<'a> {
  pub code: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunCodeOut {
  #[serde(default)] pub message: Option<String>,
  #[serde(default)] pub output: Option<String>,
  #[serde(default)] pub error: Option<String>,
  #[serde(default)] pub execution_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitCodeOut {
  #[serde(default)] pub message: Option<String>,
  #[serde(default)] pub output: Option<String>,
  #[serde(default)] pub score: f64,
  #[serde(default = "default_max_score")] pub max_score: f64,
  #[serde(default)] pub passed: bool,
  #[serde(default)] pub test_results: Vec<TestResult>,
  #[serde(default)] pub feedback: Option<String>,
  #[serde(default)] pub execution_success: Option<bool>,
}

fn default_max_score() -> f64 {
  100.0
}

/// Outcome of one grading test case.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TestResult {
  #[serde(default)] pub test_case: TestCaseId,
  #[serde(default)] pub passed: bool,
  #[serde(default)] pub message: String,
}

/// Test case identifier: the backend numbers them, but names are tolerated.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TestCaseId {
  Number(u64),
  Name(String),
}

impl Default for TestCaseId {
  fn default() -> Self {
    Self::Number(0)
  }
}

impl fmt::Display for TestCaseId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{}", n),
      Self::Name(s) => f.write_str(s),
    }
  }
}

// ---------- POST /progress/multiple-choice/{id}, POST /progress/fill-blank/{id} ----------

#[derive(Debug, Serialize)]
pub struct ChoiceAnswersIn<'a> {
  pub answers: &'a BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct FillBlankAnswersIn<'a> {
  pub answers: &'a [Option<String>],
}

#[derive(Debug, Default, Deserialize)]
pub struct ScoreOut {
  #[serde(default)] pub message: Option<String>,
  #[serde(default)] pub score: f64,
  #[serde(default)] pub correct_count: Option<u32>,
  #[serde(default)] pub total_questions: Option<u32>,
  #[serde(default)] pub results: Vec<Value>,
}

/// Error body shape shared by all endpoints: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorOut {
  pub error: String,
}

/// Try to extract the server's `error` message from a failure body.
pub fn extract_server_error(body: &str) -> Option<String> {
  match serde_json::from_str::<ErrorOut>(body) {
    Ok(e) if !e.error.is_empty() => Some(e.error),
    _ => None,
  }
}
