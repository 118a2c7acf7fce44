//! Coding exercise engine: editor buffer, run (no grading) and submit (graded).
//!
//! State machine: Idle → Running → Idle, Idle → Grading → Idle. Both actions
//! are re-entrant and stay enabled while busy.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use super::{EngineContext, Outcome, SequenceGuard};
use crate::domain::CodingExercise;
use crate::notify::Severity;
use crate::protocol::{RunCodeOut, SubmitCodeOut, TestResult};
use crate::util::{fill_template, format_score, non_empty};

/// Buffer contents when the exercise has no starter code.
pub const PLACEHOLDER_CODE: &str = "# Write your code here\n";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activity {
  #[default]
  Idle,
  Running,
  Grading,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GradingResult {
  pub score: f64,
  pub max_score: f64,
  pub passed: bool,
  pub test_results: Vec<TestResult>,
}

impl From<&SubmitCodeOut> for GradingResult {
  fn from(r: &SubmitCodeOut) -> Self {
    Self { score: r.score, max_score: r.max_score, passed: r.passed, test_results: r.test_results.clone() }
  }
}

/// Snapshot of everything the coding step renders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodingState {
  pub code: String,
  pub output: Option<String>,
  pub grading: Option<GradingResult>,
  pub activity: Activity,
  in_flight: usize,
}

impl CodingState {
  /// Run/submit are disabled on an empty or whitespace-only buffer.
  pub fn can_submit(&self) -> bool {
    !self.code.trim().is_empty()
  }
}

#[derive(Clone)]
pub struct CodingEngine {
  ctx: EngineContext,
  exercise: Option<CodingExercise>,
  state: Arc<RwLock<CodingState>>,
  guard: Arc<SequenceGuard>,
}

impl CodingEngine {
  pub fn new(ctx: EngineContext, exercise: Option<CodingExercise>) -> Self {
    let code = match &exercise {
      Some(ex) if !ex.starter_code.is_empty() => ex.starter_code.clone(),
      Some(_) => PLACEHOLDER_CODE.to_string(),
      None => String::new(),
    };
    let guard = Arc::new(ctx.sequence_guard());
    Self { ctx, exercise, state: Arc::new(RwLock::new(CodingState { code, ..Default::default() })), guard }
  }

  pub fn exercise(&self) -> Option<&CodingExercise> {
    self.exercise.as_ref()
  }

  pub async fn snapshot(&self) -> CodingState {
    self.state.read().await.clone()
  }

  pub async fn set_code(&self, code: impl Into<String>) {
    self.state.write().await.code = code.into();
  }

  /// Execute the current buffer without grading.
  /// On success the output panel shows the program output and any previous grading is cleared.
  #[instrument(level = "info", skip(self), fields(lesson_id = %self.ctx.lesson_id))]
  pub async fn execute_code(&self) -> Outcome {
    let Some((code, seq)) = self.begin(Activity::Running).await else {
      return Outcome::Blocked;
    };
    let res = self.ctx.client.run_code(&code).await;

    let mut st = self.state.write().await;
    finish(&mut st);
    if !self.guard.accept(seq) {
      info!(target: "coding", seq, "Discarding stale run response");
      return Outcome::Discarded;
    }
    let msgs = &self.ctx.config.messages;
    match res {
      Ok(out) => {
        st.output = Some(run_output(out, &msgs.run_error_output, &msgs.no_output));
        st.grading = None;
        info!(target: "coding", seq, "Code executed");
      }
      Err(e) => {
        warn!(target: "coding", seq, error = %e, "Code execution failed");
        st.output = Some(e.user_message(&msgs.run_failed));
      }
    }
    Outcome::Applied
  }

  /// Execute and grade the current buffer against the lesson's tests.
  #[instrument(level = "info", skip(self), fields(lesson_id = %self.ctx.lesson_id))]
  pub async fn submit_code(&self) -> Outcome {
    let Some((code, seq)) = self.begin(Activity::Grading).await else {
      return Outcome::Blocked;
    };
    let res = self.ctx.client.submit_code(&self.ctx.lesson_id, &code).await;

    let mut st = self.state.write().await;
    finish(&mut st);
    if !self.guard.accept(seq) {
      info!(target: "coding", seq, "Discarding stale grading response");
      return Outcome::Discarded;
    }
    let msgs = &self.ctx.config.messages;
    match res {
      Ok(out) => {
        let grading = GradingResult::from(&out);
        info!(target: "coding", seq, score = grading.score, passed = grading.passed, tests = grading.test_results.len(), "Code graded");
        st.output = Some(non_empty(out.output).unwrap_or_else(|| msgs.no_output.clone()));
        if grading.passed {
          self.ctx.notify(Severity::Success, fill_template(&msgs.code_passed, &[("score", &format_score(grading.score))]));
        } else {
          self.ctx.notify(Severity::Warning, msgs.code_not_passed.clone());
        }
        st.grading = Some(grading);
      }
      Err(e) => {
        warn!(target: "coding", seq, error = %e, "Code submission failed");
        st.output = Some(e.user_message(&msgs.submit_failed));
        self.ctx.notify(Severity::Error, msgs.code_error.clone());
      }
    }
    Outcome::Applied
  }

  /// Mark an action as started. `None` when the action is disabled.
  async fn begin(&self, activity: Activity) -> Option<(String, u64)> {
    self.exercise.as_ref()?;
    let mut st = self.state.write().await;
    if !st.can_submit() {
      return None;
    }
    let msgs = &self.ctx.config.messages;
    st.activity = activity;
    st.in_flight += 1;
    st.output = Some(match activity {
      Activity::Grading => msgs.grading.clone(),
      _ => msgs.running.clone(),
    });
    Some((st.code.clone(), self.guard.issue()))
  }
}

fn finish(st: &mut CodingState) {
  st.in_flight = st.in_flight.saturating_sub(1);
  if st.in_flight == 0 {
    st.activity = Activity::Idle;
  }
}

fn run_output(out: RunCodeOut, error_tpl: &str, no_output: &str) -> String {
  if let Some(output) = non_empty(out.output) {
    return output;
  }
  match non_empty(out.error) {
    Some(err) => fill_template(error_tpl, &[("error", &err)]),
    None => no_output.to_string(),
  }
}
