//! Fill-in-the-blank engine: template segments, answer slots and submission.
//!
//! Input adapters (drag/drop, free text) go through `crate::binder`; this engine
//! only owns the state and the network call.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::{EngineContext, Outcome, SequenceGuard};
use crate::binder::{apply_drop, apply_text, DropEvent, FillBlankAnswer};
use crate::domain::FillBlankExercise;
use crate::error::AnswerError;
use crate::notify::Severity;
use crate::template::{parse_template, Segment};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FillBlankState {
  pub answer: FillBlankAnswer,
  pub last_score: Option<f64>,
  pub submitting: bool,
  in_flight: usize,
}

#[derive(Clone)]
pub struct FillBlankEngine {
  ctx: EngineContext,
  exercise: Option<FillBlankExercise>,
  segments: Vec<Segment>,
  state: Arc<RwLock<FillBlankState>>,
  guard: Arc<SequenceGuard>,
}

impl FillBlankEngine {
  pub fn new(ctx: EngineContext, exercise: Option<FillBlankExercise>) -> Self {
    let (segments, answer) = match &exercise {
      Some(ex) => (parse_template(&ex.text_template), FillBlankAnswer::for_exercise(ex)),
      None => (Vec::new(), FillBlankAnswer::default()),
    };
    debug!(target: "fill_blank", slots = answer.len(), segments = segments.len(), "Fill-blank template parsed");
    let guard = Arc::new(ctx.sequence_guard());
    Self {
      ctx,
      exercise,
      segments,
      state: Arc::new(RwLock::new(FillBlankState { answer, ..Default::default() })),
      guard,
    }
  }

  pub fn exercise(&self) -> Option<&FillBlankExercise> {
    self.exercise.as_ref()
  }

  /// Template split into literal text and blank slots, in source order.
  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  pub async fn snapshot(&self) -> FillBlankState {
    self.state.read().await.clone()
  }

  /// Drag/drop input. `Ok(false)` when the token was dropped outside any blank.
  pub async fn drop_option(&self, event: DropEvent) -> Result<bool, AnswerError> {
    let ex = self.exercise.as_ref().ok_or(AnswerError::NoExercise)?;
    let mut st = self.state.write().await;
    apply_drop(ex, &mut st.answer, event)
  }

  /// Free-text input.
  pub async fn type_text(&self, blank_index: usize, text: &str) -> Result<(), AnswerError> {
    let ex = self.exercise.as_ref().ok_or(AnswerError::NoExercise)?;
    let mut st = self.state.write().await;
    apply_text(ex, &mut st.answer, blank_index, text)
  }

  /// Empty a slot again, whichever input mode filled it.
  pub async fn clear_blank(&self, blank_index: usize) -> Result<(), AnswerError> {
    self.exercise.as_ref().ok_or(AnswerError::NoExercise)?;
    self.state.write().await.answer.clear(blank_index)
  }

  /// Post the ordered answer array (unfilled slots as `null`).
  #[instrument(level = "info", skip(self), fields(lesson_id = %self.ctx.lesson_id))]
  pub async fn submit_answers(&self) -> Outcome {
    if self.exercise.is_none() {
      return Outcome::Blocked;
    }
    let (answers, seq) = {
      let mut st = self.state.write().await;
      st.submitting = true;
      st.in_flight += 1;
      (st.answer.slots().to_vec(), self.guard.issue())
    };

    let res = self.ctx.client.submit_fill_blank(&self.ctx.lesson_id, &answers).await;

    let mut st = self.state.write().await;
    st.in_flight = st.in_flight.saturating_sub(1);
    st.submitting = st.in_flight > 0;
    if !self.guard.accept(seq) {
      info!(target: "fill_blank", seq, "Discarding stale score");
      return Outcome::Discarded;
    }
    match res {
      Ok(out) => {
        let filled = answers.iter().filter(|a| a.is_some()).count();
        info!(target: "fill_blank", seq, score = out.score, filled, slots = answers.len(), "Answers scored");
        st.last_score = Some(out.score);
        self.ctx.notify_score(out.score);
      }
      Err(e) => {
        warn!(target: "fill_blank", seq, error = %e, "Answer submission failed");
        self.ctx.notify(Severity::Error, self.ctx.config.messages.answers_error.clone());
      }
    }
    Outcome::Applied
  }
}
