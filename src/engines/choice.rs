//! Multiple-choice engine: one selection per question, whole-map submission.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use super::{EngineContext, Outcome, SequenceGuard};
use crate::domain::MultipleChoiceQuestion;
use crate::error::AnswerError;
use crate::notify::Severity;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChoiceState {
  /// Question id → selected option index. Unanswered questions are absent.
  pub answers: BTreeMap<String, usize>,
  pub last_score: Option<f64>,
  pub submitting: bool,
  in_flight: usize,
}

#[derive(Clone)]
pub struct ChoiceEngine {
  ctx: EngineContext,
  questions: Vec<MultipleChoiceQuestion>,
  state: Arc<RwLock<ChoiceState>>,
  guard: Arc<SequenceGuard>,
}

impl ChoiceEngine {
  pub fn new(ctx: EngineContext, questions: Vec<MultipleChoiceQuestion>) -> Self {
    let guard = Arc::new(ctx.sequence_guard());
    Self { ctx, questions, state: Arc::new(RwLock::new(ChoiceState::default())), guard }
  }

  pub fn questions(&self) -> &[MultipleChoiceQuestion] {
    &self.questions
  }

  pub async fn snapshot(&self) -> ChoiceState {
    self.state.read().await.clone()
  }

  /// Select `option_index` for `question_id`, replacing any earlier selection.
  pub async fn select(&self, question_id: &str, option_index: usize) -> Result<(), AnswerError> {
    let q = self
      .questions
      .iter()
      .find(|q| q.id == question_id)
      .ok_or_else(|| AnswerError::UnknownQuestion(question_id.to_string()))?;
    if option_index >= q.options.len() {
      return Err(AnswerError::OptionOutOfRange { index: option_index, count: q.options.len() });
    }
    self.state.write().await.answers.insert(question_id.to_string(), option_index);
    Ok(())
  }

  /// Post the full answer map. An empty map is sent as-is; the server scores it.
  #[instrument(level = "info", skip(self), fields(lesson_id = %self.ctx.lesson_id))]
  pub async fn submit_answers(&self) -> Outcome {
    if self.questions.is_empty() {
      return Outcome::Blocked;
    }
    let (answers, seq) = {
      let mut st = self.state.write().await;
      st.submitting = true;
      st.in_flight += 1;
      (st.answers.clone(), self.guard.issue())
    };

    let res = self.ctx.client.submit_multiple_choice(&self.ctx.lesson_id, &answers).await;

    let mut st = self.state.write().await;
    st.in_flight = st.in_flight.saturating_sub(1);
    st.submitting = st.in_flight > 0;
    if !self.guard.accept(seq) {
      info!(target: "choice", seq, "Discarding stale score");
      return Outcome::Discarded;
    }
    match res {
      Ok(out) => {
        info!(target: "choice", seq, score = out.score, answered = answers.len(), "Answers scored");
        st.last_score = Some(out.score);
        self.ctx.notify_score(out.score);
      }
      Err(e) => {
        warn!(target: "choice", seq, error = %e, "Answer submission failed");
        self.ctx.notify(Severity::Error, self.ctx.config.messages.answers_error.clone());
      }
    }
    Outcome::Applied
  }
}
