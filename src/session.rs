//! Lesson session: everything the lesson page owns while it is mounted.
//!
//! This module owns:
//!   - the load state (loading / ready / unavailable)
//!   - the wizard cursor (reset on every lesson load)
//!   - the three submission engines, built from the normalized lesson
//!   - the notification slot the engines publish into
//!
//! Nothing here outlives a navigation away from the lesson.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::client::LmsClient;
use crate::config::ClientConfig;
use crate::domain::NormalizedExercise;
use crate::engines::{ChoiceEngine, CodingEngine, EngineContext, FillBlankEngine};
use crate::normalize::normalize;
use crate::notify::{NotificationSink, NotificationSlot};
use crate::wizard::{StepOutcome, Wizard};

pub struct LoadedLesson {
  pub title: String,
  pub description: String,
  pub exercise: NormalizedExercise,
  pub coding: CodingEngine,
  pub choice: ChoiceEngine,
  pub fill_blank: FillBlankEngine,
}

pub enum LoadState {
  Loading,
  Ready(Box<LoadedLesson>),
  /// Fetch failed. No automatic retry; navigating to the lesson again reloads it.
  Unavailable(String),
}

pub struct LessonSession {
  client: LmsClient,
  config: Arc<ClientConfig>,
  notifications: NotificationSlot,
  lesson_id: String,
  state: LoadState,
  wizard: Wizard,
}

impl LessonSession {
  pub fn new(client: LmsClient, config: ClientConfig, lesson_id: impl Into<String>) -> Self {
    Self {
      client,
      config: Arc::new(config),
      notifications: NotificationSlot::new(),
      lesson_id: lesson_id.into(),
      state: LoadState::Loading,
      wizard: Wizard::new(),
    }
  }

  pub fn lesson_id(&self) -> &str {
    &self.lesson_id
  }

  pub fn state(&self) -> &LoadState {
    &self.state
  }

  pub fn lesson(&self) -> Option<&LoadedLesson> {
    match &self.state {
      LoadState::Ready(l) => Some(l),
      _ => None,
    }
  }

  pub fn wizard(&self) -> &Wizard {
    &self.wizard
  }

  pub fn notifications(&self) -> &NotificationSlot {
    &self.notifications
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  /// Fetch and normalize the current lesson, rebuilding every engine.
  #[instrument(level = "info", skip(self), fields(lesson_id = %self.lesson_id))]
  pub async fn load(&mut self) {
    self.state = LoadState::Loading;
    self.wizard.reset();

    match self.client.fetch_lesson(&self.lesson_id).await {
      Ok(lesson) => {
        let exercise = NormalizedExercise::from(normalize(&lesson));
        let notifier: Arc<dyn NotificationSink> = Arc::new(self.notifications.clone());
        let ctx = EngineContext::new(self.client.clone(), self.lesson_id.clone(), self.config.clone(), notifier);
        let loaded = LoadedLesson {
          title: lesson.title().to_string(),
          description: lesson.description().to_string(),
          coding: CodingEngine::new(ctx.clone(), exercise.coding().cloned()),
          choice: ChoiceEngine::new(ctx.clone(), exercise.multiple_choice_questions.clone()),
          fill_blank: FillBlankEngine::new(ctx, exercise.fill_blank().cloned()),
          exercise,
        };
        info!(
          target: "lesson",
          title = %loaded.title,
          content_type = ?loaded.exercise.content_type().map(|c| c.as_str()),
          "Lesson loaded"
        );
        self.state = LoadState::Ready(Box::new(loaded));
      }
      Err(e) => {
        error!(target: "lesson", error = %e, not_found = e.is_not_found(), "Failed to load lesson");
        self.state = LoadState::Unavailable(self.config.messages.load_failed.clone());
      }
    }
  }

  /// Switch to another lesson. Drops all per-lesson state, then loads.
  pub async fn navigate(&mut self, lesson_id: impl Into<String>) {
    self.lesson_id = lesson_id.into();
    self.load().await;
  }

  pub fn next(&mut self) -> StepOutcome {
    self.wizard.next()
  }

  pub fn back(&mut self) -> StepOutcome {
    self.wizard.back()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engines::Outcome;
  use crate::notify::Severity;
  use crate::test_support::{client_for, config_for, spawn_backend};
  use crate::wizard::Step;
  use axum::{extract::Path, http::StatusCode, routing::{get, post}, Json, Router};
  use serde_json::json;

  fn backend() -> Router {
    Router::new()
      .route(
        "/lessons/:id",
        get(|Path(id): Path<String>| async move {
          match id.as_str() {
            "1" => (StatusCode::OK, Json(json!({"lesson": {
              "id": 1, "title": "Intro", "description": "Say hello",
              "content_type": "coding",
              "content": {"instructions": "Print hello", "starter_code": "# Write your code here\n"}
            }}))),
            "2" => (StatusCode::OK, Json(json!({"lesson": {
              "id": 2, "title": "Quiz", "content_type": "multiple_choice",
              "content": {"question": "Which?", "options": ["A", "B", "C"], "correct_option": 1}
            }}))),
            "3" => (StatusCode::OK, Json(json!({"lesson": {"id": 3, "title": "Odd", "content_type": "essay"}}))),
            _ => (StatusCode::NOT_FOUND, Json(json!({"error": "Lesson not found"}))),
          }
        }),
      )
      .route(
        "/progress/multiple-choice/:id",
        post(|Json(body): Json<serde_json::Value>| async move {
          let score = if body["answers"]["content_mcq"] == json!(1) { 100 } else { 0 };
          Json(json!({"score": score}))
        }),
      )
  }

  async fn session(id: &str) -> LessonSession {
    let base = spawn_backend(backend()).await;
    let mut s = LessonSession::new(client_for(base.clone()), config_for(base), id);
    s.load().await;
    s
  }

  #[tokio::test]
  async fn coding_lesson_builds_engines() {
    let s = session("1").await;
    let l = s.lesson().expect("ready");
    assert_eq!(l.title, "Intro");
    assert_eq!(l.exercise.coding_exercises.len(), 1);
    assert!(l.choice.questions().is_empty());
    assert!(l.fill_blank.exercise().is_none());
    assert_eq!(l.coding.snapshot().await.code, "# Write your code here\n");
  }

  #[tokio::test]
  async fn multiple_choice_scenario_notifies_success() {
    let s = session("2").await;
    let l = s.lesson().unwrap();
    l.choice.select("content_mcq", 1).await.unwrap();
    assert_eq!(l.choice.submit_answers().await, Outcome::Applied);
    assert_eq!(s.notifications().current().map(|n| n.severity), Some(Severity::Success));

    l.choice.select("content_mcq", 0).await.unwrap();
    l.choice.submit_answers().await;
    assert_eq!(s.notifications().current().map(|n| n.severity), Some(Severity::Warning));
  }

  #[tokio::test]
  async fn unknown_content_type_loads_with_all_steps_empty() {
    let s = session("3").await;
    let l = s.lesson().unwrap();
    assert_eq!(l.exercise, NormalizedExercise::default());
    assert_eq!(l.description, "");
  }

  #[tokio::test]
  async fn missing_lesson_is_unavailable() {
    let s = session("404").await;
    match s.state() {
      LoadState::Unavailable(msg) => assert_eq!(msg, "Lesson not found or you don't have access to this lesson."),
      _ => panic!("expected unavailable"),
    }
  }

  #[tokio::test]
  async fn navigation_resets_the_wizard_and_steps_are_never_gated() {
    let mut s = session("2").await;
    // the coding step has no content, yet Next is allowed
    assert_eq!(s.next(), StepOutcome::Moved(Step::MultipleChoice));
    assert_eq!(s.next(), StepOutcome::Moved(Step::FillBlank));
    assert_eq!(s.next(), StepOutcome::Finished);

    s.navigate("1").await;
    assert_eq!(s.wizard().active(), Step::Coding);
    assert_eq!(s.lesson_id(), "1");
    assert!(s.lesson().unwrap().coding.exercise().is_some());
  }
}
