//! Minimal client for the LMS REST backend.
//!
//! One method per endpoint the exercise runtime needs. Calls are instrumented
//! and log lesson ids, statuses, latencies and payload sizes (not contents).
//!
//! NOTE: We never log the bearer token, submitted code or answers.

use std::collections::BTreeMap;
use std::time::Instant;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::domain::Lesson;
use crate::error::ApiError;
use crate::protocol::{
  extract_server_error, ChoiceAnswersIn, CodeIn, FillBlankAnswersIn, LessonEnvelope, RunCodeOut, ScoreOut,
  SubmitCodeOut,
};
use crate::util::trunc_for_log;

const CLIENT_UA: &str = concat!("lesson-runner/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct LmsClient {
  pub client: reqwest::Client,
  pub base_url: String,
  auth_token: Option<String>,
}

impl std::fmt::Debug for LmsClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LmsClient")
      .field("base_url", &self.base_url)
      .field("authenticated", &self.auth_token.is_some())
      .finish()
  }
}

impl LmsClient {
  pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.request_timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder.build()?;
    Ok(Self { client, base_url: config.api_base_url.clone(), auth_token: config.auth_token.clone() })
  }

  /// `GET /lessons/{id}` → the `lesson` object.
  #[instrument(level = "info", skip(self), fields(%lesson_id))]
  pub async fn fetch_lesson(&self, lesson_id: &str) -> Result<Lesson, ApiError> {
    let env: LessonEnvelope = self.get_json(&["lessons", lesson_id]).await?;
    Ok(env.lesson)
  }

  /// `POST /code/run`: execute without grading.
  #[instrument(level = "info", skip(self, code), fields(code_len = code.len()))]
  pub async fn run_code(&self, code: &str) -> Result<RunCodeOut, ApiError> {
    self.post_json(&["code", "run"], &CodeIn { code }).await
  }

  /// `POST /code/submit/{id}`: execute and grade.
  #[instrument(level = "info", skip(self, code), fields(%lesson_id, code_len = code.len()))]
  pub async fn submit_code(&self, lesson_id: &str, code: &str) -> Result<SubmitCodeOut, ApiError> {
    self.post_json(&["code", "submit", lesson_id], &CodeIn { code }).await
  }

  #[instrument(level = "info", skip(self, answers), fields(%lesson_id, answered = answers.len()))]
  pub async fn submit_multiple_choice(
    &self,
    lesson_id: &str,
    answers: &BTreeMap<String, usize>,
  ) -> Result<ScoreOut, ApiError> {
    self
      .post_json(&["progress", "multiple-choice", lesson_id], &ChoiceAnswersIn { answers })
      .await
  }

  #[instrument(level = "info", skip(self, answers), fields(%lesson_id, slots = answers.len()))]
  pub async fn submit_fill_blank(&self, lesson_id: &str, answers: &[Option<String>]) -> Result<ScoreOut, ApiError> {
    self
      .post_json(&["progress", "fill-blank", lesson_id], &FillBlankAnswersIn { answers })
      .await
  }

  // --- transport ---

  async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
    let url = self.url(segments)?;
    let path = url.path().to_string();
    self.send(self.client.get(url), &path).await
  }

  async fn post_json<B: Serialize, T: DeserializeOwned>(&self, segments: &[&str], body: &B) -> Result<T, ApiError> {
    let url = self.url(segments)?;
    let path = url.path().to_string();
    let req = self.client.post(url).header(CONTENT_TYPE, "application/json").json(body);
    self.send(req, &path).await
  }

  async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder, path: &str) -> Result<T, ApiError> {
    let mut req = req.header(USER_AGENT, CLIENT_UA);
    if let Some(token) = &self.auth_token {
      req = req.header(AUTHORIZATION, format!("Bearer {}", token));
    }

    let start = Instant::now();
    let res = req.send().await.map_err(|e| {
      warn!(target: "lesson_runner", %path, error = %e, "Request failed before a response arrived");
      ApiError::from(e)
    })?;
    let status = res.status();
    let elapsed = start.elapsed();

    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let message = extract_server_error(&body);
      warn!(
        target: "lesson_runner",
        %path, status = status.as_u16(), ?elapsed,
        server_error = %trunc_for_log(message.as_deref().unwrap_or(&body), 200),
        "Backend returned an error status"
      );
      return Err(ApiError::Status { status: status.as_u16(), message });
    }

    let bytes = res.bytes().await?;
    debug!(target: "lesson_runner", %path, status = status.as_u16(), ?elapsed, body_len = bytes.len(), "Backend response");
    serde_json::from_slice::<T>(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
  }

  /// `base_url` plus `segments`, each percent-encoded as a single path segment.
  fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = Url::parse(&self.base_url).map_err(|e| ApiError::BadUrl(format!("{}: {}", self.base_url, e)))?;
    url
      .path_segments_mut()
      .map_err(|_| ApiError::BadUrl(format!("{}: cannot carry a path", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }
}
