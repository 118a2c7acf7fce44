//! Error types: backend calls (`ApiError`) and answer commands (`AnswerError`).
//!
//! Neither escapes the lesson session. API errors end up as output text or a
//! notification; answer errors are reported back to the input adapter.

use crate::domain::BlankInput;

/// Failure of a single backend call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// No HTTP response at all (connection refused, DNS, timeout, ...).
  #[error("request failed: {0}")]
  Transport(String),

  /// Non-2xx response. `message` is the body's `error` field when the server sent one.
  #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no error message"))]
  Status { status: u16, message: Option<String> },

  /// `api_base_url` cannot be turned into a request URL.
  #[error("invalid request url: {0}")]
  BadUrl(String),

  /// 2xx response whose body was not the expected JSON.
  #[error("unexpected response body: {0}")]
  Decode(String),
}

impl ApiError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Status { status: 404, .. })
  }

  /// Text shown to the student: the server's message verbatim, else `fallback`.
  pub fn user_message(&self, fallback: &str) -> String {
    match self {
      Self::Status { message: Some(m), .. } if !m.is_empty() => m.clone(),
      _ => fallback.to_string(),
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      Self::Decode(e.to_string())
    } else {
      Self::Transport(e.to_string())
    }
  }
}

/// Rejected answer command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
  #[error("unknown question '{0}'")]
  UnknownQuestion(String),

  #[error("blank {index} does not exist (exercise has {count} blanks)")]
  BlankOutOfRange { index: usize, count: usize },

  #[error("option {index} does not exist ({count} options available)")]
  OptionOutOfRange { index: usize, count: usize },

  #[error("this exercise takes {expected:?} input")]
  WrongInputMode { expected: BlankInput },

  #[error("no exercise of this type in the lesson")]
  NoExercise,
}
