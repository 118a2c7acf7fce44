//! Client configuration: backend location, session token, grading policy and
//! every user-visible message.
//!
//! Sources, in increasing precedence:
//!   1. built-in defaults
//!   2. TOML file at LESSON_CONFIG_PATH (`[messages]`, `[grading]`, `api_base_url`)
//!   3. environment: LMS_API_BASE_URL, LMS_AUTH_TOKEN, LMS_REQUEST_TIMEOUT_SECS

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// TOML overlay. Every section is optional.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)]
  pub api_base_url: Option<String>,
  #[serde(default)]
  pub request_timeout_secs: Option<u64>,
  #[serde(default)]
  pub messages: Messages,
  #[serde(default)]
  pub grading: Grading,
}

/// Texts shown in the output panel and in notifications.
/// `{score}` and `{error}` are substituted where noted.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Messages {
  // Output panel
  pub running: String,
  pub grading: String,
  pub no_output: String,
  /// `{error}`: the `error` field of a successful run response without output.
  pub run_error_output: String,
  pub run_failed: String,
  pub submit_failed: String,
  // Notifications
  /// `{score}`
  pub code_passed: String,
  pub code_not_passed: String,
  pub code_error: String,
  /// `{score}`
  pub answers_scored: String,
  pub answers_error: String,
  // Placeholders
  pub load_failed: String,
  pub no_coding: String,
  pub no_choice: String,
  pub no_fill_blank: String,
}

impl Default for Messages {
  fn default() -> Self {
    Self {
      running: "Running code...".into(),
      grading: "Running and grading code...".into(),
      no_output: "No output".into(),
      run_error_output: "Error: {error}".into(),
      run_failed: "An error occurred while running the code".into(),
      submit_failed: "An error occurred while submitting the code".into(),
      code_passed: "Success! You scored {score}%".into(),
      code_not_passed: "Your code did not pass all tests. Try again!".into(),
      code_error: "Error running code".into(),
      answers_scored: "Submitted! You scored {score}%".into(),
      answers_error: "Error submitting answers".into(),
      load_failed: "Lesson not found or you don't have access to this lesson.".into(),
      no_coding: "No coding exercise available for this lesson.".into(),
      no_choice: "No multiple choice questions available for this lesson.".into(),
      no_fill_blank: "No fill-in-the-blank exercise available for this lesson.".into(),
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Grading {
  /// Percentage at or above which a scored answer set is a success (else a warning).
  pub pass_threshold: f64,
  /// Drop responses older than the last applied one instead of letting the last to settle win.
  pub discard_stale_responses: bool,
}

impl Default for Grading {
  fn default() -> Self {
    Self { pass_threshold: 70.0, discard_stale_responses: false }
  }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
  pub api_base_url: String,
  pub auth_token: Option<String>,
  /// `None`: requests may hang indefinitely.
  pub request_timeout: Option<Duration>,
  pub messages: Messages,
  pub grading: Grading,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self::resolve(None, |_| None)
  }
}

impl ClientConfig {
  /// Build from the process environment (and LESSON_CONFIG_PATH if set).
  pub fn from_env() -> Self {
    let file = load_file_config_from_env();
    Self::resolve(file, |key| std::env::var(key).ok())
  }

  /// Merge defaults, an optional file overlay and an environment lookup.
  pub fn resolve<F>(file: Option<FileConfig>, env: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let file = file.unwrap_or_default();
    let env_nonblank = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let api_base_url = env_nonblank("LMS_API_BASE_URL")
      .or(file.api_base_url)
      .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let api_base_url = api_base_url.trim_end_matches('/').to_string();

    let timeout_secs = match env_nonblank("LMS_REQUEST_TIMEOUT_SECS") {
      Some(raw) => match raw.parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(e) => {
          warn!(target: "lesson_runner", %raw, error = %e, "Ignoring invalid LMS_REQUEST_TIMEOUT_SECS");
          file.request_timeout_secs
        }
      },
      None => file.request_timeout_secs,
    };

    Self {
      api_base_url,
      auth_token: env_nonblank("LMS_AUTH_TOKEN"),
      request_timeout: timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
      messages: file.messages,
      grading: file.grading,
    }
  }
}

/// Attempt to load `FileConfig` from LESSON_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_file_config_from_env() -> Option<FileConfig> {
  let path = std::env::var("LESSON_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_file_config(&s) {
      Ok(cfg) => {
        info!(target: "lesson_runner", %path, "Loaded client config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lesson_runner", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lesson_runner", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_file_config(s: &str) -> Result<FileConfig, toml::de::Error> {
  toml::from_str::<FileConfig>(s)
}
