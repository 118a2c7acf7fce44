//! lesson-runner · terminal client for LMS lessons
//!
//! Usage: `lesson-runner <lesson_id>` (or set LESSON_ID).
//!
//! Important env variables:
//!   LMS_API_BASE_URL         : backend base URL (default "http://127.0.0.1:5000/api")
//!   LMS_AUTH_TOKEN           : bearer token sent with every request
//!   LMS_REQUEST_TIMEOUT_SECS : per-request timeout; unset means no timeout
//!   LESSON_CONFIG_PATH       : path to TOML config (messages + grading)
//!   LOG_LEVEL                : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT               : "pretty" (default) or "json"

use tokio::io::BufReader;
use tracing::{info, instrument, warn};

use lesson_runner::{telemetry, terminal, ClientConfig, LessonSession, LmsClient};

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let lesson_id = std::env::args()
    .nth(1)
    .or_else(|| std::env::var("LESSON_ID").ok())
    .ok_or("usage: lesson-runner <lesson_id>")?;

  let config = ClientConfig::from_env();
  let client = LmsClient::new(&config)?;
  info!(target: "lesson_runner", base_url = %client.base_url, %lesson_id, "Starting lesson runner");

  let mut session = LessonSession::new(client, config, lesson_id);
  session.load().await;

  let stdin = BufReader::new(tokio::io::stdin());
  let stdout = tokio::io::stdout();
  tokio::select! {
    res = terminal::run(&mut session, stdin, stdout) => res?,
    _ = tokio::signal::ctrl_c() => warn!(target: "lesson_runner", "Interrupted"),
  }
  Ok(())
}
