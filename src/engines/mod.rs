//! Per-modality submission engines.
//!
//! Each engine owns its answer state behind an `Arc<RwLock<..>>` so several
//! actions may be in flight at once. Nothing is cancelled or queued: every
//! response is applied when it settles, so the last one to settle wins, unless
//! `grading.discard_stale_responses` is set, in which case responses older than
//! the last applied one are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::client::LmsClient;
use crate::config::ClientConfig;
use crate::notify::{Notification, NotificationSink, Severity};
use crate::util::{fill_template, format_score};

pub mod choice;
pub mod coding;
pub mod fill_blank;

pub use choice::ChoiceEngine;
pub use coding::CodingEngine;
pub use fill_blank::FillBlankEngine;

/// What happened to a run/submit action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
  /// The response (or failure) was written to engine state.
  Applied,
  /// A newer response had already been applied; this one was dropped.
  Discarded,
  /// The action is disabled (no exercise, or empty code buffer). No request was sent.
  Blocked,
}

/// Everything an engine needs from the lesson page.
#[derive(Clone)]
pub struct EngineContext {
  pub client: LmsClient,
  pub lesson_id: String,
  pub config: Arc<ClientConfig>,
  pub notifier: Arc<dyn NotificationSink>,
}

impl EngineContext {
  pub fn new(client: LmsClient, lesson_id: impl Into<String>, config: Arc<ClientConfig>, notifier: Arc<dyn NotificationSink>) -> Self {
    Self { client, lesson_id: lesson_id.into(), config, notifier }
  }

  pub fn notify(&self, severity: Severity, message: impl Into<String>) {
    self.notifier.notify(Notification::new(severity, message));
  }

  /// Success at or above the pass threshold, warning below it.
  pub fn notify_score(&self, score: f64) {
    let severity = if score >= self.config.grading.pass_threshold { Severity::Success } else { Severity::Warning };
    let message = fill_template(&self.config.messages.answers_scored, &[("score", &format_score(score))]);
    self.notify(severity, message);
  }

  pub fn sequence_guard(&self) -> SequenceGuard {
    SequenceGuard::new(self.config.grading.discard_stale_responses)
  }
}

/// Monotonic request tagging. Disabled guards accept everything.
#[derive(Debug, Default)]
pub struct SequenceGuard {
  enabled: bool,
  issued: AtomicU64,
  applied: AtomicU64,
}

impl SequenceGuard {
  pub fn new(enabled: bool) -> Self {
    Self { enabled, issued: AtomicU64::new(0), applied: AtomicU64::new(0) }
  }

  /// Tag for a request about to be sent. Starts at 1.
  pub fn issue(&self) -> u64 {
    self.issued.fetch_add(1, Ordering::SeqCst) + 1
  }

  /// Whether the response to request `seq` may be applied. Records it as applied if so.
  pub fn accept(&self, seq: u64) -> bool {
    if !self.enabled {
      self.applied.fetch_max(seq, Ordering::SeqCst);
      return true;
    }
    let prev = self.applied.fetch_max(seq, Ordering::SeqCst);
    prev < seq
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn disabled_guard_accepts_out_of_order() {
    let g = SequenceGuard::new(false);
    let a = g.issue();
    let b = g.issue();
    assert!(g.accept(b));
    assert!(g.accept(a));
  }

  #[test]
  fn enabled_guard_drops_older_responses() {
    let g = SequenceGuard::new(true);
    let a = g.issue();
    let b = g.issue();
    let c = g.issue();
    assert!(g.accept(b));
    assert!(!g.accept(a));
    assert!(g.accept(c));
  }
}
