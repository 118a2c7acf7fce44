//! Transient notifications (success/warning/error banners).
//!
//! Engines publish through the `NotificationSink` port; the lesson session owns
//! a `NotificationSlot` that keeps only the latest one.

use std::sync::{Arc, Mutex};

use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
  Success,
  Warning,
  Error,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Warning => "warning",
      Self::Error => "error",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
  pub message: String,
  pub severity: Severity,
}

impl Notification {
  pub fn new(severity: Severity, message: impl Into<String>) -> Self {
    Self { message: message.into(), severity }
  }
}

pub trait NotificationSink: Send + Sync {
  fn notify(&self, notification: Notification);
}

#[derive(Debug, Default)]
struct SlotState {
  last: Option<Notification>,
  open: bool,
}

/// Single-slot "last notification" holder. Cloning shares the slot.
#[derive(Clone, Debug, Default)]
pub struct NotificationSlot {
  inner: Arc<Mutex<SlotState>>,
}

impl NotificationSlot {
  pub fn new() -> Self {
    Self::default()
  }

  /// Latest notification while it has not been dismissed.
  pub fn current(&self) -> Option<Notification> {
    let st = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    if st.open { st.last.clone() } else { None }
  }

  pub fn close(&self) {
    self.inner.lock().unwrap_or_else(|e| e.into_inner()).open = false;
  }
}

impl NotificationSink for NotificationSlot {
  fn notify(&self, notification: Notification) {
    info!(target: "lesson_runner", severity = notification.severity.as_str(), message = %notification.message, "Notification");
    let mut st = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    st.last = Some(notification);
    st.open = true;
  }
}
