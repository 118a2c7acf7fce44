//! Lesson Runner · student-facing exercise runtime for the LMS
//!
//! - Loads a lesson from the REST backend and normalizes its content
//! - Walks the student through a 3-step wizard (coding → multiple choice → fill-in-the-blank)
//! - One submission engine per exercise modality, each talking to its own endpoint
//! - Single-slot notification port shared by the engines
//!
//! The `terminal` module is one front-end over this library; the
//! session and engines do not depend on it.

pub mod binder;
pub mod client;
pub mod config;
pub mod domain;
pub mod engines;
pub mod error;
pub mod normalize;
pub mod notify;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod template;
pub mod terminal;
pub mod util;
pub mod wizard;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::LmsClient;
pub use config::ClientConfig;
pub use session::{LessonSession, LoadState};
