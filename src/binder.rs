//! Fill-in-the-blank answer state and its input adapters.
//!
//! Every input mode funnels into `FillBlankAnswer::place_option`, which is
//! validated against the slot count fixed at load time. Drag/drop and free text
//! are two adapters over that command.

use crate::domain::{BlankInput, FillBlankExercise};
use crate::error::AnswerError;
use crate::template::{blank_count, parse_template};

/// Ordered answer slots, one per blank. `None` = unfilled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FillBlankAnswer {
  slots: Vec<Option<String>>,
}

impl FillBlankAnswer {
  pub fn with_slots(count: usize) -> Self {
    Self { slots: vec![None; count] }
  }

  /// Slots for `exercise`: one per declared blank, or one per `{{n}}` placeholder
  /// when the exercise carries no blank records.
  pub fn for_exercise(exercise: &FillBlankExercise) -> Self {
    Self::with_slots(slot_count(exercise))
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  pub fn slots(&self) -> &[Option<String>] {
    &self.slots
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.slots.get(index).and_then(|s| s.as_deref())
  }

  /// Set slot `blank_index` to `value`. The slot count never changes.
  pub fn place_option(&mut self, blank_index: usize, value: impl Into<String>) -> Result<(), AnswerError> {
    let count = self.slots.len();
    let slot = self
      .slots
      .get_mut(blank_index)
      .ok_or(AnswerError::BlankOutOfRange { index: blank_index, count })?;
    *slot = Some(value.into());
    Ok(())
  }

  pub fn clear(&mut self, blank_index: usize) -> Result<(), AnswerError> {
    let count = self.slots.len();
    let slot = self
      .slots
      .get_mut(blank_index)
      .ok_or(AnswerError::BlankOutOfRange { index: blank_index, count })?;
    *slot = None;
    Ok(())
  }
}

/// One slot per blank; a template with placeholders but no blank records sizes by placeholders.
pub fn slot_count(exercise: &FillBlankExercise) -> usize {
  if !exercise.blanks.is_empty() {
    return exercise.blanks.len();
  }
  blank_count(&parse_template(&exercise.text_template))
}

/// End of a drag gesture. `destination` is the blank slot the token was dropped on, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropEvent {
  /// Position of the dragged token within the option list it was shown in.
  pub source_index: usize,
  pub destination: Option<usize>,
}

/// Drag/drop adapter. The option is looked up by `source_index` within the
/// destination blank's option list. Returns `Ok(false)` when there was no destination.
pub fn apply_drop(
  exercise: &FillBlankExercise,
  answer: &mut FillBlankAnswer,
  event: DropEvent,
) -> Result<bool, AnswerError> {
  if exercise.input != BlankInput::DragDrop {
    return Err(AnswerError::WrongInputMode { expected: exercise.input });
  }
  let Some(dest) = event.destination else {
    return Ok(false);
  };
  let blank = exercise
    .blanks
    .get(dest)
    .ok_or(AnswerError::BlankOutOfRange { index: dest, count: exercise.blanks.len() })?;
  let value = blank
    .options
    .get(event.source_index)
    .ok_or(AnswerError::OptionOutOfRange { index: event.source_index, count: blank.options.len() })?;
  answer.place_option(dest, value.clone())?;
  Ok(true)
}

/// Free-text adapter: typed text goes straight into the slot.
pub fn apply_text(
  exercise: &FillBlankExercise,
  answer: &mut FillBlankAnswer,
  blank_index: usize,
  text: &str,
) -> Result<(), AnswerError> {
  if exercise.input != BlankInput::FreeText {
    return Err(AnswerError::WrongInputMode { expected: exercise.input });
  }
  answer.place_option(blank_index, text)
}
