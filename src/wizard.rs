//! The 3-step exercise wizard: coding → multiple choice → fill-in-the-blank.
//!
//! Strictly linear. Steps are never gated on whether the lesson has content for
//! them; an empty step just renders a placeholder.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Step {
  #[default]
  Coding,
  MultipleChoice,
  FillBlank,
}

impl Step {
  pub const ALL: [Step; 3] = [Step::Coding, Step::MultipleChoice, Step::FillBlank];

  pub fn index(self) -> usize {
    match self {
      Self::Coding => 0,
      Self::MultipleChoice => 1,
      Self::FillBlank => 2,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Coding => "Coding Exercise",
      Self::MultipleChoice => "Multiple Choice",
      Self::FillBlank => "Fill in the Blanks",
    }
  }

  pub fn is_last(self) -> bool {
    self == Self::FillBlank
  }
}

/// Result of a navigation command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
  Moved(Step),
  /// `Back` at the first step.
  Unchanged,
  /// `Finish` at the last step: leave the lesson.
  Finished,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Wizard {
  active: Step,
}

impl Wizard {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn active(&self) -> Step {
    self.active
  }

  pub fn can_go_back(&self) -> bool {
    self.active != Step::Coding
  }

  /// Label of the forward action: "Next", or "Finish" on the last step.
  pub fn forward_label(&self) -> &'static str {
    if self.active.is_last() { "Finish" } else { "Next" }
  }

  pub fn next(&mut self) -> StepOutcome {
    self.active = match self.active {
      Step::Coding => Step::MultipleChoice,
      Step::MultipleChoice => Step::FillBlank,
      Step::FillBlank => return StepOutcome::Finished,
    };
    StepOutcome::Moved(self.active)
  }

  pub fn back(&mut self) -> StepOutcome {
    self.active = match self.active {
      Step::Coding => return StepOutcome::Unchanged,
      Step::MultipleChoice => Step::Coding,
      Step::FillBlank => Step::MultipleChoice,
    };
    StepOutcome::Moved(self.active)
  }

  pub fn reset(&mut self) {
    self.active = Step::Coding;
  }
}
