//! Domain models: the lesson record as fetched, and the normalized exercise
//! view-model the wizard and engines work from.

use serde::Deserialize;
use serde_json::Value;

/// Which of the three exercise shapes a lesson's `content` follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
  Coding,
  MultipleChoice,
  FillInBlank,
}

impl ContentType {
  pub fn parse(raw: &str) -> Option<Self> {
    match raw {
      "coding" => Some(Self::Coding),
      "multiple_choice" => Some(Self::MultipleChoice),
      "fill_in_blank" => Some(Self::FillInBlank),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Coding => "coding",
      Self::MultipleChoice => "multiple_choice",
      Self::FillInBlank => "fill_in_blank",
    }
  }
}

/// Lesson record as served by `GET /lessons/{id}`.
///
/// Every field is optional and loosely typed on purpose: the normalizer decides
/// what to make of it, so decoding never fails on content shape.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Lesson {
  #[serde(default)]
  pub id: Value,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub content_type: Option<String>,
  #[serde(default)]
  pub content: Value,

  // Legacy array-based shape
  #[serde(default)]
  pub coding_exercises: Value,
  #[serde(default)]
  pub multiple_choice_questions: Value,
  #[serde(default)]
  pub fill_blank_exercises: Value,
}

impl Lesson {
  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or_default()
  }

  pub fn description(&self) -> &str {
    self.description.as_deref().unwrap_or_default()
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodingExercise {
  pub instructions: String,
  pub starter_code: String,
  pub solution_code: String,
  pub test_code: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipleChoiceQuestion {
  /// Key used in the submitted answer map.
  pub id: String,
  pub question_text: String,
  pub options: Vec<String>,
  pub correct_option_index: usize,
}

/// How a fill-in-the-blank exercise collects its answers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlankInput {
  /// One text field per blank (current single-object shape).
  #[default]
  FreeText,
  /// Draggable option tokens dropped onto blank slots (legacy shape).
  DragDrop,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blank {
  /// Caption shown next to the input (current shape only).
  pub label: String,
  /// Draggable tokens for this blank (legacy shape only).
  pub options: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FillBlankExercise {
  pub text_template: String,
  pub blanks: Vec<Blank>,
  pub input: BlankInput,
}

/// Normalized lesson content: one variant per content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exercise {
  Coding(CodingExercise),
  MultipleChoice(MultipleChoiceQuestion),
  FillBlank(FillBlankExercise),
  Empty,
}

impl Exercise {
  pub fn content_type(&self) -> Option<ContentType> {
    match self {
      Self::Coding(_) => Some(ContentType::Coding),
      Self::MultipleChoice(_) => Some(ContentType::MultipleChoice),
      Self::FillBlank(_) => Some(ContentType::FillInBlank),
      Self::Empty => None,
    }
  }
}

/// View-model exposing the three collections the wizard steps read from.
/// At most one collection is non-empty, and it holds at most one element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedExercise {
  pub coding_exercises: Vec<CodingExercise>,
  pub multiple_choice_questions: Vec<MultipleChoiceQuestion>,
  pub fill_blank_exercises: Vec<FillBlankExercise>,
}

impl From<Exercise> for NormalizedExercise {
  fn from(ex: Exercise) -> Self {
    let mut out = Self::default();
    match ex {
      Exercise::Coding(c) => out.coding_exercises.push(c),
      Exercise::MultipleChoice(q) => out.multiple_choice_questions.push(q),
      Exercise::FillBlank(f) => out.fill_blank_exercises.push(f),
      Exercise::Empty => {}
    }
    out
  }
}

impl NormalizedExercise {
  pub fn coding(&self) -> Option<&CodingExercise> {
    self.coding_exercises.first()
  }

  pub fn multiple_choice(&self) -> Option<&MultipleChoiceQuestion> {
    self.multiple_choice_questions.first()
  }

  pub fn fill_blank(&self) -> Option<&FillBlankExercise> {
    self.fill_blank_exercises.first()
  }

  pub fn content_type(&self) -> Option<ContentType> {
    if !self.coding_exercises.is_empty() {
      Some(ContentType::Coding)
    } else if !self.multiple_choice_questions.is_empty() {
      Some(ContentType::MultipleChoice)
    } else if !self.fill_blank_exercises.is_empty() {
      Some(ContentType::FillInBlank)
    } else {
      None
    }
  }
}
