//! Lesson normalization: raw lesson record → `Exercise`.
//!
//! Two backend shapes are accepted:
//!   - current: `content_type` + a single `content` object
//!   - legacy:  no `content_type`, but `coding_exercises` / `multiple_choice_questions`
//!     / `fill_blank_exercises` arrays (only the first element is used)
//!
//! Normalization is total: missing or mistyped fields default to empty
//! strings/arrays, and an unknown `content_type` yields `Exercise::Empty`.

use serde_json::Value;
use tracing::debug;

use crate::domain::{
  Blank, BlankInput, CodingExercise, ContentType, Exercise, FillBlankExercise, Lesson,
  MultipleChoiceQuestion,
};

/// Answer-map key of the single-object multiple-choice question.
pub const CONTENT_MCQ_ID: &str = "content_mcq";

pub fn normalize(lesson: &Lesson) -> Exercise {
  let exercise = match lesson.content_type.as_deref() {
    Some(raw) => match ContentType::parse(raw) {
      Some(ContentType::Coding) => Exercise::Coding(coding_from_content(&lesson.content)),
      Some(ContentType::MultipleChoice) => Exercise::MultipleChoice(choice_from_content(&lesson.content)),
      Some(ContentType::FillInBlank) => Exercise::FillBlank(fill_blank_from_content(&lesson.content)),
      None => Exercise::Empty,
    },
    None => from_legacy_arrays(lesson),
  };
  debug!(
    target: "lesson",
    content_type = ?lesson.content_type,
    normalized = ?exercise.content_type().map(ContentType::as_str),
    "Lesson content normalized"
  );
  exercise
}

// ---------- current single-object shape ----------

fn coding_from_content(content: &Value) -> CodingExercise {
  CodingExercise {
    instructions: str_field(content, "instructions"),
    starter_code: str_field(content, "starter_code"),
    solution_code: str_field(content, "solution_code"),
    test_code: str_field(content, "test_code"),
  }
}

fn choice_from_content(content: &Value) -> MultipleChoiceQuestion {
  MultipleChoiceQuestion {
    id: CONTENT_MCQ_ID.to_string(),
    question_text: str_field(content, "question"),
    options: strings_field(content, "options"),
    correct_option_index: index_field(content, "correct_option"),
  }
}

fn fill_blank_from_content(content: &Value) -> FillBlankExercise {
  let blanks = list_field(content, "blanks")
    .into_iter()
    .map(|b| Blank { label: value_to_text(&b), options: Vec::new() })
    .collect();
  FillBlankExercise { text_template: str_field(content, "text"), blanks, input: BlankInput::FreeText }
}

// ---------- legacy array shape ----------

fn from_legacy_arrays(lesson: &Lesson) -> Exercise {
  if let Some(first) = first_element(&lesson.coding_exercises) {
    return Exercise::Coding(coding_from_content(&first));
  }
  if let Some(first) = first_element(&lesson.multiple_choice_questions) {
    let id = match first.get("id") {
      Some(v) if !v.is_null() => value_to_text(v),
      _ => "0".to_string(),
    };
    return Exercise::MultipleChoice(MultipleChoiceQuestion {
      id,
      question_text: str_field(&first, "question_text"),
      options: strings_field(&first, "options"),
      correct_option_index: index_field(&first, "correct_option_index"),
    });
  }
  if let Some(first) = first_element(&lesson.fill_blank_exercises) {
    let blanks = list_field(&first, "blanks")
      .into_iter()
      .map(|b| match &b {
        Value::Object(_) => Blank { label: str_field(&b, "label"), options: strings_field(&b, "options") },
        other => Blank { label: value_to_text(other), options: Vec::new() },
      })
      .collect();
    return Exercise::FillBlank(FillBlankExercise {
      text_template: str_field(&first, "text_template"),
      blanks,
      input: BlankInput::DragDrop,
    });
  }
  Exercise::Empty
}

fn first_element(v: &Value) -> Option<Value> {
  as_list(v).into_iter().next()
}

// ---------- total field accessors ----------

fn str_field(v: &Value, key: &str) -> String {
  match v.get(key) {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Number(n)) => n.to_string(),
    Some(Value::Bool(b)) => b.to_string(),
    _ => String::new(),
  }
}

fn index_field(v: &Value, key: &str) -> usize {
  match v.get(key) {
    Some(Value::Number(n)) => n.as_u64().map(|n| n as usize).unwrap_or(0),
    Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
    _ => 0,
  }
}

fn list_field(v: &Value, key: &str) -> Vec<Value> {
  v.get(key).map(as_list).unwrap_or_default()
}

fn strings_field(v: &Value, key: &str) -> Vec<String> {
  list_field(v, key).iter().map(value_to_text).collect()
}

/// Arrays as-is; strings holding a JSON-encoded array are decoded; anything else is empty.
fn as_list(v: &Value) -> Vec<Value> {
  match v {
    Value::Array(items) => items.clone(),
    Value::String(s) => match serde_json::from_str::<Value>(s) {
      Ok(Value::Array(items)) => items,
      _ => Vec::new(),
    },
    _ => Vec::new(),
  }
}

fn value_to_text(v: &Value) -> String {
  match v {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}
