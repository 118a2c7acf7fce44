//! Plain-text rendering of the lesson view.
//!
//! Every function appends to a `String`; nothing here touches I/O or engine locks.

use std::fmt::Write;

use crate::config::Messages;
use crate::domain::{BlankInput, CodingExercise, FillBlankExercise, MultipleChoiceQuestion};
use crate::engines::choice::ChoiceState;
use crate::engines::coding::{Activity, CodingState, GradingResult};
use crate::engines::fill_blank::FillBlankState;
use crate::notify::Notification;
use crate::template::Segment;
use crate::util::format_score;
use crate::wizard::{Step, Wizard};

pub fn header(out: &mut String, title: &str, description: &str) {
  let _ = writeln!(out, "== {title} ==");
  if !description.is_empty() {
    let _ = writeln!(out, "{description}");
  }
  let _ = writeln!(out);
}

/// `[1 Coding Exercise] > 2 Multiple Choice > 3 Fill in the Blanks`, active step bracketed.
pub fn stepper(out: &mut String, wizard: &Wizard) {
  let parts: Vec<String> = Step::ALL
    .iter()
    .map(|s| {
      let label = format!("{} {}", s.index() + 1, s.label());
      if *s == wizard.active() { format!("[{label}]") } else { label }
    })
    .collect();
  let _ = writeln!(out, "{}", parts.join(" > "));
  let _ = writeln!(out);
}

pub fn coding(out: &mut String, exercise: Option<&CodingExercise>, state: &CodingState, msgs: &Messages) {
  let Some(ex) = exercise else {
    let _ = writeln!(out, "{}", msgs.no_coding);
    return;
  };
  if !ex.instructions.is_empty() {
    let _ = writeln!(out, "{}", ex.instructions);
    let _ = writeln!(out);
  }
  let _ = writeln!(out, "--- code ---");
  for (n, line) in state.code.lines().enumerate() {
    let _ = writeln!(out, "{:>3} | {line}", n + 1);
  }
  let _ = writeln!(out, "------------");

  let (run, submit) = match state.activity {
    Activity::Idle => ("Run Code", "Submit"),
    Activity::Running => ("Running...", "Submit"),
    Activity::Grading => ("Run Code", "Submitting..."),
  };
  let disabled = if state.can_submit() { "" } else { " (disabled: empty code)" };
  let _ = writeln!(out, "[run] {run}  [submit] {submit}{disabled}");

  if let Some(text) = &state.output {
    let _ = writeln!(out);
    let _ = writeln!(out, "Output:");
    let _ = writeln!(out, "{text}");
  }
  if let Some(g) = &state.grading {
    grading(out, g);
  }
}

fn grading(out: &mut String, g: &GradingResult) {
  let _ = writeln!(out);
  let _ = writeln!(out, "Test Results: {}/{}", format_score(g.score), format_score(g.max_score));
  for t in &g.test_results {
    let mark = if t.passed { "PASS" } else { "FAIL" };
    let _ = write!(out, "  [{mark}] Test {}", t.test_case);
    if t.message.is_empty() {
      let _ = writeln!(out);
    } else {
      let _ = writeln!(out, ": {}", t.message);
    }
  }
}

pub fn choice(out: &mut String, questions: &[MultipleChoiceQuestion], state: &ChoiceState, msgs: &Messages) {
  if questions.is_empty() {
    let _ = writeln!(out, "{}", msgs.no_choice);
    return;
  }
  for q in questions {
    let _ = writeln!(out, "{}", q.question_text);
    let selected = state.answers.get(&q.id).copied();
    for (i, opt) in q.options.iter().enumerate() {
      let mark = if selected == Some(i) { "(*)" } else { "( )" };
      let _ = writeln!(out, "  {mark} {i}. {opt}");
    }
  }
  let label = if state.submitting { "Submitting..." } else { "Submit Answers" };
  let _ = writeln!(out, "[submit] {label}");
  if let Some(score) = state.last_score {
    let _ = writeln!(out, "Last score: {}%", format_score(score));
  }
}

pub fn fill_blank(out: &mut String, exercise: Option<&FillBlankExercise>, segments: &[Segment], state: &FillBlankState, msgs: &Messages) {
  let Some(ex) = exercise else {
    let _ = writeln!(out, "{}", msgs.no_fill_blank);
    return;
  };
  let mut line = String::new();
  for seg in segments {
    match seg {
      Segment::Text(t) => line.push_str(t),
      Segment::Blank(i) => match state.answer.get(*i) {
        Some(v) => {
          let _ = write!(line, "[{i}: {v}]");
        }
        None => {
          let _ = write!(line, "[{i}: ____]");
        }
      },
    }
  }
  let _ = writeln!(out, "{line}");

  match ex.input {
    BlankInput::FreeText => {
      for (b, blank) in ex.blanks.iter().enumerate() {
        if !blank.label.is_empty() {
          let _ = writeln!(out, "  blank {b}: {}", blank.label);
        }
      }
      let _ = writeln!(out, "Type answers with: fill <blank> <text>");
    }
    BlankInput::DragDrop => {
      let _ = writeln!(out, "Options (drop <blank> <option>):");
      for (b, blank) in ex.blanks.iter().enumerate() {
        let opts: Vec<String> = blank.options.iter().enumerate().map(|(i, o)| format!("{i}. {o}")).collect();
        let _ = writeln!(out, "  blank {b}: {}", opts.join("  "));
      }
    }
  }
  let label = if state.submitting { "Submitting..." } else { "Submit Answers" };
  let _ = writeln!(out, "[submit] {label}");
  if let Some(score) = state.last_score {
    let _ = writeln!(out, "Last score: {}%", format_score(score));
  }
}

pub fn notification(out: &mut String, current: Option<&Notification>) {
  if let Some(n) = current {
    let _ = writeln!(out);
    let _ = writeln!(out, "<{}> {}  (dismiss to close)", n.severity.as_str(), n.message);
  }
}

pub fn nav(out: &mut String, wizard: &Wizard) {
  let _ = writeln!(out);
  if wizard.can_go_back() {
    let _ = writeln!(out, "[back] Back    [next] {}", wizard.forward_label());
  } else {
    let _ = writeln!(out, "[next] {}", wizard.forward_label());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Blank;
  use crate::notify::Severity;
  use crate::protocol::{TestCaseId, TestResult};
  use crate::template::parse_template;

  #[test]
  fn stepper_brackets_the_active_step() {
    let mut w = Wizard::new();
    w.next();
    let mut out = String::new();
    stepper(&mut out, &w);
    assert!(out.starts_with("1 Coding Exercise > [2 Multiple Choice] > 3 Fill in the Blanks"));
  }

  #[test]
  fn empty_steps_render_placeholders() {
    let msgs = Messages::default();
    let mut out = String::new();
    coding(&mut out, None, &CodingState::default(), &msgs);
    choice(&mut out, &[], &ChoiceState::default(), &msgs);
    fill_blank(&mut out, None, &[], &FillBlankState::default(), &msgs);
    assert!(out.contains("No coding exercise available for this lesson."));
    assert!(out.contains("No multiple choice questions available for this lesson."));
    assert!(out.contains("No fill-in-the-blank exercise available for this lesson."));
  }

  #[test]
  fn grading_panel_lists_each_test() {
    let mut state = CodingState::default();
    state.code = "print(1)\n".into();
    state.grading = Some(GradingResult {
      score: 50.0,
      max_score: 100.0,
      passed: false,
      test_results: vec![
        TestResult { test_case: TestCaseId::Number(1), passed: true, message: "ok".into() },
        TestResult { test_case: TestCaseId::Number(2), passed: false, message: String::new() },
      ],
    });
    let ex = CodingExercise { instructions: "Do it".into(), ..Default::default() };
    let mut out = String::new();
    coding(&mut out, Some(&ex), &state, &Messages::default());
    assert!(out.contains("  1 | print(1)"));
    assert!(out.contains("Test Results: 50/100"));
    assert!(out.contains("[PASS] Test 1: ok"));
    assert!(out.contains("[FAIL] Test 2\n"));
  }

  #[test]
  fn whitespace_buffer_marks_actions_disabled() {
    let ex = CodingExercise::default();
    let mut state = CodingState::default();
    state.code = "  \n".into();
    let mut out = String::new();
    coding(&mut out, Some(&ex), &state, &Messages::default());
    assert!(out.contains("(disabled: empty code)"));
  }

  #[test]
  fn fill_blank_interleaves_answers_with_text() {
    let ex = FillBlankExercise {
      text_template: "The {{0}} jumps over the {{1}}.".into(),
      blanks: vec![Blank { label: "fox".into(), options: vec![] }, Blank { label: "dog".into(), options: vec![] }],
      input: BlankInput::FreeText,
    };
    let segments = parse_template(&ex.text_template);
    let mut state = FillBlankState::default();
    state.answer = crate::binder::FillBlankAnswer::with_slots(2);
    state.answer.place_option(0, "fox").unwrap();
    let mut out = String::new();
    fill_blank(&mut out, Some(&ex), &segments, &state, &Messages::default());
    assert!(out.starts_with("The [0: fox] jumps over the [1: ____]."));
    assert!(out.contains("  blank 0: fox\n  blank 1: dog\n"));
  }

  #[test]
  fn nav_shows_finish_on_last_step() {
    let mut w = Wizard::new();
    let mut out = String::new();
    nav(&mut out, &w);
    assert!(out.contains("[next] Next") && !out.contains("[back]"));
    w.next();
    w.next();
    out.clear();
    nav(&mut out, &w);
    assert!(out.contains("[back] Back    [next] Finish"));
  }

  #[test]
  fn notification_line_shows_severity() {
    let mut out = String::new();
    notification(&mut out, Some(&Notification::new(Severity::Warning, "Submitted! You scored 50%")));
    assert!(out.contains("<warning> Submitted! You scored 50%"));
  }
}
