//! Line-oriented terminal front-end for a lesson session.
//!
//! Reads one command per line, applies it to the session, and redraws the view.
//! Generic over the reader/writer so tests can drive it from byte buffers.

pub mod render;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::binder::DropEvent;
use crate::config::Messages;
use crate::engines::Outcome;
use crate::error::AnswerError;
use crate::session::{LessonSession, LoadState, LoadedLesson};
use crate::wizard::{Step, StepOutcome};

pub const HELP: &str = "\
Commands:
  next | back              move through the steps (next on the last step finishes)
  edit                     replace the code buffer; end input with a line containing only '.'
  load <path>              replace the code buffer with a file's contents
  run                      run the code without grading
  submit                   submit the active step
  select <option>          choose an option on the multiple choice step
  fill <blank> <text>      type an answer into a blank
  drop <blank> <option>    drop one of a blank's options into it
  clear <blank>            empty a blank again
  dismiss                  close the notification
  show                     redraw the lesson
  help                     this text
  quit                     leave
";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
  Next,
  Back,
  Edit,
  Load(String),
  Run,
  Submit,
  Select(usize),
  Fill { blank: usize, text: String },
  Drop { blank: usize, option: usize },
  Clear(usize),
  Dismiss,
  Show,
  Help,
  Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
  #[error("empty command")]
  Empty,
  #[error("unknown command '{0}' (type 'help')")]
  Unknown(String),
  #[error("'{command}' needs {what}")]
  MissingArgument { command: &'static str, what: &'static str },
  #[error("'{0}' is not a valid index")]
  BadIndex(String),
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
  let line = line.trim();
  let (word, rest) = match line.split_once(char::is_whitespace) {
    Some((w, r)) => (w, r.trim()),
    None => (line, ""),
  };
  match word.to_ascii_lowercase().as_str() {
    "" => Err(CommandError::Empty),
    "next" | "n" => Ok(Command::Next),
    "back" | "b" => Ok(Command::Back),
    "edit" => Ok(Command::Edit),
    "load" => {
      if rest.is_empty() {
        return Err(CommandError::MissingArgument { command: "load", what: "a file path" });
      }
      Ok(Command::Load(rest.to_string()))
    }
    "run" => Ok(Command::Run),
    "submit" => Ok(Command::Submit),
    "select" => Ok(Command::Select(index_arg(rest, "select", "an option number")?)),
    "fill" => {
      let (blank, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
      Ok(Command::Fill { blank: index_arg(blank, "fill", "a blank number")?, text: text.trim().to_string() })
    }
    "drop" => {
      let mut args = rest.split_whitespace();
      let blank = index_arg(args.next().unwrap_or(""), "drop", "a blank number")?;
      let option = index_arg(args.next().unwrap_or(""), "drop", "an option number")?;
      Ok(Command::Drop { blank, option })
    }
    "clear" => Ok(Command::Clear(index_arg(rest, "clear", "a blank number")?)),
    "dismiss" => Ok(Command::Dismiss),
    "show" => Ok(Command::Show),
    "help" | "?" => Ok(Command::Help),
    "quit" | "exit" | "q" => Ok(Command::Quit),
    other => Err(CommandError::Unknown(other.to_string())),
  }
}

fn index_arg(raw: &str, command: &'static str, what: &'static str) -> Result<usize, CommandError> {
  if raw.is_empty() {
    return Err(CommandError::MissingArgument { command, what });
  }
  raw.parse().map_err(|_| CommandError::BadIndex(raw.to_string()))
}

/// Full-screen text for the session's current state.
pub async fn render_view(session: &LessonSession) -> String {
  let mut out = String::new();
  let lesson = match session.state() {
    LoadState::Loading => return "Loading lesson...\n".to_string(),
    LoadState::Unavailable(msg) => return format!("{msg}\n"),
    LoadState::Ready(l) => l,
  };
  let msgs = &session.config().messages;
  render::header(&mut out, &lesson.title, &lesson.description);
  render::stepper(&mut out, session.wizard());
  match session.wizard().active() {
    Step::Coding => render::coding(&mut out, lesson.coding.exercise(), &lesson.coding.snapshot().await, msgs),
    Step::MultipleChoice => render::choice(&mut out, lesson.choice.questions(), &lesson.choice.snapshot().await, msgs),
    Step::FillBlank => {
      let fb = &lesson.fill_blank;
      render::fill_blank(&mut out, fb.exercise(), fb.segments(), &fb.snapshot().await, msgs)
    }
  }
  render::notification(&mut out, session.notifications().current().as_ref());
  render::nav(&mut out, session.wizard());
  out
}

/// What the loop does after a command.
enum Flow {
  Redraw,
  Say(String),
  Finish,
}

/// Something the loop woke up for.
enum Event {
  Line(Option<String>),
  Settled(Result<(&'static str, Outcome), JoinError>),
}

/// Engine actions still waiting on the backend. Dropping the set aborts them.
type InFlight = JoinSet<(&'static str, Outcome)>;

/// Drive `session` from `reader` until `quit`, `Finish` on the last step, or end of input.
///
/// Run and submit actions are spawned, so input keeps being read while they are
/// in flight; each one triggers a redraw when it settles. At end of input the
/// loop waits for outstanding actions before returning; `quit` and `Finish`
/// abandon them.
pub async fn run<R, W>(session: &mut LessonSession, reader: R, mut writer: W) -> std::io::Result<()>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  let mut lines = reader.lines();
  let mut in_flight = InFlight::new();
  writer.write_all(render_view(session).await.as_bytes()).await?;
  writer.write_all(b"> ").await?;
  writer.flush().await?;

  loop {
    let event = tokio::select! {
      line = lines.next_line() => Event::Line(line?),
      Some(done) = in_flight.join_next(), if !in_flight.is_empty() => Event::Settled(done),
    };

    let flow = match event {
      Event::Settled(done) => settled_flow(done),
      Event::Line(None) => {
        while let Some(done) = in_flight.join_next().await {
          let flow = settled_flow(done);
          write_flow(session, &mut writer, flow).await?;
        }
        writer.flush().await?;
        return Ok(());
      }
      Event::Line(Some(line)) => match parse_command(&line) {
        Ok(cmd) => {
          debug!(target: "lesson_runner", ?cmd, "Command");
          match cmd {
            Command::Quit => {
              if !in_flight.is_empty() {
                info!(target: "lesson_runner", pending = in_flight.len(), "Abandoning in-flight actions");
              }
              return Ok(());
            }
            Command::Edit => {
              writer.write_all(b"Enter code; finish with a line containing only '.'\n").await?;
              let mut code = String::new();
              while let Some(l) = lines.next_line().await? {
                if l == "." {
                  break;
                }
                code.push_str(&l);
                code.push('\n');
              }
              match session.lesson() {
                Some(l) => {
                  l.coding.set_code(code).await;
                  Flow::Redraw
                }
                None => Flow::Say(unavailable(session)),
              }
            }
            cmd => apply(session, cmd, &mut in_flight).await,
          }
        }
        Err(CommandError::Empty) => Flow::Say(String::new()),
        Err(e) => Flow::Say(format!("error: {e}\n")),
      },
    };

    if let Flow::Finish = flow {
      info!(target: "lesson_runner", lesson_id = session.lesson_id(), "Lesson finished");
      writer.write_all(b"Lesson finished.\n").await?;
      writer.flush().await?;
      return Ok(());
    }
    write_flow(session, &mut writer, flow).await?;
    writer.write_all(b"> ").await?;
    writer.flush().await?;
  }
}

async fn write_flow<W: AsyncWrite + Unpin>(session: &LessonSession, writer: &mut W, flow: Flow) -> std::io::Result<()> {
  match flow {
    Flow::Redraw => writer.write_all(render_view(session).await.as_bytes()).await,
    Flow::Say(text) => writer.write_all(text.as_bytes()).await,
    Flow::Finish => Ok(()),
  }
}

fn settled_flow(done: Result<(&'static str, Outcome), JoinError>) -> Flow {
  match done {
    Ok((action, outcome)) => {
      debug!(target: "lesson_runner", action, ?outcome, "Action settled");
      outcome_flow(outcome)
    }
    Err(e) => {
      warn!(target: "lesson_runner", error = %e, "Action task failed");
      Flow::Say(format!("error: {e}\n"))
    }
  }
}

/// Every command except `quit` and `edit`, which need the input stream.
async fn apply(session: &mut LessonSession, cmd: Command, in_flight: &mut InFlight) -> Flow {
  match cmd {
    Command::Help => Flow::Say(HELP.to_string()),
    Command::Show => Flow::Redraw,
    Command::Dismiss => {
      session.notifications().close();
      Flow::Redraw
    }
    Command::Load(path) => match tokio::fs::read_to_string(&path).await {
      Ok(code) => match session.lesson() {
        Some(l) => {
          info!(target: "lesson_runner", %path, bytes = code.len(), "Code buffer loaded from file");
          l.coding.set_code(code).await;
          Flow::Redraw
        }
        None => Flow::Say(unavailable(session)),
      },
      Err(e) => {
        warn!(target: "lesson_runner", %path, error = %e, "Cannot read code file");
        Flow::Say(format!("error: cannot read {path}: {e}\n"))
      }
    },
    _ if session.lesson().is_none() => Flow::Say(unavailable(session)),
    Command::Next => match session.next() {
      StepOutcome::Finished => Flow::Finish,
      _ => Flow::Redraw,
    },
    Command::Back => {
      session.back();
      Flow::Redraw
    }
    cmd => match session.lesson() {
      Some(lesson) => act(lesson, session.wizard().active(), cmd, &session.config().messages, in_flight).await,
      None => Flow::Say(unavailable(session)),
    },
  }
}

fn unavailable(session: &LessonSession) -> String {
  match session.state() {
    LoadState::Unavailable(msg) => format!("{msg}\n"),
    _ => "Lesson is still loading.\n".to_string(),
  }
}

/// Step-bound actions. Network actions are spawned onto `in_flight`; answer edits apply at once.
async fn act(lesson: &LoadedLesson, step: Step, cmd: Command, msgs: &Messages, in_flight: &mut InFlight) -> Flow {
  match (step, cmd) {
    (Step::Coding, Command::Run) => {
      let engine = lesson.coding.clone();
      in_flight.spawn(async move { ("run", engine.execute_code().await) });
      Flow::Say(format!("{}\n", msgs.running))
    }
    (Step::Coding, Command::Submit) => {
      let engine = lesson.coding.clone();
      in_flight.spawn(async move { ("submit", engine.submit_code().await) });
      Flow::Say(format!("{}\n", msgs.grading))
    }
    (Step::MultipleChoice, Command::Submit) => {
      let engine = lesson.choice.clone();
      in_flight.spawn(async move { ("submit", engine.submit_answers().await) });
      Flow::Say("Submitting answers...\n".to_string())
    }
    (Step::FillBlank, Command::Submit) => {
      let engine = lesson.fill_blank.clone();
      in_flight.spawn(async move { ("submit", engine.submit_answers().await) });
      Flow::Say("Submitting answers...\n".to_string())
    }
    (Step::MultipleChoice, Command::Select(option)) => match lesson.choice.questions().first() {
      Some(q) => answer_flow(lesson.choice.select(&q.id, option).await.map(|_| true)),
      None => Flow::Say(format!("{}\n", msgs.no_choice)),
    },
    (Step::FillBlank, Command::Fill { blank, text }) => answer_flow(lesson.fill_blank.type_text(blank, &text).await.map(|_| true)),
    (Step::FillBlank, Command::Drop { blank, option }) => {
      answer_flow(lesson.fill_blank.drop_option(DropEvent { source_index: option, destination: Some(blank) }).await)
    }
    (Step::FillBlank, Command::Clear(blank)) => answer_flow(lesson.fill_blank.clear_blank(blank).await.map(|_| true)),
    (step, cmd) => Flow::Say(format!("error: {} is not available on the {} step\n", command_name(&cmd), step.label())),
  }
}

fn outcome_flow(outcome: Outcome) -> Flow {
  match outcome {
    Outcome::Applied => Flow::Redraw,
    Outcome::Discarded => Flow::Say("A newer response was already applied.\n".to_string()),
    Outcome::Blocked => Flow::Say("Nothing to submit.\n".to_string()),
  }
}

fn answer_flow(res: Result<bool, AnswerError>) -> Flow {
  match res {
    Ok(true) => Flow::Redraw,
    Ok(false) => Flow::Say("Dropped outside any blank.\n".to_string()),
    Err(e) => Flow::Say(format!("error: {e}\n")),
  }
}

fn command_name(cmd: &Command) -> &'static str {
  match cmd {
    Command::Run => "run",
    Command::Submit => "submit",
    Command::Select(_) => "select",
    Command::Fill { .. } => "fill",
    Command::Drop { .. } => "drop",
    Command::Clear(_) => "clear",
    _ => "this command",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{client_for, config_for, spawn_backend};
  use axum::{extract::Path, http::StatusCode, routing::{get, post}, Json, Router};
  use serde_json::{json, Value};
  use std::sync::{Arc, Mutex};
  use std::time::Duration;
  use tokio::io::{AsyncReadExt, BufReader, DuplexStream};
  use tokio::task::JoinHandle;

  #[test]
  fn parses_commands_and_arguments() {
    assert_eq!(parse_command("  next "), Ok(Command::Next));
    assert_eq!(parse_command("SELECT 2"), Ok(Command::Select(2)));
    assert_eq!(parse_command("fill 0 quick brown fox"), Ok(Command::Fill { blank: 0, text: "quick brown fox".into() }));
    assert_eq!(parse_command("drop 1 0"), Ok(Command::Drop { blank: 1, option: 0 }));
    assert_eq!(parse_command("clear 1"), Ok(Command::Clear(1)));
    assert_eq!(parse_command("load ./solution.py"), Ok(Command::Load("./solution.py".into())));
    assert_eq!(parse_command(""), Err(CommandError::Empty));
    assert_eq!(parse_command("select x"), Err(CommandError::BadIndex("x".into())));
    assert_eq!(parse_command("drop 1"), Err(CommandError::MissingArgument { command: "drop", what: "an option number" }));
    assert_eq!(parse_command("dance"), Err(CommandError::Unknown("dance".into())));
  }

  fn lesson(id: &str) -> Option<Value> {
    let lesson = match id {
      "5" => json!({"id": 5, "title": "Loops", "description": "Count to three", "content_type": "coding",
        "content": {"instructions": "Print 1..3", "starter_code": ""}}),
      "6" => json!({"id": 6, "title": "Quiz", "content_type": "multiple_choice",
        "content": {"question": "Pick B", "options": ["A", "B", "C"], "correct_option": 1}}),
      "7" => json!({"id": 7, "title": "Fox", "content_type": "fill_in_blank",
        "content": {"text": "The {{0}} jumps over the {{1}}.", "blanks": ["fox", "dog"]}}),
      "8" => json!({"id": 8, "title": "Legacy fox", "fill_blank_exercises": [{
        "text_template": "The {{0}} jumps over the {{1}}.",
        "blanks": [{"options": ["cat", "fox"]}, {"options": ["dog", "log"]}]}]}),
      "9" => json!({"id": 9, "title": "Slow", "content_type": "coding",
        "content": {"starter_code": "hang()\n"}}),
      _ => return None,
    };
    Some(lesson)
  }

  /// Mock LMS. Fill-blank bodies are recorded in `posted`; code containing `hang` never gets an answer.
  fn backend(posted: Arc<Mutex<Vec<Value>>>) -> Router {
    Router::new()
      .route(
        "/lessons/:id",
        get(|Path(id): Path<String>| async move {
          match lesson(&id) {
            Some(l) => (StatusCode::OK, Json(json!({"lesson": l}))),
            None => (StatusCode::NOT_FOUND, Json(json!({"error": "Lesson not found"}))),
          }
        }),
      )
      .route(
        "/code/run",
        post(|Json(body): Json<Value>| async move {
          let code = body["code"].as_str().unwrap_or("").to_string();
          if code.contains("hang") {
            tokio::time::sleep(Duration::from_secs(30)).await;
          }
          Json(json!({"output": format!("ran {} bytes", code.len())}))
        }),
      )
      .route(
        "/progress/multiple-choice/:id",
        post(|Json(body): Json<Value>| async move {
          let score = if body["answers"]["content_mcq"] == json!(1) { 100 } else { 0 };
          Json(json!({"score": score}))
        }),
      )
      .route(
        "/progress/fill-blank/:id",
        post(move |Json(body): Json<Value>| {
          let posted = posted.clone();
          async move {
            let score = if body["answers"] == json!(["fox", "dog"]) { 100 } else { 50 };
            posted.lock().unwrap().push(body);
            Json(json!({"score": score}))
          }
        }),
      )
  }

  async fn session(lesson_id: &str) -> (LessonSession, Arc<Mutex<Vec<Value>>>) {
    let posted = Arc::new(Mutex::new(Vec::new()));
    let base = spawn_backend(backend(posted.clone())).await;
    let mut s = LessonSession::new(client_for(base.clone()), config_for(base), lesson_id);
    s.load().await;
    (s, posted)
  }

  /// Feed `input` in one go and collect everything written.
  async fn drive(lesson_id: &str, input: &str) -> (String, Vec<Value>) {
    let (mut s, posted) = session(lesson_id).await;
    let mut out = Vec::new();
    run(&mut s, BufReader::new(input.as_bytes()), &mut out).await.unwrap();
    let posted = posted.lock().unwrap().clone();
    (String::from_utf8(out).unwrap(), posted)
  }

  /// A loop running on its own task, fed one line at a time.
  struct Repl {
    stdin: DuplexStream,
    stdout: DuplexStream,
    seen: String,
    task: JoinHandle<std::io::Result<()>>,
  }

  impl Repl {
    async fn start(lesson_id: &str) -> Self {
      let (mut s, _) = session(lesson_id).await;
      let (stdin, input) = tokio::io::duplex(1 << 16);
      let (output, stdout) = tokio::io::duplex(1 << 20);
      let task = tokio::spawn(async move { run(&mut s, BufReader::new(input), output).await });
      Self { stdin, stdout, seen: String::new(), task }
    }

    async fn send(&mut self, line: &str) {
      self.stdin.write_all(format!("{line}\n").as_bytes()).await.unwrap();
    }

    /// Read until `needle` shows up in output produced after this call; returns that output.
    async fn until(&mut self, needle: &str) -> String {
      let start = self.seen.len();
      let stdout = &mut self.stdout;
      let seen = &mut self.seen;
      let read = tokio::time::timeout(Duration::from_secs(5), async {
        let mut buf = [0u8; 4096];
        while !seen[start..].contains(needle) {
          let n = stdout.read(&mut buf).await.unwrap();
          assert!(n > 0, "output closed before {needle:?}");
          seen.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
      })
      .await;
      assert!(read.is_ok(), "timed out waiting for {needle:?}; got {:?}", &self.seen[start..]);
      self.seen[start..].to_string()
    }

    async fn quit(mut self) {
      self.send("quit").await;
      let done = tokio::time::timeout(Duration::from_secs(5), self.task).await;
      assert!(matches!(done, Ok(Ok(Ok(())))), "loop did not stop on quit");
    }
  }

  #[tokio::test]
  async fn edit_then_run_shows_output() {
    let (out, _) = drive("5", "edit\nfor i in range(3):\n    print(i+1)\n.\nrun\n").await;
    assert!(out.contains("== Loops =="));
    assert!(out.contains("  1 | # Write your code here"));
    assert!(out.contains("  2 |     print(i+1)"));
    assert!(out.contains("Running code..."));
    assert!(out.contains("Output:\nran 34 bytes"));
  }

  #[tokio::test]
  async fn load_replaces_the_buffer_from_a_file() {
    let path = std::env::temp_dir().join(format!("lesson-runner-load-{}.py", std::process::id()));
    tokio::fs::write(&path, "print('from file')\n").await.unwrap();
    let (out, _) = drive("5", &format!("load {}\nload /no/such/file.py\nquit\n", path.display())).await;
    let _ = tokio::fs::remove_file(&path).await;
    assert!(out.contains("  1 | print('from file')"));
    assert!(out.contains("error: cannot read /no/such/file.py"));
  }

  #[tokio::test]
  async fn commands_keep_flowing_while_a_run_hangs() {
    let res = tokio::time::timeout(Duration::from_secs(5), drive("9", "run\nrun\nnext\nquit\n")).await;
    let (out, _) = res.expect("command loop stalled behind an in-flight run");
    assert_eq!(out.matches("Running code...").count(), 2);
    assert!(out.contains("[2 Multiple Choice]"));
  }

  #[tokio::test]
  async fn busy_label_shows_while_the_run_is_outstanding() {
    let mut repl = Repl::start("9").await;
    repl.until("[next] Next").await;
    repl.send("run").await;
    repl.until("Running code...").await;

    let mut busy = false;
    for _ in 0..50 {
      repl.send("show").await;
      if repl.until("[next] Next").await.contains("[run] Running...") {
        busy = true;
        break;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(busy, "view never showed the running label");

    repl.send("run").await;
    repl.until("Running code...").await;
    repl.send("next").await;
    repl.until("[2 Multiple Choice]").await;
    repl.quit().await;
  }

  #[tokio::test]
  async fn multiple_choice_submit_and_dismiss() {
    let mut repl = Repl::start("6").await;
    repl.send("next").await;
    repl.until("[2 Multiple Choice]").await;
    repl.send("select 1").await;
    repl.until("(*) 1. B").await;
    repl.send("submit").await;
    repl.until("<success> Submitted! You scored 100%").await;
    repl.send("dismiss").await;
    let view = repl.until("[back] Back").await;
    assert!(!view.contains("<success>"));
    assert!(view.contains("Last score: 100%"));
    repl.quit().await;
  }

  #[tokio::test]
  async fn free_text_blanks_are_submitted_in_order() {
    let (out, posted) = drive("7", "next\nnext\nfill 0 fox\nfill 1 dog\nsubmit\n").await;
    assert!(out.contains("  blank 0: fox"));
    assert!(out.contains("The [0: fox] jumps over the [1: dog]."));
    assert!(out.contains("<success> Submitted! You scored 100%"));
    assert_eq!(posted, vec![json!({"answers": ["fox", "dog"]})]);
  }

  #[tokio::test]
  async fn dropped_options_can_be_cleared_and_replaced() {
    let (out, posted) = drive("8", "next\nnext\ndrop 0 1\ndrop 1 1\nclear 1\ndrop 1 0\nfill 0 x\nsubmit\n").await;
    assert!(out.contains("== Legacy fox =="));
    assert!(out.contains("The [0: fox] jumps over the [1: ____]."));
    assert!(out.contains("error: this exercise takes DragDrop input"));
    assert_eq!(posted, vec![json!({"answers": ["fox", "dog"]})]);
  }

  #[tokio::test]
  async fn finish_on_last_step_ends_the_loop() {
    let (out, _) = drive("5", "next\nnext\nnext\nhelp\n").await;
    assert!(out.contains("No multiple choice questions available for this lesson."));
    assert!(out.contains("[next] Finish"));
    assert!(out.ends_with("Lesson finished.\n"));
    assert!(!out.contains("Commands:"));
  }

  #[tokio::test]
  async fn step_bound_commands_are_rejected_elsewhere() {
    let (out, _) = drive("5", "select 1\nclear 0\nquit\n").await;
    assert!(out.contains("error: select is not available on the Coding Exercise step"));
    assert!(out.contains("error: clear is not available on the Coding Exercise step"));
  }

  #[tokio::test]
  async fn unavailable_lesson_only_reports_the_failure() {
    let (out, _) = drive("99", "next\nquit\n").await;
    assert!(out.starts_with("Lesson not found or you don't have access to this lesson.\n"));
    assert_eq!(out.matches("Lesson not found").count(), 2);
  }
}
