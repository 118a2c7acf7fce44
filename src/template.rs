//! Fill-in-the-blank template parsing.
//!
//! Example:
//!   input:  "The {{0}} jumps over the {{1}}."
//!   output: [Text("The "), Blank(0), Text(" jumps over the "), Blank(1), Text(".")]

use std::sync::OnceLock;

use regex::Regex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
  Text(String),
  /// Slot index taken from the placeholder's number.
  Blank(usize),
}

fn placeholder() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\{\{(\d+)\}\}").unwrap_or_else(|_| unreachable!("static pattern")))
}

/// Split `text` on `{{n}}` placeholders, keeping source order.
/// Empty literal runs are dropped; a placeholder whose number does not fit in
/// `usize` stays literal text.
pub fn parse_template(text: &str) -> Vec<Segment> {
  let mut out = Vec::new();
  let mut literal = String::new();
  let mut last = 0;

  for caps in placeholder().captures_iter(text) {
    let Some(whole) = caps.get(0) else { continue };
    literal.push_str(&text[last..whole.start()]);
    last = whole.end();

    match caps[1].parse::<usize>() {
      Ok(index) => {
        if !literal.is_empty() {
          out.push(Segment::Text(std::mem::take(&mut literal)));
        }
        out.push(Segment::Blank(index));
      }
      Err(_) => literal.push_str(whole.as_str()),
    }
  }

  literal.push_str(&text[last..]);
  if !literal.is_empty() {
    out.push(Segment::Text(literal));
  }
  out
}

pub fn blank_count(segments: &[Segment]) -> usize {
  segments.iter().filter(|s| matches!(s, Segment::Blank(_))).count()
}
