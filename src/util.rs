//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Render a backend score the way the server sent it: `70` stays `70`, `66.5` stays `66.5`.
pub fn format_score(score: f64) -> String {
  if score.fract() == 0.0 && score.is_finite() {
    format!("{:.0}", score)
  } else {
    format!("{}", score)
  }
}

/// `Some(s)` only when `s` has visible content. Mirrors the `a || b` fallbacks of the web client.
pub fn non_empty(s: Option<String>) -> Option<String> {
  s.filter(|v| !v.is_empty())
}

/// Log-safe truncation for large strings (char-boundary aware).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}
