//! Pulls one JSON value out of free-form model output.
//!
//! Two strategies, first success wins:
//!   1) the first fenced code block (optionally tagged `json`)
//!   2) the span from the first `{` to the last `}`
//!
//! Parsing is strict. Trailing commas, unquoted keys and the like are not
//! repaired; such text is simply "not found".

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)```(?i:json)?\s*(.*?)```").expect("fenced block regex is valid")
});

/// Extract the structured payload of `text`, or `None` if nothing parses.
#[instrument(level = "debug", skip(text), fields(text_len = text.len()))]
pub fn extract_structured(text: &str) -> Option<Value> {
  if text.trim().is_empty() {
    return None;
  }

  if let Some(v) = from_fenced_block(text) {
    debug!(target: "generation", strategy = "fenced", "Structured payload extracted");
    return Some(v);
  }
  if let Some(v) = from_brace_span(text) {
    debug!(target: "generation", strategy = "brace_span", "Structured payload extracted");
    return Some(v);
  }

  debug!(target: "generation", "No structured payload found");
  None
}

fn from_fenced_block(text: &str) -> Option<Value> {
  let caps = FENCED_BLOCK.captures(text)?;
  let inner = caps.get(1)?.as_str().trim();
  serde_json::from_str(inner).ok()
}

fn from_brace_span(text: &str) -> Option<Value> {
  let start = text.find('{')?;
  let end = text.rfind('}')?;
  if end <= start {
    return None;
  }
  serde_json::from_str(&text[start..=end]).ok()
}
