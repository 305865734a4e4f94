//! Coerces loosely-typed oracle JSON into the canonical records.
//!
//! Nothing here fails: unparseable or oddly-shaped input produces a degraded
//! record that still renders, and the raw oracle text is preserved.
//!
//! Field names accepted from the oracle are listed in the `*_KEYS` tables
//! below; the first present key wins.

use serde_json::{Map, Value};

use crate::domain::{NotesRecord, QuestionRecord, QuizRecord};

const TITLE_KEYS: &[&str] = &["title"];
const SUMMARY_KEYS: &[&str] = &["summary", "tl;dr", "tldr"];
const BODY_KEYS: &[&str] = &["bodyMarkdown", "body_md", "body_markdown", "body"];
const QUESTIONS_KEYS: &[&str] = &["questions"];

const ID_KEYS: &[&str] = &["id"];
const PROMPT_KEYS: &[&str] = &["prompt", "q", "question", "text"];
const OPTIONS_KEYS: &[&str] = &["options", "choices"];
const ANSWER_KEYS: &[&str] = &["answerKey", "answer", "correct", "correctOption"];
const EXPLANATION_KEYS: &[&str] = &["explanation", "explain"];

/// Letters taken first, in this order, when options arrive as a mapping.
const OPTION_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

const MISSING_PROMPT: &str = "Question text unavailable";

/// Options are labelled A..Z by position downstream.
pub const MAX_OPTIONS: usize = 26;

pub fn notes_fallback_title(topic: &str) -> String {
  format!("{topic} — notes")
}

pub fn quiz_fallback_title(topic: &str) -> String {
  format!("{topic} — quiz")
}

/// Build a `NotesRecord` from an extracted value. When nothing was extracted
/// the whole raw text becomes the body so nothing is lost.
pub fn normalize_notes(value: Option<&Value>, raw: &str, topic: &str) -> NotesRecord {
  let Some(obj) = value.and_then(Value::as_object) else {
    return NotesRecord {
      title: notes_fallback_title(topic),
      summary: String::new(),
      body_markdown: raw.to_string(),
    };
  };

  NotesRecord {
    title: text_field(obj, TITLE_KEYS)
      .filter(|t| !t.trim().is_empty())
      .unwrap_or_else(|| notes_fallback_title(topic)),
    summary: text_field(obj, SUMMARY_KEYS).unwrap_or_default(),
    body_markdown: text_field(obj, BODY_KEYS).unwrap_or_default(),
  }
}

/// Build a `QuizRecord` from an extracted value. Questions keyed by label are
/// turned into a sequence in key order; every element goes through
/// `normalize_question`.
pub fn normalize_quiz(value: Option<&Value>, raw: &str, topic: &str) -> QuizRecord {
  let Some(obj) = value.and_then(Value::as_object) else {
    return QuizRecord {
      title: quiz_fallback_title(topic),
      questions: Vec::new(),
      raw_text: Some(raw.to_string()),
    };
  };

  let elements: Vec<&Value> = match first_present(obj, QUESTIONS_KEYS) {
    Some(Value::Array(items)) => items.iter().collect(),
    Some(Value::Object(keyed)) => keyed.values().collect(),
    _ => Vec::new(),
  };

  QuizRecord {
    title: text_field(obj, TITLE_KEYS)
      .filter(|t| !t.trim().is_empty())
      .unwrap_or_else(|| quiz_fallback_title(topic)),
    questions: elements
      .into_iter()
      .enumerate()
      .map(|(idx, el)| normalize_question(el, idx))
      .collect(),
    raw_text: None,
  }
}

/// The shapes a single question may arrive in. Resolved once per element.
#[derive(Debug, PartialEq)]
pub enum InputDialect<'a> {
  /// Options already a sequence (`options` or `choices`).
  Sequence { options: &'a [Value] },
  /// `question` text with options keyed by letter.
  LetteredMapping { question: &'a Value, options: Option<&'a Map<String, Value>> },
  /// Anything else; fields are picked up wherever they are.
  Loose,
}

impl<'a> InputDialect<'a> {
  pub fn detect(obj: &'a Map<String, Value>) -> Self {
    if let Some(options) = OPTIONS_KEYS.iter().find_map(|k| obj.get(*k).and_then(Value::as_array)) {
      return InputDialect::Sequence { options };
    }
    if let Some(question) = first_present(obj, &["question"]) {
      return InputDialect::LetteredMapping { question, options: mapped_options(obj) };
    }
    InputDialect::Loose
  }
}

/// Normalize one question element found at position `idx` (0-based).
pub fn normalize_question(element: &Value, idx: usize) -> QuestionRecord {
  let fallback_id = format!("q{}", idx + 1);

  let Some(obj) = element.as_object() else {
    // A bare string (or number) is taken as the prompt itself.
    let prompt = scalar_text(element).filter(|s| !s.trim().is_empty());
    return QuestionRecord {
      id: fallback_id,
      prompt: prompt.unwrap_or_else(|| MISSING_PROMPT.to_string()),
      options: Vec::new(),
      answer_key: None,
      explanation: String::new(),
    };
  };

  let (prompt, mut options): (Option<String>, Vec<String>) = match InputDialect::detect(obj) {
    InputDialect::Sequence { options } => (
      text_field(obj, PROMPT_KEYS),
      options.iter().map(value_to_text).collect(),
    ),
    InputDialect::LetteredMapping { question, options } => (
      Some(value_to_text(question)),
      options.map(lettered_options).unwrap_or_default(),
    ),
    InputDialect::Loose => (
      text_field(obj, PROMPT_KEYS),
      mapped_options(obj).map(lettered_options).unwrap_or_default(),
    ),
  };
  options.truncate(MAX_OPTIONS);

  QuestionRecord {
    id: text_field(obj, ID_KEYS)
      .filter(|s| !s.trim().is_empty())
      .unwrap_or(fallback_id),
    prompt: prompt
      .filter(|s| !s.trim().is_empty())
      .unwrap_or_else(|| MISSING_PROMPT.to_string()),
    options,
    answer_key: text_field(obj, ANSWER_KEYS).filter(|s| !s.is_empty()),
    explanation: text_field(obj, EXPLANATION_KEYS).unwrap_or_default(),
  }
}

/// First options field holding a keyed mapping.
fn mapped_options(obj: &Map<String, Value>) -> Option<&Map<String, Value>> {
  OPTIONS_KEYS.iter().find_map(|k| obj.get(*k).and_then(Value::as_object))
}

/// A–D first, then any other keys in their original order.
fn lettered_options(map: &Map<String, Value>) -> Vec<String> {
  let mut out: Vec<String> = OPTION_LETTERS
    .iter()
    .filter_map(|letter| map.get(*letter))
    .map(value_to_text)
    .collect();
  out.extend(
    map
      .iter()
      .filter(|(k, _)| !OPTION_LETTERS.contains(&k.as_str()))
      .map(|(_, v)| value_to_text(v)),
  );
  out
}

/// First key of `keys` present with a usable value. Null and blank strings
/// count as absent so the next accepted name is tried.
fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
  keys.iter().find_map(|k| obj.get(*k).filter(|v| !is_blank(v)))
}

fn is_blank(v: &Value) -> bool {
  match v {
    Value::Null => true,
    Value::String(s) => s.trim().is_empty(),
    _ => false,
  }
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
  first_present(obj, keys).map(value_to_text)
}

/// Strings pass through; structured values become their JSON text;
/// other scalars are stringified.
fn value_to_text(v: &Value) -> String {
  match v {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    Value::Array(_) | Value::Object(_) => {
      serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
    }
    other => other.to_string(),
  }
}

fn scalar_text(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.clone()),
    Value::Number(_) | Value::Bool(_) => Some(v.to_string()),
    _ => None,
  }
}
