//! Canonical records returned to callers: study notes, quiz, questions.
//!
//! Every accepted oracle dialect is normalized into these shapes before it
//! leaves the backend. The `kind` tag lets the frontend tell records apart.

use serde::{Deserialize, Serialize};

/// Study notes for a topic. `body_markdown` is always text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename = "notes", rename_all = "camelCase")]
pub struct NotesRecord {
  pub title: String,
  pub summary: String,
  pub body_markdown: String,
}

/// Multiple-choice quiz. `raw_text` is only set when the oracle output could
/// not be parsed and is kept for debugging surfaces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename = "quiz", rename_all = "camelCase")]
pub struct QuizRecord {
  pub title: String,
  pub questions: Vec<QuestionRecord>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub raw_text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
  pub id: String,
  pub prompt: String,
  pub options: Vec<String>,
  pub answer_key: Option<String>,
  pub explanation: String,
}

/// The only value handed back on success.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
  pub notes: NotesRecord,
  pub quiz: QuizRecord,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn records_serialize_with_kind_tag_and_camel_case() {
    let notes = NotesRecord {
      title: "SQLi".into(),
      summary: "short".into(),
      body_markdown: "# SQLi".into(),
    };
    let v = serde_json::to_value(&notes).expect("serialize");
    assert_eq!(v, json!({ "kind": "notes", "title": "SQLi", "summary": "short", "bodyMarkdown": "# SQLi" }));
  }

  #[test]
  fn quiz_omits_raw_text_unless_degraded() {
    let mut quiz = QuizRecord {
      title: "T".into(),
      questions: vec![QuestionRecord {
        id: "q1".into(),
        prompt: "P".into(),
        options: vec!["a".into()],
        answer_key: None,
        explanation: String::new(),
      }],
      raw_text: None,
    };
    let v = serde_json::to_value(&quiz).expect("serialize");
    assert_eq!(v["kind"], "quiz");
    assert!(v.get("rawText").is_none());
    assert_eq!(v["questions"][0]["answerKey"], serde_json::Value::Null);

    quiz.raw_text = Some("prose".into());
    let v = serde_json::to_value(&quiz).expect("serialize");
    assert_eq!(v["rawText"], "prose");
  }
}
