//! Generation orchestrator: notes first, then a quiz grounded in those notes.
//!
//! Both oracle answers go through the same `decode` pipeline
//! (extract → normalize). Only oracle failures abort a generation; output
//! that cannot be parsed degrades into a renderable record instead.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{ConfigError, Prompts, DEFAULT_TOPIC};
use crate::domain::{GenerationResult, NotesRecord, QuizRecord};
use crate::extract::extract_structured;
use crate::normalize::{normalize_notes, normalize_quiz};
use crate::oracle::{Oracle, OracleError};
use crate::util::{fill_template, trunc_for_log};

/// Which oracle call a failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Notes,
  Quiz,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Stage::Notes => "notes",
      Stage::Quiz => "quiz",
    })
  }
}

#[derive(Debug, Clone, Error)]
pub enum GenerateError {
  #[error("configuration error: {0}")]
  Configuration(#[from] ConfigError),

  /// The oracle failed during `stage`. A quiz-stage failure carries the
  /// notes that were already obtained.
  #[error("{stage} stage failed: {source}")]
  Oracle {
    stage: Stage,
    #[source]
    source: OracleError,
    partial_notes: Option<Box<NotesRecord>>,
  },
}

impl GenerateError {
  /// Stable machine-readable class: configuration, oracle_transport, oracle_rejection.
  pub fn kind(&self) -> &'static str {
    match self {
      GenerateError::Configuration(_) => "configuration",
      GenerateError::Oracle { source: OracleError::Transport(_), .. } => "oracle_transport",
      GenerateError::Oracle { source: OracleError::Rejected { .. }, .. } => "oracle_rejection",
    }
  }

  pub fn stage(&self) -> Option<Stage> {
    match self {
      GenerateError::Configuration(_) => None,
      GenerateError::Oracle { stage, .. } => Some(*stage),
    }
  }
}

/// Turn raw oracle text into a record with the given normalizer.
/// Shared by the notes and quiz paths.
pub fn decode<T>(raw: &str, topic: &str, normalize: fn(Option<&Value>, &str, &str) -> T) -> T {
  let value = extract_structured(raw);
  if value.is_none() {
    warn!(target: "generation", raw_len = raw.len(), preview = %trunc_for_log(raw, 80), "Oracle output not parseable; degrading");
  }
  normalize(value.as_ref(), raw, topic)
}

pub struct Generator {
  oracle: Arc<dyn Oracle>,
  prompts: Prompts,
  default_topic: String,
}

impl Generator {
  pub fn new(oracle: Arc<dyn Oracle>, prompts: Prompts, default_topic: impl Into<String>) -> Self {
    let default_topic = default_topic.into();
    let default_topic = if default_topic.trim().is_empty() { DEFAULT_TOPIC.to_string() } else { default_topic };
    Self { oracle, prompts, default_topic }
  }

  /// Blank topics fall back to the configured default; nothing is rejected.
  pub fn resolve_topic(&self, topic: &str) -> String {
    let t = topic.trim();
    if t.is_empty() { self.default_topic.clone() } else { t.to_string() }
  }

  #[instrument(level = "info", skip(self, topic), fields(run_id = %Uuid::new_v4(), topic_len = topic.len()))]
  pub async fn generate(&self, topic: &str) -> Result<GenerationResult, GenerateError> {
    let topic = self.resolve_topic(topic);

    let notes_user = fill_template(&self.prompts.notes_user_template, &[("topic", topic.as_str())]);
    let raw_notes = self
      .oracle
      .complete(&self.prompts.notes_system, &notes_user)
      .await
      .map_err(|source| {
        error!(target: "generation", stage = %Stage::Notes, error = %source, "Oracle call failed");
        GenerateError::Oracle { stage: Stage::Notes, source, partial_notes: None }
      })?;
    let notes = decode(&raw_notes, &topic, normalize_notes);
    debug!(target: "generation", title = %notes.title, body_len = notes.body_markdown.len(), "Notes decoded");

    let quiz_user = fill_template(
      &self.prompts.quiz_user_template,
      &[("topic", topic.as_str()), ("notes", notes.body_markdown.as_str())],
    );
    let raw_quiz = match self.oracle.complete(&self.prompts.quiz_system, &quiz_user).await {
      Ok(text) => text,
      Err(source) => {
        error!(target: "generation", stage = %Stage::Quiz, error = %source, "Oracle call failed");
        return Err(GenerateError::Oracle {
          stage: Stage::Quiz,
          source,
          partial_notes: Some(Box::new(notes)),
        });
      }
    };
    let quiz: QuizRecord = decode(&raw_quiz, &topic, normalize_quiz);

    info!(
      target: "generation",
      notes_title = %notes.title,
      questions = quiz.questions.len(),
      quiz_degraded = quiz.raw_text.is_some(),
      "Generation complete"
    );
    Ok(GenerationResult { notes, quiz })
  }
}
