//! Configuration: oracle settings from the environment plus optional prompt
//! overrides from a TOML file (AGENT_CONFIG_PATH).
//!
//! See `AgentConfig` and `Prompts` for the TOML schema.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_TOPIC: &str = "Buffer overflow";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("missing required setting {0}")]
  Missing(&'static str),
  #[error("invalid value for {name}: {reason}")]
  Invalid { name: &'static str, reason: String },
  /// The HTTP client itself could not be initialised (TLS backend, resolver).
  #[error("http client could not be built: {0}")]
  HttpClient(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct AgentConfig {
  #[serde(default = "default_topic")]
  pub default_topic: String,
  #[serde(default)]
  pub prompts: Prompts,
}

impl Default for AgentConfig {
  fn default() -> Self {
    Self { default_topic: default_topic(), prompts: Prompts::default() }
  }
}

fn default_topic() -> String {
  DEFAULT_TOPIC.to_string()
}

/// Prompt templates. `{topic}` and `{notes}` are substituted at request time.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub notes_system: String,
  pub notes_user_template: String,
  pub quiz_system: String,
  pub quiz_user_template: String,
  pub temperature: f32,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      notes_system: "You are a cybersecurity tutor who writes concise, accurate study notes. Respond ONLY with strict JSON.".into(),
      notes_user_template: "Write study notes on the topic: {topic}.\nReturn a JSON object: {\"type\": \"study_notes\", \"title\": string, \"tl;dr\": string, \"body_md\": string}.\n`body_md` is Markdown with headings, key concepts, a worked example and common pitfalls.".into(),
      quiz_system: "You are an exam writer. Questions must be answerable from the provided notes. Respond ONLY with strict JSON.".into(),
      quiz_user_template: "Topic: {topic}\n\nNotes:\n{notes}\n\nWrite a quiz of exactly 8 multiple-choice questions of mixed difficulty (easy, medium, hard) based on the notes above.\nEach question has exactly 4 options labelled A-D and one correct answer.\nReturn a JSON object: {\"type\": \"quiz\", \"title\": string, \"questions\": [{\"question\": string, \"options\": {\"A\": string, \"B\": string, \"C\": string, \"D\": string}, \"answer\": \"A\"|\"B\"|\"C\"|\"D\", \"explanation\": string}]}.".into(),
      temperature: 0.4,
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "study_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "study_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "study_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Everything needed to reach the oracle. The key is required; the rest has defaults.
#[derive(Clone)]
pub struct OracleSettings {
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub timeout: Duration,
}

impl std::fmt::Debug for OracleSettings {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OracleSettings")
      .field("api_key", &"<redacted>")
      .field("base_url", &self.base_url)
      .field("model", &self.model)
      .field("timeout", &self.timeout)
      .finish()
  }
}

impl OracleSettings {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_vars(|name| std::env::var(name).ok())
  }

  /// Same as `from_env`, reading variables through `lookup`.
  pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let api_key = non_empty("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
    let base_url = non_empty("OPENAI_BASE_URL")
      .unwrap_or_else(|| DEFAULT_BASE_URL.into())
      .trim_end_matches('/')
      .to_string();
    let model = non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());
    let timeout_secs = match non_empty("OPENAI_TIMEOUT_SECS") {
      Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
        name: "OPENAI_TIMEOUT_SECS",
        reason: e.to_string(),
      })?,
      None => DEFAULT_TIMEOUT_SECS,
    };

    Ok(Self { api_key, base_url, model, timeout: Duration::from_secs(timeout_secs) })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
      pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |k: &str| map.get(k).cloned()
  }

  #[test]
  fn missing_api_key_is_a_configuration_error() {
    let err = OracleSettings::from_vars(vars(&[])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
    let err = OracleSettings::from_vars(vars(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
  }

  #[test]
  fn defaults_apply_when_only_key_is_set() {
    let s = OracleSettings::from_vars(vars(&[("OPENAI_API_KEY", "sk-test")])).expect("settings");
    assert_eq!(s.base_url, DEFAULT_BASE_URL);
    assert_eq!(s.model, DEFAULT_MODEL);
    assert_eq!(s.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    assert!(!format!("{s:?}").contains("sk-test"));
  }

  #[test]
  fn overrides_and_bad_timeout() {
    let s = OracleSettings::from_vars(vars(&[
      ("OPENAI_API_KEY", "k"),
      ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
      ("OPENAI_MODEL", "gpt-4o"),
      ("OPENAI_TIMEOUT_SECS", "5"),
    ]))
    .expect("settings");
    assert_eq!(s.base_url, "http://localhost:8080/v1");
    assert_eq!(s.model, "gpt-4o");
    assert_eq!(s.timeout, Duration::from_secs(5));

    let err = OracleSettings::from_vars(vars(&[("OPENAI_API_KEY", "k"), ("OPENAI_TIMEOUT_SECS", "soon")]))
      .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "OPENAI_TIMEOUT_SECS", .. }));
  }

  #[test]
  fn http_client_failure_is_not_blamed_on_a_setting() {
    let err = ConfigError::HttpClient("no TLS backend".into());
    assert_eq!(err.to_string(), "http client could not be built: no TLS backend");
    assert!(!err.to_string().contains("OPENAI_"));
  }

  #[test]
  fn toml_overrides_are_partial() {
    let cfg: AgentConfig = toml::from_str(
      r#"
default_topic = "XSS"
[prompts]
quiz_system = "Be terse."
"#,
    )
    .expect("toml");
    assert_eq!(cfg.default_topic, "XSS");
    assert_eq!(cfg.prompts.quiz_system, "Be terse.");
    assert_eq!(cfg.prompts.notes_system, Prompts::default().notes_system);

    let empty: AgentConfig = toml::from_str("").expect("toml");
    assert_eq!(empty.default_topic, DEFAULT_TOPIC);
  }

  #[test]
  fn default_templates_carry_placeholders() {
    let p = Prompts::default();
    assert!(p.notes_user_template.contains("{topic}"));
    assert!(p.quiz_user_template.contains("{notes}"));
    assert!(p.quiz_user_template.contains("8 multiple-choice"));
  }
}
