//! Minimal OpenAI-compatible client implementing the `Oracle` contract.
//!
//! We only call chat.completions and return the first choice's text as-is;
//! turning that text into records is the normalizer's job.
//! Calls are instrumented and log model, latency and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::{ConfigError, OracleSettings};
use crate::oracle::{Oracle, OracleError};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
}

impl OpenAI {
  pub fn new(settings: &OracleSettings, temperature: f32) -> Result<Self, ConfigError> {
    let client = reqwest::Client::builder()
      .timeout(settings.timeout)
      .build()
      .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

    Ok(Self {
      client,
      api_key: settings.api_key.clone(),
      base_url: settings.base_url.clone(),
      model: settings.model.clone(),
      temperature,
    })
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model, user_len = user.len()))]
  async fn chat_plain(&self, system: &str, user: &str) -> Result<String, OracleError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature: self.temperature,
    };

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "study-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| {
        error!(elapsed = ?start.elapsed(), error = %e, "OpenAI request failed");
        OracleError::Transport(e.to_string())
      })?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      error!(elapsed = ?start.elapsed(), status, "OpenAI rejected request");
      return Err(OracleError::Rejected { status, body: msg });
    }

    let body: ChatCompletionResponse = res.json().await
      .map_err(|e| OracleError::Transport(format!("unreadable completion body: {e}")))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();

    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Model response received");
    Ok(text)
  }
}

#[async_trait]
impl Oracle for OpenAI {
  async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError> {
    self.chat_plain(system, user).await
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  use axum::{http::{HeaderMap, StatusCode}, routing::post, Json, Router};
  use serde_json::{json, Value};

  /// Serve `app` on an ephemeral local port and return its base URL.
  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/v1")
  }

  fn client_for(base_url: String) -> OpenAI {
    let settings = OracleSettings {
      api_key: "sk-test".into(),
      base_url,
      model: "test-model".into(),
      timeout: Duration::from_secs(5),
    };
    OpenAI::new(&settings, 0.2).expect("client")
  }

  #[test]
  fn new_copies_settings_into_client() {
    let oa = client_for("http://localhost:9/v1".into());
    assert_eq!(oa.base_url, "http://localhost:9/v1");
    assert_eq!(oa.model, "test-model");
    assert_eq!(oa.temperature, 0.2);
  }

  #[tokio::test]
  async fn returns_first_choice_text() {
    let app = Router::new().route(
      "/v1/chat/completions",
      post(|headers: HeaderMap, Json(body): Json<Value>| async move {
        assert_eq!(headers.get("authorization").and_then(|v| v.to_str().ok()), Some("Bearer sk-test"));
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user prompt");
        Json(json!({
          "choices": [{ "message": { "content": "```json\n{\"title\":\"x\"}\n```" } }],
          "usage": { "prompt_tokens": 3, "completion_tokens": 5, "total_tokens": 8 }
        }))
      }),
    );
    let oa = client_for(serve(app).await);
    let text = oa.complete("system prompt", "user prompt").await.expect("completion");
    assert_eq!(text, "```json\n{\"title\":\"x\"}\n```");
  }

  #[tokio::test]
  async fn non_success_status_is_a_rejection_with_provider_message() {
    let app = Router::new().route(
      "/v1/chat/completions",
      post(|| async {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": { "message": "Incorrect API key provided" } })))
      }),
    );
    let oa = client_for(serve(app).await);
    let err = oa.complete("s", "u").await.unwrap_err();
    assert_eq!(err, OracleError::Rejected { status: 401, body: "Incorrect API key provided".into() });
  }

  #[tokio::test]
  async fn rejection_keeps_raw_body_when_not_openai_shaped() {
    let app = Router::new().route(
      "/v1/chat/completions",
      post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let oa = client_for(serve(app).await);
    let err = oa.complete("s", "u").await.unwrap_err();
    assert_eq!(err, OracleError::Rejected { status: 502, body: "upstream down".into() });
  }

  #[tokio::test]
  async fn unreachable_endpoint_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let oa = client_for(format!("http://{addr}/v1"));
    let err = oa.complete("s", "u").await.unwrap_err();
    assert!(matches!(err, OracleError::Transport(_)), "got {err:?}");
  }

  #[test]
  fn extracts_openai_error_message() {
    assert_eq!(
      extract_openai_error(r#"{"error":{"message":"Rate limit","type":"x"}}"#).as_deref(),
      Some("Rate limit")
    );
    assert_eq!(extract_openai_error("not json"), None);
  }
}
