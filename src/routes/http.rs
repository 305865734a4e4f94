//! HTTP endpoint handlers. These are thin wrappers that forward to the generator.
//! Each handler is instrumented and logs basic result info.

use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::domain::GenerationResult;
use crate::generator::GenerateError;
use crate::oracle::OracleError;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// A missing or unreadable body counts as "no topic" and gets the default.
#[instrument(level = "info", skip_all)]
pub async fn http_generate(
  State(state): State<Arc<AppState>>,
  body: Option<Json<GenerateIn>>,
) -> Result<Json<GenerationResult>, GenerateError> {
  let topic = body.and_then(|Json(b)| b.topic).unwrap_or_default();
  let result = state.generator()?.generate(&topic).await?;
  info!(
    target: "generation",
    title = %result.notes.title,
    questions = result.quiz.questions.len(),
    "HTTP generate served"
  );
  Ok(Json(result))
}

impl GenerateError {
  fn status_code(&self) -> StatusCode {
    match self {
      GenerateError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
      GenerateError::Oracle { source: OracleError::Transport(_), .. } => StatusCode::BAD_GATEWAY,
      GenerateError::Oracle { source: OracleError::Rejected { .. }, .. } => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for GenerateError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    let out = ErrorOut {
      error: self.kind(),
      stage: self.stage(),
      message: self.to_string(),
      notes: match self {
        GenerateError::Oracle { partial_notes, .. } => partial_notes.map(|n| *n),
        GenerateError::Configuration(_) => None,
      },
    };
    (status, Json(out)).into_response()
  }
}
