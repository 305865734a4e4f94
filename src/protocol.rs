//! Public HTTP request/response structs (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::NotesRecord;
use crate::generator::Stage;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateIn {
  #[serde(default)]
  pub topic: Option<String>,
}

/// Body of every failed generation. `notes` is present when the quiz stage
/// failed after notes were obtained.
#[derive(Debug, Serialize)]
pub struct ErrorOut {
  pub error: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stage: Option<Stage>,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<NotesRecord>,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}
