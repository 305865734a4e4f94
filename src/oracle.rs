//! The text-completion oracle seam.
//!
//! The orchestrator only sees this trait; production wires in the OpenAI
//! client, tests wire in a scripted fake.

use async_trait::async_trait;
use thiserror::Error;

/// Failure calling the oracle. Malformed *output* is not an error here; it is
/// absorbed downstream by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
  /// Network-level failure (connect, timeout, unreadable body).
  #[error("transport error: {0}")]
  Transport(String),
  /// The oracle answered with a non-success status.
  #[error("oracle rejected request (HTTP {status}): {body}")]
  Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Oracle: Send + Sync {
  /// Run one completion and return the raw text.
  async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError>;
}
