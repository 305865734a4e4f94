use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::oracle::{Oracle, OracleError};

/// Oracle fake that replays scripted answers in order and records every
/// `(system, user)` prompt pair it was asked.
pub struct ScriptedOracle {
  answers: Mutex<VecDeque<Result<String, OracleError>>>,
  calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedOracle {
  pub fn new(answers: Vec<Result<String, OracleError>>) -> Self {
    Self { answers: Mutex::new(answers.into()), calls: Mutex::new(Vec::new()) }
  }

  pub fn calls(&self) -> Vec<(String, String)> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl Oracle for ScriptedOracle {
  async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError> {
    self.calls.lock().unwrap().push((system.to_string(), user.to_string()));
    self.answers
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Err(OracleError::Transport("script exhausted".into())))
  }
}
