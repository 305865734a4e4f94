//! Application state: the generation orchestrator, or the configuration error
//! that prevents building one.
//!
//! A missing OPENAI_API_KEY does not stop the server from starting; every
//! generation request then fails fast with a configuration error and no
//! oracle call is attempted.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::config::{load_agent_config_from_env, AgentConfig, ConfigError, OracleSettings};
use crate::generator::{GenerateError, Generator};
use crate::openai::OpenAI;
use crate::oracle::Oracle;

pub struct AppState {
  generator: Result<Generator, ConfigError>,
}

impl AppState {
  /// Build state from env: load prompt config, read oracle settings, init OpenAI.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let cfg = load_agent_config_from_env().unwrap_or_default();

    let oracle = OracleSettings::from_env().and_then(|settings| {
      let oa = OpenAI::new(&settings, cfg.prompts.temperature)?;
      info!(target: "study_backend", base_url = %oa.base_url, model = %oa.model, timeout = ?settings.timeout, "OpenAI enabled.");
      Ok(Arc::new(oa) as Arc<dyn Oracle>)
    });

    match oracle {
      Ok(oracle) => Self::with_oracle(oracle, cfg),
      Err(e) => {
        error!(target: "study_backend", error = %e, "Oracle not configured; generation requests will fail.");
        Self::unconfigured(e)
      }
    }
  }

  pub fn with_oracle(oracle: Arc<dyn Oracle>, cfg: AgentConfig) -> Self {
    Self { generator: Ok(Generator::new(oracle, cfg.prompts, cfg.default_topic)) }
  }

  pub fn unconfigured(err: ConfigError) -> Self {
    Self { generator: Err(err) }
  }

  pub fn generator(&self) -> Result<&Generator, GenerateError> {
    self.generator.as_ref().map_err(|e| GenerateError::Configuration(e.clone()))
  }
}
