//! Server configuration
//!
//! Everything the process needs from its environment is resolved once, at
//! start-up, into a [`ServerConfig`]. The backend client is then built from
//! that value and passed down explicitly; nothing below this module reads the
//! environment.
//!
//! # Environment Variables
//!
//! - `OPENAI_API_KEY` - backend credential (required)
//! - `OPENAI_BASE_URL` - alternative API base URL
//! - `DECOMPOSITION_MODEL` - model name (default `gpt-5.2`)
//! - `DECOMPOSITION_REASONING_EFFORT` - `low`, `medium` or `high` (default `high`)
//! - `DECOMPOSITION_MAX_SUBQUESTIONS` - default top-level cap (default 5)
//! - `DECOMPOSITION_CUTOFF_DATE` - pin every call to a past date (replay)

use crate::decompose::{
    parse_cutoff_date, today, DEFAULT_MAX_SUBQUESTIONS, MAX_SUBQUESTIONS_LIMIT,
};
use crate::llm::openai::{OpenAiClient, DEFAULT_OPENAI_URL};
use crate::llm::{LlmError, ReasoningEffort};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "DECOMPOSITION_MODEL";
pub const REASONING_EFFORT_VAR: &str = "DECOMPOSITION_REASONING_EFFORT";
pub const MAX_SUBQUESTIONS_VAR: &str = "DECOMPOSITION_MAX_SUBQUESTIONS";
pub const CUTOFF_DATE_VAR: &str = "DECOMPOSITION_CUTOFF_DATE";

/// Default reasoning model
pub const DEFAULT_MODEL: &str = "gpt-5.2";

/// Configuration problems, all fatal at start-up
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
    #[error("failed to build backend client: {0}")]
    Client(String),
}

/// Server configuration with defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Reasoning model name
    pub model: String,
    /// Reasoning effort hint sent with every call
    pub reasoning_effort: ReasoningEffort,
    /// Backend API base URL
    pub base_url: String,
    /// Default cap on top-level subquestions when the caller gives none
    pub max_subquestions: usize,
    /// Fixed cutoff date for replay; `None` means "today" at call time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff_date: Option<String>,
    /// Backend credential, never serialized
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            reasoning_effort: ReasoningEffort::High,
            base_url: DEFAULT_OPENAI_URL.to_string(),
            max_subquestions: DEFAULT_MAX_SUBQUESTIONS,
            cutoff_date: None,
            api_key: None,
        }
    }
}

impl ServerConfig {
    /// Resolve configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = ServerConfig::default();

        config.api_key = Some(get(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)?);

        if let Some(url) = get(BASE_URL_VAR) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }
        if let Some(effort) = get(REASONING_EFFORT_VAR) {
            config.reasoning_effort = effort.parse().map_err(|message| ConfigError::InvalidValue {
                var: REASONING_EFFORT_VAR,
                message,
            })?;
        }
        if let Some(max) = get(MAX_SUBQUESTIONS_VAR) {
            config.max_subquestions =
                max.trim()
                    .parse::<usize>()
                    .map_err(|e| ConfigError::InvalidValue {
                        var: MAX_SUBQUESTIONS_VAR,
                        message: e.to_string(),
                    })?;
        }
        if let Some(date) = get(CUTOFF_DATE_VAR) {
            config.cutoff_date = Some(date.trim().to_string());
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise only fail on the first call
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_subquestions == 0 || self.max_subquestions > MAX_SUBQUESTIONS_LIMIT {
            return Err(ConfigError::InvalidValue {
                var: MAX_SUBQUESTIONS_VAR,
                message: format!(
                    "must be between 1 and {}, got {}",
                    MAX_SUBQUESTIONS_LIMIT, self.max_subquestions
                ),
            });
        }
        if let Some(date) = &self.cutoff_date {
            parse_cutoff_date(date).map_err(|e| ConfigError::InvalidValue {
                var: CUTOFF_DATE_VAR,
                message: e.to_string(),
            })?;
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: MODEL_VAR,
                message: "model name cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Cutoff date for a call made now
    pub fn effective_cutoff_date(&self) -> String {
        self.cutoff_date.clone().unwrap_or_else(today)
    }

    /// Build the backend client from this configuration
    pub fn build_client(&self) -> Result<OpenAiClient, ConfigError> {
        let api_key = self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)?;
        let client = OpenAiClient::with_api_key(&self.model, api_key)
            .map_err(|e: LlmError| ConfigError::Client(e.to_string()))?;
        Ok(client.with_base_url(&self.base_url))
    }
}
