//! Reasoning Backend Abstraction
//!
//! Provides an object-safe async trait for a single schema-constrained call to
//! a reasoning model. The decomposition layer only ever talks to this trait, so
//! tests can substitute an in-memory fake for the hosted backend.
//!
//! # Architecture
//!
//! ```text
//! decompose() → StructuredLlmClient trait → [OpenAiClient, ScriptedLlmClient]
//! ```

pub mod openai;
pub mod scripted;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// How much internal deliberation the backend applies before answering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    #[default]
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

impl std::fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasoningEffort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(ReasoningEffort::Low),
            "medium" => Ok(ReasoningEffort::Medium),
            "high" => Ok(ReasoningEffort::High),
            other => Err(format!(
                "unknown reasoning effort '{}', expected one of: low, medium, high",
                other
            )),
        }
    }
}

/// Strict JSON schema the model output must conform to
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    /// Schema name reported to the backend (letters, digits, `_` and `-`)
    pub name: String,
    /// JSON Schema document
    pub schema: serde_json::Value,
}

/// One schema-constrained request to the reasoning backend
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub reasoning_effort: ReasoningEffort,
    pub output_schema: OutputSchema,
}

/// Raw structured answer from the backend, not yet validated against the
/// caller's Rust types
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    /// JSON text produced under the output schema
    pub content: String,
    /// Token usage reported by the backend
    pub tokens: TokenUsage,
    /// API call latency
    pub latency: Duration,
}

/// Token usage breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    /// Input/prompt tokens
    pub input: usize,
    /// Output tokens, reasoning included
    pub output: usize,
}

impl TokenUsage {
    pub fn new(input: usize, output: usize) -> Self {
        Self { input, output }
    }

    pub fn total(&self) -> usize {
        self.input + self.output
    }
}

/// Errors that can occur while talking to the reasoning backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    /// Request timed out at the transport level
    #[error("Request timed out")]
    Timeout,
    /// Network connectivity issue
    #[error("Network error: {0}")]
    NetworkError(String),
    /// API returned a non-2xx response
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
    /// Model declined to answer
    #[error("Model refused: {0}")]
    Refusal(String),
    /// Backend stopped before producing a complete answer
    #[error("Incomplete response: {reason}")]
    Incomplete { reason: String },
    /// Response envelope could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Authentication failures (bad or revoked credential)
    pub fn is_auth_error(&self) -> bool {
        matches!(self, LlmError::ApiError { status: 401 | 403, .. })
    }
}

/// Unified trait for schema-constrained reasoning backends
///
/// The trait is object-safe through explicit boxing of the async return type,
/// so servers can hold an `Arc<dyn StructuredLlmClient>`.
pub trait StructuredLlmClient: Send + Sync {
    /// Perform exactly one request constrained to `request.output_schema`
    fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + '_>>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_reasoning_effort_parse() {
        assert_eq!("high".parse::<ReasoningEffort>(), Ok(ReasoningEffort::High));
        assert_eq!(
            " Medium ".parse::<ReasoningEffort>(),
            Ok(ReasoningEffort::Medium)
        );
        assert!("extreme".parse::<ReasoningEffort>().is_err());
    }

    #[test]
    fn test_reasoning_effort_serializes_lowercase() {
        let json = serde_json::to_string(&ReasoningEffort::Low).unwrap();
        assert_eq!(json, "\"low\"");
        assert_eq!(ReasoningEffort::default(), ReasoningEffort::High);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(usage.total(), 150);
        assert_eq!(TokenUsage::default().total(), 0);
    }

    #[test]
    fn test_error_display() {
        let err = LlmError::ApiError {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("Incorrect API key"));
        assert_eq!(LlmError::Timeout.to_string(), "Request timed out");
        assert!(LlmError::Refusal("no".into()).to_string().contains("refused"));
    }

    #[test]
    fn test_is_auth_error() {
        let unauthorized = LlmError::ApiError {
            status: 401,
            message: String::new(),
        };
        let server = LlmError::ApiError {
            status: 500,
            message: String::new(),
        };
        assert!(unauthorized.is_auth_error());
        assert!(!server.is_auth_error());
        assert!(!LlmError::Timeout.is_auth_error());
    }

    struct RecordingClient {
        seen: Mutex<Vec<StructuredRequest>>,
    }

    impl StructuredLlmClient for RecordingClient {
        fn generate_structured(
            &self,
            request: &StructuredRequest,
        ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + '_>> {
            self.seen.lock().unwrap().push(request.clone());
            Box::pin(async move {
                Ok(LlmResponse {
                    content: "{}".to_string(),
                    tokens: TokenUsage::new(1, 1),
                    latency: Duration::from_millis(1),
                })
            })
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let client = RecordingClient {
            seen: Mutex::new(Vec::new()),
        };
        let dyn_client: &dyn StructuredLlmClient = &client;
        let request = StructuredRequest {
            system_prompt: "sys".into(),
            user_prompt: "user".into(),
            reasoning_effort: ReasoningEffort::Low,
            output_schema: OutputSchema {
                name: "Empty".into(),
                schema: serde_json::json!({"type": "object"}),
            },
        };

        let response = dyn_client.generate_structured(&request).await.unwrap();
        assert_eq!(response.content, "{}");
        assert_eq!(dyn_client.model_name(), "recording");
        assert_eq!(client.seen.lock().unwrap().len(), 1);
    }
}
