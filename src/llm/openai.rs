//! OpenAI Responses API Client
//!
//! Client for OpenAI's `/responses` endpoint with strict JSON-schema
//! structured output and a reasoning-effort hint. One call, one attempt.
//!
//! # Example
//!
//! ```rust,ignore
//! let client = OpenAiClient::with_api_key("gpt-5.2", &api_key)?;
//! let response = client.generate_structured(&request).await?;
//! println!("{}", response.content);
//! ```

use crate::llm::{
    LlmError, LlmResponse, ReasoningEffort, StructuredLlmClient, StructuredRequest, TokenUsage,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::debug;

/// Default OpenAI API URL
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// OpenAI reasoning-model client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    /// Base URL for OpenAI API
    base_url: String,
    /// Model name (e.g., "gpt-5.2")
    model: String,
    /// HTTP client with auth headers
    client: Client,
}

impl OpenAiClient {
    /// Create a client with an explicit API key
    pub fn with_api_key(model: &str, api_key: &str) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| LlmError::InvalidResponse(format!("Invalid API key format: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::NetworkError(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            model: model.to_string(),
            client,
        })
    }

    /// Set custom base URL (for proxies or compatible APIs)
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Request body for the Responses API
#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    reasoning: ReasoningParam,
    input: Vec<InputMessage<'a>>,
    text: TextParam<'a>,
}

#[derive(Debug, Serialize)]
struct ReasoningParam {
    effort: ReasoningEffort,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct TextParam<'a> {
    format: FormatParam<'a>,
}

#[derive(Debug, Serialize)]
struct FormatParam<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    schema: &'a serde_json::Value,
    strict: bool,
}

impl<'a> ResponsesRequest<'a> {
    fn new(model: &'a str, request: &'a StructuredRequest) -> Self {
        Self {
            model,
            reasoning: ReasoningParam {
                effort: request.reasoning_effort,
            },
            input: vec![
                InputMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                InputMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            text: TextParam {
                format: FormatParam {
                    kind: "json_schema",
                    name: &request.output_schema.name,
                    schema: &request.output_schema.schema,
                    strict: true,
                },
            },
        }
    }
}

/// Response from the Responses API
#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    incomplete_details: Option<IncompleteDetails>,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<ResponsesUsage>,
}

#[derive(Debug, Deserialize)]
struct IncompleteDetails {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ResponsesUsage {
    input_tokens: usize,
    output_tokens: usize,
}

/// Error response from OpenAI
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ResponsesResponse {
    /// Concatenated `output_text` of every message item
    fn into_output_text(self) -> Result<(String, TokenUsage), LlmError> {
        if self.status.as_deref() == Some("incomplete") {
            let reason = self
                .incomplete_details
                .and_then(|d| d.reason)
                .unwrap_or_else(|| "unknown".to_string());
            return Err(LlmError::Incomplete { reason });
        }

        let mut text = String::new();
        for item in self.output {
            let OutputItem::Message { content } = item else {
                continue;
            };
            for part in content {
                match part {
                    ContentPart::OutputText { text: chunk } => text.push_str(&chunk),
                    ContentPart::Refusal { refusal } => return Err(LlmError::Refusal(refusal)),
                    ContentPart::Other => {}
                }
            }
        }

        if text.is_empty() {
            return Err(LlmError::InvalidResponse(
                "response contained no output text".to_string(),
            ));
        }

        let tokens = self
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        Ok((text, tokens))
    }
}

impl StructuredLlmClient for OpenAiClient {
    fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + '_>> {
        let request = request.clone();

        Box::pin(async move {
            let start = Instant::now();
            let body = ResponsesRequest::new(&self.model, &request);
            let url = format!("{}/responses", self.base_url);

            debug!(model = %self.model, effort = %request.reasoning_effort, schema = %request.output_schema.name, "Sending structured request");

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        LlmError::Timeout
                    } else if e.is_connect() {
                        LlmError::NetworkError(format!("Connection failed: {}", e))
                    } else {
                        LlmError::NetworkError(e.to_string())
                    }
                })?;

            let status = response.status();

            if !status.is_success() {
                let error_body: Result<ErrorResponse, _> = response.json().await;
                let message = error_body
                    .map(|e| e.error.message)
                    .unwrap_or_else(|_| "Unknown error".to_string());

                return Err(LlmError::ApiError {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: ResponsesResponse = response.json().await.map_err(|e| {
                LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
            })?;

            let (content, tokens) = parsed.into_output_text()?;

            Ok(LlmResponse {
                content,
                tokens,
                latency: start.elapsed(),
            })
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
