//! Scripted backend for tests and offline runs
//!
//! Replays pre-recorded answers in order and records every request it sees,
//! so callers can assert on the exact prompts that would have gone out.

use crate::llm::{LlmError, LlmResponse, StructuredLlmClient, StructuredRequest, TokenUsage};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

/// Backend that answers from a fixed script
#[derive(Debug)]
pub struct ScriptedLlmClient {
    model: String,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<StructuredRequest>>,
}

impl ScriptedLlmClient {
    pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            model: "scripted".to_string(),
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client whose single answer is `content`
    pub fn replying(content: impl Into<String>) -> Self {
        Self::new(vec![Ok(content.into())])
    }

    /// Client whose single answer is `error`
    pub fn failing(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<StructuredRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl StructuredLlmClient for ScriptedLlmClient {
    fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + '_>> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| {
                Err(LlmError::InvalidResponse(
                    "no scripted response left".to_string(),
                ))
            });

        let result = next.map(|content| LlmResponse {
            tokens: TokenUsage::new(request.system_prompt.len() / 4, content.len() / 4),
            content,
            latency: Duration::ZERO,
        });

        Box::pin(async move { result })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
