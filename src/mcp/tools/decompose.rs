//! decompose_question Tool Implementation
//!
//! Agent-facing request shape and execution for both decomposition tools.
//! The request deliberately has no `cutoff_date`: the server supplies it when
//! converting to the full [`DecomposeInvocation`].

use crate::config::ServerConfig;
use crate::decompose::{
    decompose, format_result, DecomposeError, DecomposeInvocation, DecompositionVariant,
};
use crate::llm::StructuredLlmClient;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// Tool name of the nested-tree variant
pub const DECOMPOSE_QUESTION: &str = "decompose_question";

/// Tool name of the ranked-list variant
pub const DECOMPOSE_QUESTION_RANKED: &str = "decompose_question_ranked";

/// Request for the decomposition tools, as advertised to agents
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DecomposeRequest {
    /// The forecasting question to decompose
    pub question: String,
    /// Optional additional context about the question
    #[serde(default)]
    pub context: String,
    /// Maximum number of top-level subquestions (optional, default 5)
    #[serde(default)]
    pub max_subquestions: Option<usize>,
}

impl DecomposeRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: String::new(),
            max_subquestions: None,
        }
    }

    /// Complete the request into the full invocation contract
    pub fn into_invocation(self, config: &ServerConfig) -> DecomposeInvocation {
        DecomposeInvocation {
            question: self.question,
            context: self.context,
            cutoff_date: config.effective_cutoff_date(),
            max_subquestions: self.max_subquestions.unwrap_or(config.max_subquestions),
        }
    }
}

/// Tool name for a variant
pub fn tool_name(variant: DecompositionVariant) -> &'static str {
    match variant {
        DecompositionVariant::Nested => DECOMPOSE_QUESTION,
        DecompositionVariant::Ranked => DECOMPOSE_QUESTION_RANKED,
    }
}

/// Execute a decomposition tool call and render the result as text
pub async fn execute_decompose(
    client: &dyn StructuredLlmClient,
    config: &ServerConfig,
    variant: DecompositionVariant,
    request: DecomposeRequest,
) -> Result<String, DecomposeError> {
    let invocation = request.into_invocation(config);
    let result = decompose(client, variant, &invocation, config.reasoning_effort).await?;
    Ok(format_result(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::InvalidInput;
    use crate::llm::scripted::ScriptedLlmClient;

    const RANKED_ANSWER: &str = r#"{
        "original_question": "Will X happen by 2030?",
        "subquestions": [
            {"question": "Will funding arrive?", "rationale": "X needs money.", "importance": "high"},
            {"question": "Will rivals ship first?", "rationale": "Could pre-empt X.", "importance": "low"}
        ],
        "reasoning_summary": "Funding dominates."
    }"#;

    fn replay_config() -> ServerConfig {
        ServerConfig {
            cutoff_date: Some("2024-01-01".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_deny_unknown_fields() {
        let json = r#"{"question": "Q", "cutoff_date": "2020-01-01"}"#;
        let result: Result<DecomposeRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn test_request_minimal() {
        let request: DecomposeRequest = serde_json::from_str(r#"{"question": "Q"}"#).unwrap();
        assert_eq!(request.context, "");
        assert!(request.max_subquestions.is_none());
    }

    #[test]
    fn test_request_schema_hides_cutoff_date() {
        let schema = serde_json::to_value(schemars::schema_for!(DecomposeRequest)).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("question"));
        assert!(properties.contains_key("context"));
        assert!(properties.contains_key("max_subquestions"));
        assert!(!properties.contains_key("cutoff_date"));
    }

    #[test]
    fn test_into_invocation_fills_server_side_fields() {
        let invocation = DecomposeRequest::new("Q").into_invocation(&replay_config());
        assert_eq!(invocation.cutoff_date, "2024-01-01");
        assert_eq!(invocation.max_subquestions, 5);

        let mut request = DecomposeRequest::new("Q");
        request.max_subquestions = Some(3);
        let invocation = request.into_invocation(&ServerConfig::default());
        assert_eq!(invocation.max_subquestions, 3);
        assert_eq!(invocation.cutoff_date, crate::decompose::today());
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(tool_name(DecompositionVariant::Nested), "decompose_question");
        assert_eq!(
            tool_name(DecompositionVariant::Ranked),
            "decompose_question_ranked"
        );
    }

    #[tokio::test]
    async fn test_execute_ranked() {
        let client = ScriptedLlmClient::replying(RANKED_ANSWER);
        let text = execute_decompose(
            &client,
            &replay_config(),
            DecompositionVariant::Ranked,
            DecomposeRequest::new("Will X happen by 2030?"),
        )
        .await
        .unwrap();

        assert!(text.starts_with("1. [high] Will funding arrive?"));
        assert!(text.contains("2. [low] Will rivals ship first?"));
        assert!(text.ends_with("Reasoning summary:\nFunding dominates."));
        assert!(client.requests()[0].system_prompt.contains("2024-01-01"));
    }

    #[tokio::test]
    async fn test_execute_empty_question() {
        let client = ScriptedLlmClient::replying(RANKED_ANSWER);
        let err = execute_decompose(
            &client,
            &ServerConfig::default(),
            DecompositionVariant::Nested,
            DecomposeRequest::new(""),
        )
        .await
        .unwrap_err();

        assert_eq!(err, DecomposeError::InvalidInput(InvalidInput::EmptyQuestion));
        assert_eq!(client.call_count(), 0);
    }
}
