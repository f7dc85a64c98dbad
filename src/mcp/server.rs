//! Decomposition MCP Server Implementation
//!
//! Provides the core server handler for rmcp, holding the backend client and
//! configuration, and routing tool calls to their handlers.

use crate::config::ServerConfig;
use crate::decompose::DecompositionVariant;
use crate::llm::StructuredLlmClient;
use crate::mcp::backtest::{self, BacktestContractError};
use crate::mcp::tools::decompose::{execute_decompose, DecomposeRequest};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo, Tool},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Decomposition MCP Server
///
/// Implements the rmcp ServerHandler trait to expose the decomposition tools
/// via the Model Context Protocol. The backend client is built once at start-up
/// and shared by every call.
#[derive(Clone)]
pub struct DecompositionServer {
    client: Arc<dyn StructuredLlmClient>,
    config: Arc<ServerConfig>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl DecompositionServer {
    /// Create a server around an already-built backend client
    pub fn new(client: Arc<dyn StructuredLlmClient>, config: ServerConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Tools as advertised to agents
    pub fn tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    /// Check every tagged tool keeps `cutoff_date` out of its advertised schema
    pub fn verify_backtest_contracts(&self) -> Result<(), BacktestContractError> {
        self.tools().iter().try_for_each(backtest::check_tool)
    }

    /// Run one decomposition tool call and wrap the outcome for MCP
    pub async fn call_decompose(
        &self,
        variant: DecompositionVariant,
        request: DecomposeRequest,
    ) -> Result<CallToolResult, McpError> {
        match execute_decompose(self.client.as_ref(), &self.config, variant, request).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => {
                warn!(variant = %variant, error = %e, "Decomposition tool call failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }

    /// Decomposes a complex forecasting question into a two-level tree of
    /// simpler subquestions.
    #[tool(
        name = "decompose_question",
        title = "Decompose Forecasting Question",
        description = "Decomposes a complex forecasting question into simpler subquestions that can be forecasted independently. Returns a numbered list with nested second-level subquestions."
    )]
    async fn decompose_question(
        &self,
        Parameters(request): Parameters<DecomposeRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "decompose_question", "Tool called");
        self.call_decompose(DecompositionVariant::Nested, request)
            .await
    }

    /// Decomposes a forecasting question into a flat list annotated with
    /// rationale and importance.
    #[tool(
        name = "decompose_question_ranked",
        title = "Decompose Forecasting Question (Ranked)",
        description = "Decomposes a complex forecasting question into a flat list of independently forecastable subquestions, each with a rationale and an importance label (high, medium, low)."
    )]
    async fn decompose_question_ranked(
        &self,
        Parameters(request): Parameters<DecomposeRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "decompose_question_ranked", "Tool called");
        self.call_decompose(DecompositionVariant::Ranked, request)
            .await
    }
}

#[tool_handler]
impl ServerHandler for DecompositionServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "decomposition".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Question decomposition service that breaks down complex forecasting questions \
                 into simpler, more tractable subquestions. Uses a reasoning model to identify \
                 the key components and dependencies needed to answer the main question. \
                 Available tools: decompose_question, decompose_question_ranked."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::scripted::ScriptedLlmClient;
    use crate::llm::LlmError;

    const NESTED_ANSWER: &str = r#"{
        "original_question": "Will X happen by 2030?",
        "subquestions": [
            {"question": "Will funding arrive by 2026?", "subquestions": [{"question": "Will the bill pass?"}]},
            {"question": "Will regulators approve X?", "subquestions": []}
        ]
    }"#;

    fn server_with(client: ScriptedLlmClient) -> (DecompositionServer, Arc<ScriptedLlmClient>) {
        let client = Arc::new(client);
        let config = ServerConfig {
            cutoff_date: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        let server = DecompositionServer::new(client.clone(), config);
        (server, client)
    }

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_server_info() {
        let (server, _) = server_with(ScriptedLlmClient::new(vec![]));
        let info = server.get_info();
        assert_eq!(info.server_info.name, "decomposition");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.capabilities.tools.is_some());
        assert!(info
            .instructions
            .unwrap()
            .contains("forecasting questions"));
    }

    #[test]
    fn test_tools_listed() {
        let (server, _) = server_with(ScriptedLlmClient::new(vec![]));
        let mut names: Vec<String> = server.tools().iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["decompose_question", "decompose_question_ranked"]);
    }

    #[test]
    fn test_tools_have_titles() {
        let (server, _) = server_with(ScriptedLlmClient::new(vec![]));
        let tools = server.tools();
        let title = |name: &str| {
            tools
                .iter()
                .find(|t| t.name == name)
                .and_then(|t| t.title.as_deref().map(str::to_string))
        };
        assert_eq!(
            title("decompose_question").as_deref(),
            Some("Decompose Forecasting Question")
        );
        assert_eq!(
            title("decompose_question_ranked").as_deref(),
            Some("Decompose Forecasting Question (Ranked)")
        );
    }

    #[test]
    fn test_backtest_contracts_hold() {
        let (server, _) = server_with(ScriptedLlmClient::new(vec![]));
        assert_eq!(server.verify_backtest_contracts(), Ok(()));
    }

    #[tokio::test]
    async fn test_decompose_question_handler() {
        let (server, client) = server_with(ScriptedLlmClient::replying(NESTED_ANSWER));

        let result = server
            .decompose_question(Parameters(DecomposeRequest::new("Will X happen by 2030?")))
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        assert_eq!(
            text_of(&result),
            "1. Will funding arrive by 2026?\n   1. Will the bill pass?\n2. Will regulators approve X?"
        );
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_as_tool_error() {
        let (server, _) = server_with(ScriptedLlmClient::failing(LlmError::ApiError {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        }));

        let result = server
            .decompose_question_ranked(Parameters(DecomposeRequest::new("Q")))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("401"));
    }

    #[tokio::test]
    async fn test_schema_violation_surfaces_as_tool_error() {
        let (server, _) = server_with(ScriptedLlmClient::replying(NESTED_ANSWER));

        let result = server
            .decompose_question_ranked(Parameters(DecomposeRequest::new("Q")))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("RankedDecomposition"));
    }
}
