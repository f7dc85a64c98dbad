//! Forecasting Question Decomposition
//!
//! Breaks a natural-language forecasting question into simpler subquestions
//! that downstream forecasters can answer independently. One call to a hosted
//! reasoning model, constrained to a strict output schema, rendered as text.
//!
//! - **Two shapes**: a nested two-level tree, or a flat list with rationale and
//!   importance
//! - **Backtesting**: every call carries a cutoff date the model must reason
//!   from; agents never see or set it
//! - **MCP**: served over stdio via rmcp
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use decomposition::decompose::{decompose, format_result, DecomposeInvocation, DecompositionVariant};
//! use decomposition::{ReasoningEffort, ServerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let client = config.build_client()?;
//!
//! let invocation = DecomposeInvocation::new("Will X happen by 2030?").with_cutoff_date("2024-01-01");
//! let result = decompose(&client, DecompositionVariant::Nested, &invocation, ReasoningEffort::High).await?;
//! println!("{}", format_result(&result));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decompose;
pub mod llm;
pub mod mcp;

// Re-export commonly used items at crate root
pub use config::{ConfigError, ServerConfig};
pub use decompose::{
    DecomposeError, DecomposeInvocation, DecompositionResult, DecompositionVariant,
};
pub use llm::{LlmError, ReasoningEffort, StructuredLlmClient};
pub use mcp::DecompositionServer;
