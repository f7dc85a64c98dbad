//! MCP Server Implementation for question decomposition
//!
//! Exposes the decomposition operation as MCP tools for AI assistants. Uses
//! the rmcp SDK with stdio transport.
//!
//! # Available Tools
//!
//! - `decompose_question` - nested two-level decomposition
//! - `decompose_question_ranked` - flat decomposition with rationale and importance
//!
//! Both tools are tagged `backtesting_supported`: the cutoff date is supplied
//! by the server and never advertised to the calling agent.

pub mod backtest;
pub mod server;
pub mod tools;

pub use server::DecompositionServer;
