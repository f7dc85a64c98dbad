//! MCP Tool Definitions
//!
//! Each tool request is defined with serde/schemars for automatic JSON schema
//! generation.

pub mod decompose;

pub use decompose::{DecomposeRequest, DECOMPOSE_QUESTION, DECOMPOSE_QUESTION_RANKED};
