//! Backtesting support for tools
//!
//! A tool tagged [`BACKTESTING_SUPPORTED`] can be replayed as if run at a past
//! date. Its contract has two halves:
//!
//! - the advertised input schema, which must not contain [`CUTOFF_DATE_PARAM`]
//!   so an agent can never set or see it;
//! - the full invocation contract, which must contain it so replay harnesses
//!   can.

use crate::decompose::{DecomposeInvocation, DecompositionVariant};
use crate::mcp::tools::decompose::tool_name;
use rmcp::model::Tool;
use rmcp::schemars;
use thiserror::Error;

/// Tag marking tools that accept a hidden cutoff date
pub const BACKTESTING_SUPPORTED: &str = "backtesting_supported";

/// Name of the hidden parameter
pub const CUTOFF_DATE_PARAM: &str = "cutoff_date";

/// Tags attached to a tool by name
pub fn tool_tags(name: &str) -> &'static [&'static str] {
    let tagged = DecompositionVariant::ALL
        .iter()
        .any(|variant| tool_name(*variant) == name);
    if tagged {
        &[BACKTESTING_SUPPORTED]
    } else {
        &[]
    }
}

pub fn is_backtesting_supported(name: &str) -> bool {
    tool_tags(name).contains(&BACKTESTING_SUPPORTED)
}

/// JSON schema of the full invocation contract behind a tool
pub fn invocation_schema(name: &str) -> Option<serde_json::Value> {
    if !is_backtesting_supported(name) {
        return None;
    }
    serde_json::to_value(schemars::schema_for!(DecomposeInvocation)).ok()
}

/// Property names of a schema object
pub fn schema_properties(schema: &serde_json::Map<String, serde_json::Value>) -> Vec<String> {
    schema
        .get("properties")
        .and_then(|p| p.as_object())
        .map(|p| p.keys().cloned().collect())
        .unwrap_or_default()
}

/// Ways a tagged tool can break its backtesting contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BacktestContractError {
    #[error("tool '{tool}' advertises 'cutoff_date' in its input schema")]
    CutoffAdvertised { tool: String },
}

/// Check one advertised tool against its backtesting contract
///
/// Untagged tools always pass.
pub fn check_tool(tool: &Tool) -> Result<(), BacktestContractError> {
    let name = tool.name.to_string();
    if !is_backtesting_supported(&name) {
        return Ok(());
    }

    let advertised = schema_properties(&tool.input_schema);
    if advertised.iter().any(|p| p == CUTOFF_DATE_PARAM) {
        return Err(BacktestContractError::CutoffAdvertised { tool: name });
    }

    Ok(())
}
