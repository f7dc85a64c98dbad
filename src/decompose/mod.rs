//! Forecasting question decomposition
//!
//! One operation offered under two output shapes:
//!
//! - [`DecompositionVariant::Nested`]: two-level tree of subquestions
//! - [`DecompositionVariant::Ranked`]: flat list with rationale and importance
//!
//! # Flow
//!
//! ```text
//! DecomposeInvocation ─validate→ DecompositionPrompt ─→ StructuredLlmClient (one call)
//!                                                       │
//!                             format_result ←─ parse ←──┘
//! ```

pub mod format;
pub mod model;
pub mod prompt;

pub use format::format_result;
pub use model::{
    DecompositionResult, Importance, LeafSubquestion, NestedDecomposition, NestedSubquestion,
    RankedDecomposition, RankedSubquestion,
};
pub use prompt::DecompositionPrompt;

use crate::llm::{LlmError, ReasoningEffort, StructuredLlmClient};
use chrono::NaiveDate;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Date format of the cutoff parameter
pub const CUTOFF_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default cap on top-level subquestions
pub const DEFAULT_MAX_SUBQUESTIONS: usize = 5;

/// Upper bound accepted for `max_subquestions`
pub const MAX_SUBQUESTIONS_LIMIT: usize = 20;

/// Maximum combined length of question and context (characters)
pub const MAX_INPUT_LENGTH: usize = 20_000;

/// Which output shape the backend is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionVariant {
    #[default]
    Nested,
    Ranked,
}

impl DecompositionVariant {
    pub const ALL: [DecompositionVariant; 2] =
        [DecompositionVariant::Nested, DecompositionVariant::Ranked];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecompositionVariant::Nested => "nested",
            DecompositionVariant::Ranked => "ranked",
        }
    }
}

impl std::fmt::Display for DecompositionVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecompositionVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nested" => Ok(DecompositionVariant::Nested),
            "ranked" => Ok(DecompositionVariant::Ranked),
            other => Err(format!(
                "unknown variant '{}', expected one of: nested, ranked",
                other
            )),
        }
    }
}

/// Today's date in the local timezone, formatted as a cutoff date
pub fn today() -> String {
    chrono::Local::now()
        .date_naive()
        .format(CUTOFF_DATE_FORMAT)
        .to_string()
}

fn default_max_subquestions() -> usize {
    DEFAULT_MAX_SUBQUESTIONS
}

/// Full invocation contract of a decomposition, including the cutoff date
///
/// Agents never see this type: the MCP tools advertise
/// [`DecomposeRequest`](crate::mcp::tools::decompose::DecomposeRequest) and
/// the server fills in `cutoff_date`. Replay harnesses and the CLI build it
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DecomposeInvocation {
    /// The forecasting question to decompose
    pub question: String,
    /// Optional additional context about the question
    #[serde(default)]
    pub context: String,
    /// As-of date for the model, in the format YYYY-MM-DD (default: today)
    #[serde(default = "today")]
    pub cutoff_date: String,
    /// Maximum number of top-level subquestions (default: 5)
    #[serde(default = "default_max_subquestions")]
    pub max_subquestions: usize,
}

impl DecomposeInvocation {
    /// Invocation with default context, cap, and today's cutoff
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: String::new(),
            cutoff_date: today(),
            max_subquestions: DEFAULT_MAX_SUBQUESTIONS,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_cutoff_date(mut self, cutoff_date: impl Into<String>) -> Self {
        self.cutoff_date = cutoff_date.into();
        self
    }

    pub fn with_max_subquestions(mut self, max: usize) -> Self {
        self.max_subquestions = max;
        self
    }

    /// Validate the invocation parameters
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.question.trim().is_empty() {
            return Err(InvalidInput::EmptyQuestion);
        }
        let length = self.question.chars().count() + self.context.chars().count();
        if length > MAX_INPUT_LENGTH {
            return Err(InvalidInput::InputTooLong {
                length,
                max: MAX_INPUT_LENGTH,
            });
        }
        if self.max_subquestions == 0 || self.max_subquestions > MAX_SUBQUESTIONS_LIMIT {
            return Err(InvalidInput::InvalidMaxSubquestions {
                provided: self.max_subquestions,
                max: MAX_SUBQUESTIONS_LIMIT,
            });
        }
        parse_cutoff_date(&self.cutoff_date)?;
        Ok(())
    }
}

/// Parse a strict `YYYY-MM-DD` date
pub fn parse_cutoff_date(value: &str) -> Result<NaiveDate, InvalidInput> {
    let invalid = || InvalidInput::InvalidCutoffDate {
        provided: value.to_string(),
    };
    let date = NaiveDate::parse_from_str(value, CUTOFF_DATE_FORMAT).map_err(|_| invalid())?;
    // chrono tolerates signs, spaces and unpadded fields; only the canonical
    // spelling is accepted
    if date.format(CUTOFF_DATE_FORMAT).to_string() != value {
        return Err(invalid());
    }
    Ok(date)
}

/// Caller-side mistakes, rejected before any backend call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("question and context are too long: {length} characters (max {max})")]
    InputTooLong { length: usize, max: usize },
    #[error("max_subquestions must be between 1 and {max}, provided: {provided}")]
    InvalidMaxSubquestions { provided: usize, max: usize },
    #[error("cutoff_date must be a valid date in the format YYYY-MM-DD, provided: '{provided}'")]
    InvalidCutoffDate { provided: String },
}

/// Errors that can occur during a decomposition
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecomposeError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    /// Backend unreachable, rejected the request, or refused
    #[error("backend error: {0}")]
    Backend(#[from] LlmError),
    /// Backend answered, but not in the declared shape
    #[error("backend output does not match the {schema} schema: {message}")]
    SchemaViolation { schema: String, message: String },
}

/// Request one structured decomposition from the backend
///
/// Exactly one backend call is made; any failure fails the whole call.
pub async fn decompose(
    client: &dyn StructuredLlmClient,
    variant: DecompositionVariant,
    invocation: &DecomposeInvocation,
    reasoning_effort: ReasoningEffort,
) -> Result<DecompositionResult, DecomposeError> {
    invocation.validate()?;

    let request =
        DecompositionPrompt::build(variant, invocation).into_request(variant, reasoning_effort);

    info!(
        variant = %variant,
        model = client.model_name(),
        cutoff_date = %invocation.cutoff_date,
        max_subquestions = invocation.max_subquestions,
        "Requesting decomposition"
    );

    let response = client.generate_structured(&request).await.inspect_err(|e| {
        warn!(variant = %variant, error = %e, "Decomposition backend call failed");
    })?;

    debug!(
        input_tokens = response.tokens.input,
        output_tokens = response.tokens.output,
        latency_ms = response.latency.as_millis() as u64,
        "Backend responded"
    );

    let result = variant.parse(&response.content).map_err(|e| {
        warn!(variant = %variant, error = %e, "Backend output failed schema validation");
        DecomposeError::SchemaViolation {
            schema: request.output_schema.name.clone(),
            message: e.to_string(),
        }
    })?;

    info!(
        variant = %variant,
        subquestions = result.len(),
        "Decomposition complete"
    );

    Ok(result)
}
