//! Decomposition result shapes and their strict output schemas
//!
//! Each variant has a Rust type (what callers consume) and a hand-written
//! strict JSON schema (what the backend is constrained to). Backend text
//! enters the crate only through [`DecompositionVariant::parse`], which is the
//! single validation point between the two.

use crate::decompose::DecompositionVariant;
use crate::llm::OutputSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Second-level subquestion of the nested variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeafSubquestion {
    pub question: String,
}

/// Top-level subquestion of the nested variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NestedSubquestion {
    pub question: String,
    pub subquestions: Vec<LeafSubquestion>,
}

/// Two-level decomposition tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NestedDecomposition {
    pub original_question: String,
    pub subquestions: Vec<NestedSubquestion>,
}

/// How much a subquestion bears on the original question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub const ALL: [Importance; 3] = [Importance::High, Importance::Medium, Importance::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat subquestion with rationale and importance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankedSubquestion {
    pub question: String,
    pub rationale: String,
    pub importance: Importance,
}

/// Flat decomposition with an optional reasoning summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankedDecomposition {
    pub original_question: String,
    pub subquestions: Vec<RankedSubquestion>,
    pub reasoning_summary: Option<String>,
}

/// Validated structured answer, tagged by the schema it was produced under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum DecompositionResult {
    Nested(NestedDecomposition),
    Ranked(RankedDecomposition),
}

impl DecompositionResult {
    pub fn variant(&self) -> DecompositionVariant {
        match self {
            DecompositionResult::Nested(_) => DecompositionVariant::Nested,
            DecompositionResult::Ranked(_) => DecompositionVariant::Ranked,
        }
    }

    pub fn original_question(&self) -> &str {
        match self {
            DecompositionResult::Nested(r) => &r.original_question,
            DecompositionResult::Ranked(r) => &r.original_question,
        }
    }

    /// Number of top-level subquestions
    pub fn len(&self) -> usize {
        match self {
            DecompositionResult::Nested(r) => r.subquestions.len(),
            DecompositionResult::Ranked(r) => r.subquestions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DecompositionVariant {
    /// Strict JSON schema for this variant's backend output
    pub fn output_schema(&self) -> OutputSchema {
        match self {
            DecompositionVariant::Nested => OutputSchema {
                name: "NestedDecomposition".to_string(),
                schema: nested_schema(),
            },
            DecompositionVariant::Ranked => OutputSchema {
                name: "RankedDecomposition".to_string(),
                schema: ranked_schema(),
            },
        }
    }

    /// Validate backend text against this variant's shape
    pub fn parse(&self, content: &str) -> Result<DecompositionResult, serde_json::Error> {
        match self {
            DecompositionVariant::Nested => {
                serde_json::from_str(content).map(DecompositionResult::Nested)
            }
            DecompositionVariant::Ranked => {
                serde_json::from_str(content).map(DecompositionResult::Ranked)
            }
        }
    }
}

// Strict mode: every property required, no additional properties.
fn nested_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "original_question": {"type": "string"},
            "subquestions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": {"type": "string"},
                        "subquestions": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "question": {"type": "string"}
                                },
                                "required": ["question"],
                                "additionalProperties": false
                            }
                        }
                    },
                    "required": ["question", "subquestions"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["original_question", "subquestions"],
        "additionalProperties": false
    })
}

fn ranked_schema() -> serde_json::Value {
    let importance: Vec<&str> = Importance::ALL.iter().map(|i| i.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "original_question": {"type": "string"},
            "subquestions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": {"type": "string"},
                        "rationale": {"type": "string"},
                        "importance": {"type": "string", "enum": importance}
                    },
                    "required": ["question", "rationale", "importance"],
                    "additionalProperties": false
                }
            },
            "reasoning_summary": {"type": ["string", "null"]}
        },
        "required": ["original_question", "subquestions", "reasoning_summary"],
        "additionalProperties": false
    })
}
