//! Plain-text rendering of decomposition results

use crate::decompose::model::{DecompositionResult, NestedDecomposition, RankedDecomposition};
use std::borrow::Cow;

const INDENT: &str = "   ";

/// Render a result as an indented, numbered text block
pub fn format_result(result: &DecompositionResult) -> String {
    match result {
        DecompositionResult::Nested(tree) => format_nested(tree),
        DecompositionResult::Ranked(flat) => format_ranked(flat),
    }
}

/// Fold a multi-line model string onto one line so it cannot forge list items
fn single_line(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

pub fn format_nested(tree: &NestedDecomposition) -> String {
    let mut lines = Vec::new();
    for (i, sq) in tree.subquestions.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, single_line(&sq.question)));
        for (j, leaf) in sq.subquestions.iter().enumerate() {
            lines.push(format!("{INDENT}{}. {}", j + 1, single_line(&leaf.question)));
        }
    }
    lines.join("\n")
}

pub fn format_ranked(flat: &RankedDecomposition) -> String {
    let mut lines = Vec::new();
    for (i, sq) in flat.subquestions.iter().enumerate() {
        lines.push(format!(
            "{}. [{}] {}",
            i + 1,
            sq.importance,
            single_line(&sq.question)
        ));
        lines.push(format!("{INDENT}Rationale: {}", single_line(&sq.rationale)));
    }

    if let Some(summary) = flat
        .reasoning_summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Reasoning summary:".to_string());
        lines.push(summary.to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::model::{
        Importance, LeafSubquestion, NestedSubquestion, RankedSubquestion,
    };

    fn nested(items: Vec<(&str, Vec<&str>)>) -> NestedDecomposition {
        NestedDecomposition {
            original_question: "Q".to_string(),
            subquestions: items
                .into_iter()
                .map(|(q, leaves)| NestedSubquestion {
                    question: q.to_string(),
                    subquestions: leaves
                        .into_iter()
                        .map(|l| LeafSubquestion {
                            question: l.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_format_nested() {
        let tree = nested(vec![
            (
                "Will there be a recession?",
                vec!["Will oil supply fall?", "Will rates rise?"],
            ),
            ("Will AI replace entry-level workers?", vec![]),
        ]);

        assert_eq!(
            format_nested(&tree),
            "1. Will there be a recession?\n   1. Will oil supply fall?\n   2. Will rates rise?\n2. Will AI replace entry-level workers?"
        );
    }

    #[test]
    fn test_format_nested_folds_embedded_newlines() {
        let tree = nested(vec![
            ("A?\n2. B?", vec!["C?\r\n   1. D?"]),
            ("E?", vec![]),
        ]);
        assert_eq!(format_nested(&tree), "1. A? 2. B?\n   1. C? 1. D?\n2. E?");
    }

    #[test]
    fn test_format_ranked_folds_embedded_newlines() {
        let flat = RankedDecomposition {
            original_question: "Q".to_string(),
            subquestions: vec![RankedSubquestion {
                question: "A?\n\nB?".to_string(),
                rationale: "first\nsecond".to_string(),
                importance: Importance::Medium,
            }],
            reasoning_summary: None,
        };
        assert_eq!(
            format_ranked(&flat),
            "1. [medium] A? B?\n   Rationale: first second"
        );
    }

    #[test]
    fn test_format_nested_empty() {
        assert_eq!(format_nested(&nested(vec![])), "");
    }

    #[test]
    fn test_format_ranked_with_summary() {
        let flat = RankedDecomposition {
            original_question: "Q".to_string(),
            subquestions: vec![
                RankedSubquestion {
                    question: "Will the ballot shift?".to_string(),
                    rationale: "Strongest predictor.".to_string(),
                    importance: Importance::High,
                },
                RankedSubquestion {
                    question: "Will storms interfere?".to_string(),
                    rationale: "Rare.".to_string(),
                    importance: Importance::Low,
                },
            ],
            reasoning_summary: Some("Ballot dominates.".to_string()),
        };

        assert_eq!(
            format_ranked(&flat),
            "1. [high] Will the ballot shift?\n   Rationale: Strongest predictor.\n\
             2. [low] Will storms interfere?\n   Rationale: Rare.\n\
             \n\
             Reasoning summary:\n\
             Ballot dominates."
        );
    }

    #[test]
    fn test_format_ranked_blank_summary_omitted() {
        let flat = RankedDecomposition {
            original_question: "Q".to_string(),
            subquestions: vec![RankedSubquestion {
                question: "S".to_string(),
                rationale: "R".to_string(),
                importance: Importance::Medium,
            }],
            reasoning_summary: Some("   ".to_string()),
        };

        let text = format_ranked(&flat);
        assert_eq!(text, "1. [medium] S\n   Rationale: R");
    }

    #[test]
    fn test_format_ranked_summary_only() {
        let flat = RankedDecomposition {
            original_question: "Q".to_string(),
            subquestions: vec![],
            reasoning_summary: Some("Nothing to split.".to_string()),
        };

        assert_eq!(format_ranked(&flat), "Reasoning summary:\nNothing to split.");
    }

    #[test]
    fn test_format_result_dispatches() {
        let result = DecompositionResult::Nested(nested(vec![("A", vec![])]));
        assert_eq!(format_result(&result), "1. A");
    }
}
