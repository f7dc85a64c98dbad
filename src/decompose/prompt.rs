//! Decomposition prompt construction
//!
//! Builds the system and user instructions for one decomposition call. The
//! cutoff date is stated as the operative date in the system instruction; the
//! backend is only told not to look past it, nothing here can enforce that.

use crate::decompose::{DecomposeInvocation, DecompositionVariant};
use crate::llm::{ReasoningEffort, StructuredRequest};

const ROLE: &str = "Break down a forecasting question into subquestions for downstream forecasters. \
Formulate every subquestion as a forward-looking question about the future, never as a research \
question about historic facts. Subquestions on the same level should be as independent of each \
other as possible (avoid strongly correlated questions).";

const STRATEGIES: &str = r#"<decomposition_strategies>
Use these patterns to break complex questions into tractable subquestions. Strategies can be combined.

Temporal decomposition:
- Break by sequential phases or milestones
- Best for: staged processes with clear intermediate conditions

Conditional/prerequisite decomposition:
- Identify necessary gates and combine them via conditional structure
- Best for: mergers, approvals, multi-step completions

Stakeholder decomposition:
- Separate decisions by actors (boards, regulators, governments)
- Best for: politics, business, multi-party actions

Mechanism/pathway decomposition:
- Distinct causal routes, combined via OR logic with overlap handled explicitly
- Best for: outcomes reachable through several independent paths

Component decomposition:
- The outcome is an aggregate of measurable parts
- Best for: GDP, performance metrics, composite indices

Failure mode decomposition:
- Enumerate what must NOT happen
- Best for: projects, plans, risks with several points of failure

Reference class decomposition:
- Start from sector or process base rates, then adjust for specifics
- Best for: startups, treaties, adoption processes with analogues

Scenario decomposition:
- Define mutually exclusive world states and mix conditional forecasts
- Best for: outcomes that depend on macro regimes or external shocks
</decomposition_strategies>

<important_reminders>
- Do not include questions like "Will the resolution criteria be met...?"
- Every subquestion must be answerable on its own by a forecaster who has not seen the others.
</important_reminders>"#;

const NESTED_EXAMPLES: &str = r#"<example>
Question: "Will the unemployment rate for recent college graduates in the United States rise to 20% or more for three months before 2028?"
Subquestion decomposition:
1. Will there be an economic crisis or recession in the US before 2028?
   1. Will the stock market enter bear territory?
   2. Will there be a recession caused by trade conflicts?
   3. Will there be a recession caused by an oil supply shock?
   4. Will there be a recession caused by an asset bubble?
   5. Will the Fed raise interest rates significantly?
2. Will AI applications replace entry-level workers with college degrees?
</example>

<example>
Question: "Which party will hold a plurality in the US House of Representatives after the 2026 midterm elections?"
Subquestion decomposition:
1. Will the US economy improve or get worse?
2. Will the president's approval rating increase or decline?
3. Will the generic congressional ballot shift toward Republicans or Democrats?
4. Will there be new redistricting?
5. Will the elections be fair?
   1. Will governments engage in voter suppression or intimidation?
   2. Will protests or private militia interfere with voting?
   3. Will vote counts be fair?
</example>"#;

const NESTED_OUTPUT: &str = "Output the subquestions as a nested list: each top-level subquestion \
may carry its own second-level subquestions (use an empty list when it needs none). Do not go \
deeper than two levels.";

const RANKED_EXAMPLE: &str = r#"<example>
Question: "Which party will hold a plurality in the US House of Representatives after the 2026 midterm elections?"
Subquestion decomposition:
1. [high] Will the generic congressional ballot shift toward Republicans or Democrats?
   Rationale: National vote share is the strongest single predictor of seat share.
2. [medium] Will there be new redistricting before the election?
   Rationale: Redrawn maps can move a handful of seats independently of the national mood.
3. [low] Will weather or natural catastrophes interfere with voting?
   Rationale: Rare, but could depress turnout in specific districts.
</example>"#;

const RANKED_OUTPUT: &str = "Output the subquestions as a flat list. For each subquestion give a \
one-sentence rationale explaining how it bears on the original question, and an importance label \
(high, medium or low) for how much its answer would move the forecast. Optionally add a short \
reasoning summary of how the subquestions combine; use null when there is nothing to add.";

/// System and user instructions for one decomposition call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompositionPrompt {
    pub system: String,
    pub user: String,
}

impl DecompositionPrompt {
    pub fn build(variant: DecompositionVariant, invocation: &DecomposeInvocation) -> Self {
        Self {
            system: system_prompt(variant, &invocation.cutoff_date),
            user: user_prompt(invocation),
        }
    }

    /// Attach reasoning effort and the variant's output schema
    pub fn into_request(
        self,
        variant: DecompositionVariant,
        reasoning_effort: ReasoningEffort,
    ) -> StructuredRequest {
        StructuredRequest {
            system_prompt: self.system,
            user_prompt: self.user,
            reasoning_effort,
            output_schema: variant.output_schema(),
        }
    }
}

fn cutoff_section(cutoff_date: &str) -> String {
    format!(
        "<cutoff_date>\n\
         The current date is {cutoff_date}. Reason as of {cutoff_date}: do not use, assume or \
         reveal any information about events after {cutoff_date}, even if you know of them.\n\
         </cutoff_date>"
    )
}

fn system_prompt(variant: DecompositionVariant, cutoff_date: &str) -> String {
    let (examples, output) = match variant {
        DecompositionVariant::Nested => (NESTED_EXAMPLES, NESTED_OUTPUT),
        DecompositionVariant::Ranked => (RANKED_EXAMPLE, RANKED_OUTPUT),
    };

    let cutoff = cutoff_section(cutoff_date);
    [ROLE, cutoff.as_str(), STRATEGIES, examples, output].join("\n\n")
}

fn user_prompt(invocation: &DecomposeInvocation) -> String {
    let mut prompt = format!("Question: {}", invocation.question);

    let context = invocation.context.trim();
    if !context.is_empty() {
        prompt.push_str("\n\nContext:\n");
        prompt.push_str(context);
    }

    prompt.push_str(&format!(
        "\n\nProduce at most {} top-level subquestions.",
        invocation.max_subquestions
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(context: &str) -> DecomposeInvocation {
        DecomposeInvocation {
            question: "Will X happen by 2030?".to_string(),
            context: context.to_string(),
            cutoff_date: "2024-01-01".to_string(),
            max_subquestions: 5,
        }
    }

    #[test]
    fn test_system_prompt_states_cutoff() {
        let prompt = DecompositionPrompt::build(DecompositionVariant::Nested, &invocation(""));
        assert!(prompt.system.contains("The current date is 2024-01-01"));
        assert!(prompt.system.contains("after 2024-01-01"));
    }

    #[test]
    fn test_system_prompt_carries_strategies_and_reminders() {
        let prompt = DecompositionPrompt::build(DecompositionVariant::Nested, &invocation(""));
        assert!(prompt.system.contains("Temporal decomposition"));
        assert!(prompt.system.contains("Scenario decomposition"));
        assert!(prompt.system.contains("resolution criteria"));
        assert!(prompt.system.contains("nested list"));
    }

    #[test]
    fn test_ranked_prompt_asks_for_rationale_and_importance() {
        let prompt = DecompositionPrompt::build(DecompositionVariant::Ranked, &invocation(""));
        assert!(prompt.system.contains("rationale"));
        assert!(prompt.system.contains("importance label"));
        assert!(!prompt.system.contains("nested list"));
    }

    #[test]
    fn test_user_prompt_without_context() {
        let prompt = DecompositionPrompt::build(DecompositionVariant::Nested, &invocation("  "));
        assert!(prompt.user.starts_with("Question: Will X happen by 2030?"));
        assert!(!prompt.user.contains("Context:"));
        assert!(prompt.user.contains("at most 5 top-level subquestions"));
    }

    #[test]
    fn test_user_prompt_with_context() {
        let prompt = DecompositionPrompt::build(
            DecompositionVariant::Nested,
            &invocation("X was announced in 2023."),
        );
        assert!(prompt.user.contains("Context:\nX was announced in 2023."));
    }

    #[test]
    fn test_into_request_uses_variant_schema() {
        let request = DecompositionPrompt::build(DecompositionVariant::Ranked, &invocation(""))
            .into_request(DecompositionVariant::Ranked, ReasoningEffort::Medium);
        assert_eq!(request.output_schema.name, "RankedDecomposition");
        assert_eq!(request.reasoning_effort, ReasoningEffort::Medium);
        assert!(request.user_prompt.contains("Will X happen by 2030?"));
    }
}
