//! Improvement stage.

use chrono::Utc;
use uuid::Uuid;

use crate::evaluator::EvaluationResult;
use crate::history::{format_historical_improvements, CONTEXT_LIMIT};
use crate::improver::{self, ImproveOutcome, ImproveRequest, ImproveStrategy};
use crate::pipeline::stage::Stage;
use crate::pipeline::state::{EvaluationState, StatePatch};
use crate::prompts::prompt_type_guidance;

use super::{recover, RunContext};

/// Structural snapshot of the state with the improvement outcome folded in.
pub fn evaluation_result(state: &EvaluationState, outcome: &ImproveOutcome) -> EvaluationResult {
    EvaluationResult {
        id: Uuid::new_v4(),
        mode: state.mode,
        input_text: state.input_text.clone(),
        expected_outcome: state.expected_outcome.clone(),
        overall_score: state.overall_score,
        grade: state.grade,
        dimensions: state.dimension_scores.clone(),
        tcrei_flags: state.tcrei_flags,
        improvements: outcome.improvements.clone(),
        rewritten_prompt: outcome.rewritten_prompt.clone(),
        created_at: Utc::now(),
    }
}

async fn historical_improvements(state: &EvaluationState, ctx: &RunContext<'_>) -> String {
    let Some(history) = ctx.history() else {
        return String::new();
    };
    match history.find_similar(&state.input_text, CONTEXT_LIMIT).await {
        Ok(similar) => format_historical_improvements(&similar),
        Err(e) => {
            log::warn!("History lookup failed, continuing without it: {}", e);
            String::new()
        }
    }
}

fn outcome_patch(state: &EvaluationState, outcome: ImproveOutcome, message: String) -> StatePatch {
    StatePatch {
        evaluation_result: Some(evaluation_result(state, &outcome)),
        improvements: Some(outcome.improvements),
        rewritten_prompt: outcome.rewritten_prompt,
        tot_audit: outcome.tot_audit,
        ..StatePatch::message(message)
    }
}

pub async fn improve(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    log::info!("Stage {} starting (tot={})", Stage::Improve, state.strategy.use_tot);

    let result = async {
        let gateway = ctx.gateway()?;
        let guidance = prompt_type_guidance(state.prompt_type, state.task_type);
        let history = historical_improvements(state, ctx).await;
        let request = ImproveRequest {
            input_text: &state.input_text,
            dimensions: &state.dimension_scores,
            overall_score: state.overall_score,
            grade: state.grade,
            output_evaluation: state.output_evaluation.as_ref(),
            guidance: &guidance,
            historical_context: &history,
            use_tot: state.strategy.use_tot,
            num_branches: state.strategy.tot_num_branches,
        };
        improver::generate(gateway.as_ref(), &request).await
    }
    .await;

    match result {
        Ok(outcome) => {
            let message = if outcome.improvements.is_empty() && outcome.rewritten_prompt.is_none() {
                "Improvement generation returned no suggestions.".to_string()
            } else {
                format!(
                    "Improvements generated ({}): {} suggestions{}.",
                    outcome.strategy.as_str(),
                    outcome.improvements.len(),
                    if outcome.rewritten_prompt.is_some() { " and a rewritten prompt" } else { "" }
                )
            };
            outcome_patch(state, outcome, message)
        }
        Err(e) => {
            let fallback = outcome_patch(
                state,
                ImproveOutcome {
                    improvements: Vec::new(),
                    rewritten_prompt: None,
                    tot_audit: None,
                    strategy: ImproveStrategy::SingleShot,
                },
                format!("Improvement generation failed: {}. No improvements available.", e),
            );
            recover(Stage::Improve, e, fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{EvaluationStrategy, StrategyConfig};
    use crate::llms::scripted::ScriptedGateway;
    use crate::llms::FixedGatewayFactory;

    #[tokio::test]
    async fn test_improve_builds_result() {
        let gateway = Arc::new(ScriptedGateway::new().on(
            "Generate improvements and a rewritten version",
            r#"{"improvements":[{"priority":"HIGH","title":"Audience","suggestion":"Name the reader"}],"rewritten_prompt":"Write a short story about dogs for kids."}"#,
        ));
        let factory = FixedGatewayFactory(gateway);
        let ctx = RunContext::new(&factory);
        let state = EvaluationState::new("Write me something about dogs")
            .with_strategy(StrategyConfig::preset(EvaluationStrategy::Standard));

        let patch = improve(&state, &ctx).await;
        assert_eq!(patch.improvements.as_ref().unwrap().len(), 1);
        assert!(patch.rewritten_prompt.is_some());
        let result = patch.evaluation_result.unwrap();
        assert_eq!(result.input_text, "Write me something about dogs");
        assert_eq!(result.improvements.len(), 1);
    }

    #[tokio::test]
    async fn test_recoverable_failure_still_patches() {
        let gateway = Arc::new(ScriptedGateway::new().fail_on("", "upstream returned malformed body"));
        let factory = FixedGatewayFactory(gateway);
        let ctx = RunContext::new(&factory);
        let patch = improve(&EvaluationState::new("Write me something about dogs"), &ctx).await;
        assert!(patch.fatal_error.is_none());
        assert_eq!(patch.improvements, Some(Vec::new()));
        assert!(patch.rewritten_prompt.is_none());
        assert!(patch.evaluation_result.is_some());
    }
}
