//! Output stages: run a prompt several times, then judge the result.
//!
//! The original prompt goes through `run_output`/`judge_output`; the
//! rewrite goes through `run_optimized`/`judge_optimized`.

use crate::config::GradingScale;
use crate::evaluator::criteria::fallback_output_dimensions;
use crate::evaluator::errors::EvaluatorError;
use crate::evaluator::schemas::OutputEvaluationReply;
use crate::evaluator::{Grade, OutputDimensionScore, OutputEvaluation, TaskType};
use crate::llms::{invoke_structured, ModelGateway};
use crate::pipeline::stage::Stage;
use crate::pipeline::state::{EvaluationState, StatePatch};
use crate::prompts::{judge_input, judge_instructions};
use crate::runner::{run_n_times, MultiRunOutput};
use crate::scoring::output_grade;

use super::{recover, RunContext};

pub const JUDGE_FAILED_RECOMMENDATION: &str = "Evaluation failed - retry to get actionable recommendations.";
pub const JUDGE_FAILED_FINDING: &str = "Evaluation failed - could not parse LLM judge response.";

/// Judgment built from a parsed reply. Scores are clamped to 0.0..=1.0.
pub fn map_judgment(
    reply: OutputEvaluationReply,
    prompt: &str,
    output: &str,
    gateway: &dyn ModelGateway,
    scale: &GradingScale,
) -> OutputEvaluation {
    let overall = reply.overall_score.clamp(0.0, 1.0);
    OutputEvaluation {
        prompt_used: prompt.to_string(),
        llm_output: output.to_string(),
        provider: gateway.provider().to_string(),
        model: gateway.model().to_string(),
        dimensions: reply
            .dimensions
            .into_iter()
            .map(|d| OutputDimensionScore {
                name: d.name,
                score: d.score.clamp(0.0, 1.0),
                comment: d.comment,
                recommendation: d.recommendation,
            })
            .collect(),
        overall_score: overall,
        grade: output_grade(scale, overall),
        findings: reply.findings,
    }
}

/// Zero-scored judgment over the task type's dimensions.
pub fn fallback_judgment(task_type: TaskType, prompt: &str, output: &str, provider: &str, model: &str) -> OutputEvaluation {
    OutputEvaluation {
        prompt_used: prompt.to_string(),
        llm_output: output.to_string(),
        provider: provider.to_string(),
        model: model.to_string(),
        dimensions: fallback_output_dimensions(task_type)
            .iter()
            .map(|(name, comment)| OutputDimensionScore {
                name: name.to_string(),
                score: 0.0,
                comment: comment.to_string(),
                recommendation: JUDGE_FAILED_RECOMMENDATION.to_string(),
            })
            .collect(),
        overall_score: 0.0,
        grade: Grade::Weak,
        findings: vec![JUDGE_FAILED_FINDING.to_string()],
    }
}

async fn judge(
    gateway: &dyn ModelGateway,
    task_type: TaskType,
    prompt: &str,
    output: &str,
    scale: &GradingScale,
) -> Result<OutputEvaluation, EvaluatorError> {
    let instructions = judge_instructions(task_type)?;
    let input = judge_input(prompt, output)?;
    let reply: Option<OutputEvaluationReply> = invoke_structured(gateway, &instructions, &input).await?;
    Ok(match reply {
        Some(reply) => map_judgment(reply, prompt, output, gateway, scale),
        None => {
            log::warn!("Judge reply could not be parsed, using fallback scores");
            fallback_judgment(task_type, prompt, output, gateway.provider(), gateway.model())
        }
    })
}

async fn run_prompt(prompt: &str, state: &EvaluationState, ctx: &RunContext<'_>) -> Result<MultiRunOutput, EvaluatorError> {
    let gateway = ctx.gateway()?;
    Ok(run_n_times(gateway.as_ref(), prompt, state.execution_count).await)
}

pub async fn run_output(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    log::info!("Stage {} starting ({} runs)", Stage::RunOutput, state.execution_count);
    match run_prompt(&state.input_text, state, ctx).await {
        Ok(run) => StatePatch {
            llm_outputs: Some(run.outputs),
            output_summary: Some(run.summary),
            ..StatePatch::message(format!(
                "Output generated ({} runs): now evaluating quality.",
                state.execution_count
            ))
        },
        Err(e) => {
            let placeholder = format!("[Error: LLM call failed: {}]", e);
            let fallback = StatePatch {
                llm_outputs: Some(vec![placeholder.clone()]),
                output_summary: Some(placeholder),
                ..StatePatch::message("Output generation failed.")
            };
            recover(Stage::RunOutput, e, fallback)
        }
    }
}

pub async fn run_optimized(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    let Some(rewrite) = state.rewritten_prompt.as_deref() else {
        return StatePatch::message("No optimized prompt to execute: skipping.");
    };
    log::info!("Stage {} starting ({} runs)", Stage::RunOptimized, state.execution_count);
    match run_prompt(rewrite, state, ctx).await {
        Ok(run) => StatePatch {
            optimized_outputs: Some(run.outputs),
            optimized_output_summary: Some(run.summary),
            ..StatePatch::message(format!(
                "Optimized prompt executed ({} runs): evaluating quality.",
                state.execution_count
            ))
        },
        Err(e) => recover(
            Stage::RunOptimized,
            e,
            StatePatch::message("Optimized prompt execution failed: skipping comparison."),
        ),
    }
}

async fn judge_stage(stage: Stage, prompt: &str, output: &str, state: &EvaluationState, ctx: &RunContext<'_>) -> Result<OutputEvaluation, EvaluatorError> {
    log::info!("Stage {} starting", stage);
    let gateway = ctx.gateway()?;
    let scale = ctx.eval_config(state.task_type).grading_scale;
    judge(gateway.as_ref(), state.task_type, prompt, output, &scale).await
}

pub async fn judge_output(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    let output = state.output_summary.as_deref().unwrap_or("");
    match judge_stage(Stage::JudgeOutput, &state.input_text, output, state, ctx).await {
        Ok(evaluation) => StatePatch {
            output_evaluation: Some(evaluation),
            ..StatePatch::message("Output evaluation complete.")
        },
        Err(e) => {
            let fallback = StatePatch {
                output_evaluation: Some(fallback_judgment(state.task_type, &state.input_text, output, "unknown", "unknown")),
                ..StatePatch::message(format!("Output evaluation failed: {}. Using fallback scores.", e))
            };
            recover(Stage::JudgeOutput, e, fallback)
        }
    }
}

pub async fn judge_optimized(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    let (Some(rewrite), Some(output)) = (
        state.rewritten_prompt.as_deref(),
        state.optimized_output_summary.as_deref(),
    ) else {
        return StatePatch::message("No optimized output to evaluate: skipping.");
    };
    match judge_stage(Stage::JudgeOptimized, rewrite, output, state, ctx).await {
        Ok(evaluation) => {
            let message = format!(
                "Optimized output evaluated: {}% ({}).",
                evaluation.overall_pct().trunc() as i64,
                evaluation.grade
            );
            StatePatch {
                optimized_output_evaluation: Some(evaluation),
                ..StatePatch::message(message)
            }
        }
        Err(e) => {
            let fallback = StatePatch {
                optimized_output_evaluation: Some(fallback_judgment(state.task_type, rewrite, output, "unknown", "unknown")),
                ..StatePatch::message(format!("Optimized output evaluation failed: {}. Using fallback scores.", e))
            };
            recover(Stage::JudgeOptimized, e, fallback)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
