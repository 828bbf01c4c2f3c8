//! Structural analysis stages (`analyze`, `analyze_system`).

use std::sync::Arc;

use crate::chunking::{aggregate, chunk_prompt, run_bounded, should_chunk, CHUNK_CONCURRENCY};
use crate::evaluator::errors::EvaluatorError;
use crate::evaluator::schemas::AnalysisReply;
use crate::evaluator::{
    Analysis, DimensionScore, EvalMode, SubCriterionResult, TcreiFlags, DIMENSION_NAMES,
};
use crate::history::{format_historical_context, CONTEXT_LIMIT};
use crate::llms::{invoke_structured, ModelGateway};
use crate::pipeline::stage::Stage;
use crate::pipeline::state::{EvaluationState, StatePatch};
use crate::prompts::analysis_instructions;

use super::{recover, RunContext};

/// Map a reply onto the four fixed dimensions; anything missing scores zero.
pub fn map_analysis(reply: Option<AnalysisReply>) -> Analysis {
    let Some(reply) = reply else {
        return Analysis::empty();
    };
    let dimensions = DIMENSION_NAMES
        .iter()
        .map(|name| match reply.dimensions.get(*name) {
            Some(dim) => DimensionScore::new(
                *name,
                dim.score.clamp(0, 100) as u32,
                dim.sub_criteria
                    .iter()
                    .map(|s| SubCriterionResult {
                        name: s.name.clone(),
                        found: s.found,
                        detail: s.detail.clone(),
                    })
                    .collect(),
            ),
            None => DimensionScore::zero(*name),
        })
        .collect();
    let flags = reply.tcrei_flags;
    Analysis {
        dimensions,
        tcrei_flags: TcreiFlags {
            task: flags.task,
            context: flags.context,
            references: flags.references,
            evaluate: flags.evaluate,
            iterate: flags.iterate,
        },
    }
}

/// One `STEP - NAME (score/100):` block per dimension.
pub fn reasoning_trace(dimensions: &[DimensionScore]) -> String {
    dimensions
        .iter()
        .map(|dim| {
            let found: Vec<&str> = dim.sub_criteria.iter().filter(|s| s.found).map(|s| s.detail.as_str()).collect();
            let missing: Vec<&str> = dim.sub_criteria.iter().filter(|s| !s.found).map(|s| s.detail.as_str()).collect();
            format!(
                "STEP - {} ({}/100):\n  Found: {}\n  Missing: {}",
                dim.name.to_uppercase(),
                dim.score,
                if found.is_empty() { "None".to_string() } else { found.join(", ") },
                if missing.is_empty() { "None".to_string() } else { missing.join(", ") },
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn prompt_input(text: &str) -> String {
    format!("Evaluate this prompt:\n\n```\n{}\n```", text)
}

fn system_prompt_input(text: &str, expected: Option<&str>) -> String {
    format!(
        "Evaluate this system prompt:\n\n```\n{}\n```\n\nExpected outcome:\n{}",
        text,
        expected.unwrap_or("Not specified")
    )
}

async fn historical_context(state: &EvaluationState, ctx: &RunContext<'_>) -> String {
    let Some(history) = ctx.history() else {
        return String::new();
    };
    match history.find_similar(&state.input_text, CONTEXT_LIMIT).await {
        Ok(similar) => format_historical_context(&similar),
        Err(e) => {
            log::warn!("History lookup failed, continuing without it: {}", e);
            String::new()
        }
    }
}

async fn analyze_chunked(
    gateway: Arc<dyn ModelGateway>,
    instructions: String,
    text: &str,
) -> Result<(Analysis, usize), EvaluatorError> {
    let chunks = chunk_prompt(text);
    let count = chunks.len();
    let token_counts: Vec<usize> = chunks.iter().map(|c| c.token_estimate).collect();
    log::info!("Chunking prompt into {} chunks for analysis", count);

    let instructions = Arc::new(instructions);
    let replies = run_bounded(chunks, CHUNK_CONCURRENCY, |index, chunk| {
        let gateway = Arc::clone(&gateway);
        let instructions = Arc::clone(&instructions);
        async move {
            log::debug!("Analyzing chunk {}/{} ({:?})", index + 1, count, chunk.chunk_type);
            invoke_structured::<AnalysisReply>(gateway.as_ref(), &instructions, &prompt_input(&chunk.content)).await
        }
    })
    .await;

    let mut analyses = Vec::with_capacity(count);
    for reply in replies {
        let analysis = match reply {
            Some(Ok(parsed)) => map_analysis(parsed),
            Some(Err(e)) if e.is_fatal() => return Err(e.into()),
            Some(Err(e)) => {
                log::warn!("Chunk analysis failed: {}", e);
                Analysis::empty()
            }
            None => Analysis::empty(),
        };
        analyses.push(analysis);
    }
    Ok((aggregate(analyses, &token_counts), count))
}

async fn run_analysis(
    state: &EvaluationState,
    ctx: &RunContext<'_>,
    mode: EvalMode,
) -> Result<(Analysis, Option<usize>), EvaluatorError> {
    let gateway = ctx.gateway()?;
    let history = historical_context(state, ctx).await;
    let instructions = analysis_instructions(state.task_type, mode, state.strategy.use_cot, &history)?;

    if mode == EvalMode::Prompt && should_chunk(&state.input_text) {
        let (analysis, count) = analyze_chunked(gateway, instructions, &state.input_text).await?;
        return Ok((analysis, Some(count)));
    }

    let input = match mode {
        EvalMode::Prompt => prompt_input(&state.input_text),
        EvalMode::SystemPrompt => system_prompt_input(&state.input_text, state.expected_outcome.as_deref()),
    };
    let reply: Option<AnalysisReply> = invoke_structured(gateway.as_ref(), &instructions, &input).await?;
    if reply.is_none() {
        log::warn!("Analysis reply could not be parsed, using zero scores");
    }
    Ok((map_analysis(reply), None))
}

fn analysis_patch(state: &EvaluationState, analysis: Analysis, chunk_count: Option<usize>, message: String) -> StatePatch {
    let trace = state.strategy.use_cot.then(|| reasoning_trace(&analysis.dimensions));
    StatePatch {
        dimension_scores: Some(analysis.dimensions),
        tcrei_flags: Some(analysis.tcrei_flags),
        chunk_count,
        cot_reasoning_trace: trace,
        ..StatePatch::message(message)
    }
}

async fn run_stage(state: &EvaluationState, ctx: &RunContext<'_>, stage: Stage, mode: EvalMode) -> StatePatch {
    log::info!("Stage {} starting ({} chars)", stage, state.input_text.chars().count());
    let label = match mode {
        EvalMode::Prompt => "Analysis",
        EvalMode::SystemPrompt => "System prompt analysis",
    };
    match run_analysis(state, ctx, mode).await {
        Ok((analysis, chunk_count)) => {
            let message = match chunk_count {
                Some(n) => format!("{} complete ({} chunks): scoring each dimension.", label, n),
                None => format!("{} complete: scoring each dimension.", label),
            };
            analysis_patch(state, analysis, chunk_count, message)
        }
        Err(e) => {
            let fallback = analysis_patch(
                state,
                Analysis::empty(),
                None,
                format!("{} failed: {}. Using fallback zero scores.", label, e),
            );
            recover(stage, e, fallback)
        }
    }
}

pub async fn analyze(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    run_stage(state, ctx, Stage::Analyze, EvalMode::Prompt).await
}

/// System prompts are analysed in one pass, with the expected outcome.
pub async fn analyze_system(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    run_stage(state, ctx, Stage::AnalyzeSystem, EvalMode::SystemPrompt).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llms::scripted::ScriptedGateway;
    use crate::llms::FixedGatewayFactory;

    const TASK_ONLY: &str = r#"{"dimensions":{"task":{"score":70,"sub_criteria":[
        {"name":"verb","found":true,"detail":"clear action verb"},
        {"name":"format","found":false,"detail":"no output format"}]}},
        "tcrei_flags":{"task":true}}"#;

    #[test]
    fn test_map_analysis_fills_missing_dimensions() {
        let reply: AnalysisReply = serde_json::from_str(TASK_ONLY).unwrap();
        let analysis = map_analysis(Some(reply));
        assert_eq!(analysis.dimensions.len(), 4);
        assert_eq!(analysis.dimension("task").unwrap().score, 70);
        assert_eq!(analysis.dimension("constraints").unwrap().score, 0);
        assert!(analysis.tcrei_flags.task);
        assert!(!analysis.tcrei_flags.iterate);
    }

    #[test]
    fn test_map_analysis_clamps_scores() {
        let reply: AnalysisReply =
            serde_json::from_str(r#"{"dimensions":{"task":{"score":140},"context":{"score":-5}}}"#).unwrap();
        let analysis = map_analysis(Some(reply));
        assert_eq!(analysis.dimension("task").unwrap().score, 100);
        assert_eq!(analysis.dimension("context").unwrap().score, 0);
    }

    #[test]
    fn test_reasoning_trace() {
        let reply: AnalysisReply = serde_json::from_str(TASK_ONLY).unwrap();
        let trace = reasoning_trace(&map_analysis(Some(reply)).dimensions);
        assert!(trace.starts_with("STEP - TASK (70/100):\n  Found: clear action verb\n  Missing: no output format"));
        assert!(trace.contains("STEP - CONSTRAINTS (0/100)"));
    }

    #[tokio::test]
    async fn test_analyze_single_pass() {
        let gateway = Arc::new(ScriptedGateway::new().on("Evaluate this prompt", TASK_ONLY));
        let factory = FixedGatewayFactory(gateway.clone());
        let ctx = RunContext::new(&factory);
        let patch = analyze(&EvaluationState::new("Write me something about dogs"), &ctx).await;
        assert_eq!(patch.dimension_scores.unwrap()[0].score, 70);
        assert!(patch.chunk_count.is_none());
        assert!(patch.cot_reasoning_trace.is_some());
        assert!(patch.fatal_error.is_none());
    }

    #[tokio::test]
    async fn test_analyze_long_prompt_is_chunked() {
        let section = |name: &str| format!("## {}\n{}\n\n", name, "Detailed requirement sentence here. ".repeat(80));
        let text = format!("{}{}{}", section("Task"), section("Context"), section("Constraints"));
        assert!(should_chunk(&text));

        let gateway = Arc::new(ScriptedGateway::new().on("Evaluate this prompt", TASK_ONLY));
        let factory = FixedGatewayFactory(gateway.clone());
        let ctx = RunContext::new(&factory);
        let patch = analyze(&EvaluationState::new(text), &ctx).await;
        assert_eq!(patch.chunk_count, Some(3));
        assert_eq!(patch.dimension_scores.unwrap()[0].score, 70);
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_chunk_keeps_siblings() {
        let section = |name: &str, line: &str| format!("## {}\n{}\n\n", name, line.repeat(80));
        let text = format!(
            "{}{}{}",
            section("Task", "Detailed requirement sentence here. "),
            section("Context", "Background fact about the audience. "),
            section("Constraints", "Detailed requirement sentence here. "),
        );
        let tokens: Vec<usize> = chunk_prompt(&text).iter().map(|c| c.token_estimate).collect();
        assert_eq!(tokens.len(), 3);

        let gateway = Arc::new(
            ScriptedGateway::new()
                .fail_on("Background fact about the audience", "upstream read timed out")
                .on("Evaluate this prompt", TASK_ONLY),
        );
        let factory = FixedGatewayFactory(gateway.clone());
        let ctx = RunContext::new(&factory);
        let patch = analyze(&EvaluationState::new(text), &ctx).await;

        assert!(patch.fatal_error.is_none());
        assert_eq!(patch.chunk_count, Some(3));
        // The failed chunk counts as zero with its full token weight.
        let total: usize = tokens.iter().sum();
        let expected = (70.0 * (tokens[0] + tokens[2]) as f64 / total as f64).round_ties_even() as u32;
        let dims = patch.dimension_scores.unwrap();
        assert_eq!(dims[0].score, expected);
        assert!(expected > 0 && expected < 70);
        assert!(dims[1..].iter().all(|d| d.score == 0));
        assert!(patch.tcrei_flags.unwrap().task);
        assert!(gateway.calls_matching("Background fact about the audience") >= 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply_gives_zero_scores() {
        let gateway = Arc::new(ScriptedGateway::new().on("", "no json here"));
        let factory = FixedGatewayFactory(gateway);
        let ctx = RunContext::new(&factory);
        let patch = analyze(&EvaluationState::new("Write me something about dogs"), &ctx).await;
        assert!(patch.dimension_scores.unwrap().iter().all(|d| d.score == 0));
        assert!(patch.fatal_error.is_none());
    }

    #[tokio::test]
    async fn test_fatal_error_aborts() {
        let gateway = Arc::new(ScriptedGateway::new().fail_on("", "Anthropic API error (401): invalid api key"));
        let factory = FixedGatewayFactory(gateway);
        let ctx = RunContext::new(&factory);
        let patch = analyze(&EvaluationState::new("Write me something about dogs"), &ctx).await;
        assert!(patch.fatal_error.unwrap().contains("Invalid API Key"));
        assert!(patch.dimension_scores.is_none());
    }

    #[tokio::test]
    async fn test_system_prompt_input_carries_expected_outcome() {
        let gateway = Arc::new(ScriptedGateway::new().on("Evaluate this system prompt", TASK_ONLY));
        let factory = FixedGatewayFactory(gateway.clone());
        let ctx = RunContext::new(&factory);
        let state = EvaluationState::new("You are a support bot.").with_expected_outcome("Polite answers");
        let patch = analyze_system(&state, &ctx).await;
        assert!(patch.fatal_error.is_none());
        assert_eq!(gateway.calls_matching("Expected outcome:\nPolite answers"), 1);
    }
}
