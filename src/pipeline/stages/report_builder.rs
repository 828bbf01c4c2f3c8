//! Report assembly.

use chrono::Utc;

use crate::evaluator::{CompositeImprovement, FullEvaluationReport};
use crate::history::{summarize_improvements, HistoryRecord};
use crate::improver::title_case;
use crate::pipeline::stage::Stage;
use crate::pipeline::state::{EvaluationState, StatePatch};
use crate::scoring::{composite_improvement, output_pct, CompositeSignals};

use super::RunContext;

/// Structure, output and meta findings with their source prefix.
pub fn combined_findings(state: &EvaluationState) -> Vec<String> {
    let mut findings = Vec::new();
    if let Some(result) = &state.evaluation_result {
        for dim in &result.dimensions {
            for sub in &dim.sub_criteria {
                findings.push(format!(
                    "[Structure] {}: {}: {}",
                    title_case(&dim.name),
                    if sub.found { "Found" } else { "Missing" },
                    sub.detail
                ));
            }
        }
    }
    if let Some(output) = &state.output_evaluation {
        findings.extend(output.findings.iter().map(|f| format!("[Output] {}", f)));
    }
    findings.extend(state.meta_findings.iter().map(|f| format!("[Meta] {}", f)));
    findings
}

/// Optimized-vs-original breakdown, when both outputs were judged.
pub fn composite(state: &EvaluationState) -> Option<CompositeImprovement> {
    let original = state.output_evaluation.as_ref()?;
    let optimized = state.optimized_output_evaluation.as_ref()?;
    Some(composite_improvement(&CompositeSignals {
        structure_score: state.overall_score,
        original_output_pct: output_pct(Some(original)),
        optimized_output_pct: output_pct(Some(optimized)),
        meta_confidence: state.meta_assessment.map(|m| m.overall_confidence),
        tot_confidence: state.tot_audit.as_ref().and_then(|t| t.selected_confidence()),
    }))
}

pub fn assemble(state: &EvaluationState) -> FullEvaluationReport {
    // Meta refinement may have changed the improvements after the snapshot was taken.
    let structure_result = state.evaluation_result.clone().map(|mut result| {
        result.improvements = state.improvements.clone();
        result.rewritten_prompt = state.rewritten_prompt.clone();
        result
    });
    let non_empty = |outputs: &Vec<String>| (!outputs.is_empty()).then(|| outputs.clone());

    FullEvaluationReport {
        phase: state.phase,
        input_text: state.input_text.clone(),
        structure_result,
        output_result: state.output_evaluation.clone(),
        optimized_output_result: state.optimized_output_evaluation.clone(),
        combined_findings: combined_findings(state),
        rewritten_prompt: state.rewritten_prompt.clone(),
        meta_assessment: state.meta_assessment,
        strategy_used: state.strategy.label(),
        execution_count: state.execution_count,
        original_outputs: non_empty(&state.llm_outputs),
        optimized_outputs: non_empty(&state.optimized_outputs),
        cot_reasoning_trace: state.cot_reasoning_trace.clone(),
        tot_branches_data: state.tot_audit.clone(),
        composite_improvement: composite(state),
    }
}

async fn record_history(state: &EvaluationState, ctx: &RunContext<'_>) {
    let Some(history) = ctx.history() else {
        return;
    };
    let record = HistoryRecord {
        input_text: state.input_text.clone(),
        rewritten_prompt: state.rewritten_prompt.clone(),
        overall_score: state.overall_score,
        grade: state.grade.as_str().to_string(),
        output_score: state.output_evaluation.as_ref().map(|o| o.overall_score),
        improvements_summary: summarize_improvements(&state.improvements),
        created_at: Utc::now(),
    };
    if let Err(e) = history.record(record).await {
        log::warn!("Failed to record evaluation history: {}", e);
    }
}

pub async fn build_report(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    log::info!("Stage {} starting", Stage::BuildReport);
    let report = assemble(state);
    let message = match &report.composite_improvement {
        Some(c) => format!(
            "Evaluation report complete. Composite improvement: {}% (output {}{} pts).",
            c.composite_pct, c.output_delta_sign, c.output_delta
        ),
        None => "Evaluation report complete.".to_string(),
    };
    record_history(state, ctx).await;

    StatePatch {
        report: Some(report),
        should_continue: Some(state.followup_message.is_some()),
        ..StatePatch::message(message)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
