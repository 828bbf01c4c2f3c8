//! Follow-up conversation after a finished report.

use tera::Context;

use crate::evaluator::errors::EvaluatorError;
use crate::evaluator::schemas::FollowupReply;
use crate::evaluator::{EvalMode, FollowupIntent};
use crate::improver::title_case;
use crate::llms::invoke_structured;
use crate::pipeline::stage::Stage;
use crate::pipeline::state::{EvaluationState, StatePatch};
use crate::prompts::{render, templates};

use super::RunContext;

pub const FOLLOWUP_APOLOGY: &str = "Sorry, I encountered an error processing your follow-up. Please try again.";

fn dimension_summary(state: &EvaluationState) -> String {
    if state.dimension_scores.is_empty() {
        return "No dimension scores available.".to_string();
    }
    state
        .dimension_scores
        .iter()
        .map(|d| format!("- {}: {}/100", title_case(&d.name), d.score))
        .collect::<Vec<_>>()
        .join("\n")
}

fn improvements_summary(state: &EvaluationState) -> String {
    if state.improvements.is_empty() {
        return "No improvements suggested.".to_string();
    }
    state
        .improvements
        .iter()
        .map(|imp| format!("- [{}] {}: {}", imp.priority.as_str(), imp.title, imp.suggestion))
        .collect::<Vec<_>>()
        .join("\n")
}

/// State changes for a classified follow-up.
pub fn apply_intent(reply: FollowupReply) -> StatePatch {
    let intent = FollowupIntent::parse_lenient(&reply.intent);
    let response = if reply.response.is_empty() {
        "I can help with that.".to_string()
    } else {
        reply.response
    };
    let mut patch = StatePatch {
        followup_intent: Some(intent),
        consume_followup: true,
        ..StatePatch::message(response)
    };
    match intent {
        FollowupIntent::AdjustRewrite => patch.rewritten_prompt = reply.new_rewrite.filter(|r| !r.is_empty()),
        FollowupIntent::ReEvaluate => patch.input_text = reply.new_prompt.filter(|p| !p.is_empty()),
        FollowupIntent::ModeSwitch => patch.mode = reply.new_mode.as_deref().map(EvalMode::parse_lenient),
        FollowupIntent::Explain => {}
    }
    patch
}

async fn classify(state: &EvaluationState, ctx: &RunContext<'_>, message: &str) -> Result<StatePatch, EvaluatorError> {
    let gateway = ctx.gateway()?;
    let mut tctx = Context::new();
    tctx.insert("overall_score", &state.overall_score);
    tctx.insert("grade", state.grade.as_str());
    tctx.insert("dimension_summary", &dimension_summary(state));
    tctx.insert("improvements", &improvements_summary(state));
    tctx.insert(
        "rewritten_prompt",
        state.rewritten_prompt.as_deref().unwrap_or("No rewrite generated."),
    );
    tctx.insert("input_text", &state.input_text);
    let instructions = render(templates::FOLLOWUP, &tctx)?;

    let reply: Option<FollowupReply> = invoke_structured(gateway.as_ref(), &instructions, message).await?;
    let reply = reply.unwrap_or_else(|| {
        log::warn!("Follow-up reply could not be parsed, treating as explain");
        FollowupReply {
            response: message.to_string(),
            ..FollowupReply::default()
        }
    });
    Ok(apply_intent(reply))
}

pub async fn followup(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    let Some(message) = state.followup_message.as_deref() else {
        return StatePatch {
            followup_intent: Some(FollowupIntent::Explain),
            ..StatePatch::message("No follow-up message to answer.")
        };
    };
    log::info!("Stage {} starting", Stage::Followup);
    match classify(state, ctx, message).await {
        Ok(patch) => patch,
        Err(e) => {
            log::warn!("Follow-up handling failed: {}", e);
            StatePatch {
                followup_intent: Some(FollowupIntent::Explain),
                consume_followup: true,
                ..StatePatch::message(FOLLOWUP_APOLOGY)
            }
        }
    }
}
