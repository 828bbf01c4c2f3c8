//! Improvement generation.
//!
//! Three strategies, picked by input size and strategy config:
//! - inputs over [`LARGE_PROMPT_CHARS`] get a two-phase run (improvements
//!   as JSON, then a plain-text rewrite);
//! - otherwise tree search when enabled ([`tree_search`]);
//! - otherwise, or when tree search yields nothing, one structured call.

pub mod tree_search;

use tera::Context;

use crate::evaluator::errors::EvaluatorError;
use crate::evaluator::schemas::{ImprovementReply, ImprovementsReply};
use crate::evaluator::{
    DimensionScore, Grade, Improvement, OutputEvaluation, Priority, TotAuditTrail,
};
use crate::llms::{invoke_plain_text, invoke_structured, ModelGateway};
use crate::prompts::{improvement_instructions, render, templates};

pub use tree_search::{resolve_selection, TreeSearchRequest, TreeSearchResult};

/// Inputs longer than this skip tree search and use the two-phase strategy.
pub const LARGE_PROMPT_CHARS: usize = 8000;

pub const NO_OUTPUT_QUALITY: &str = "No output quality data available.";

const NO_CHANGE: &str = "No change needed.";

/// Which strategy produced the improvements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImproveStrategy {
    TwoPhase,
    TreeSearch,
    SingleShot,
}

impl ImproveStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImproveStrategy::TwoPhase => "two-phase",
            ImproveStrategy::TreeSearch => "ToT",
            ImproveStrategy::SingleShot => "single-shot",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImproveRequest<'a> {
    pub input_text: &'a str,
    pub dimensions: &'a [DimensionScore],
    pub overall_score: u32,
    pub grade: Grade,
    pub output_evaluation: Option<&'a OutputEvaluation>,
    /// Prompt-type and task guidance for the rewrite.
    pub guidance: &'a str,
    /// Improvements that helped similar prompts, already formatted.
    pub historical_context: &'a str,
    pub use_tot: bool,
    pub num_branches: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImproveOutcome {
    pub improvements: Vec<Improvement>,
    pub rewritten_prompt: Option<String>,
    pub tot_audit: Option<TotAuditTrail>,
    pub strategy: ImproveStrategy,
}

impl ImproveOutcome {
    fn empty(strategy: ImproveStrategy) -> Self {
        Self {
            improvements: Vec::new(),
            rewritten_prompt: None,
            tot_audit: None,
            strategy,
        }
    }
}

/// Title case: a letter following a non-letter is uppercased, every other
/// letter lowercased (`"clear_action"` becomes `"Clear_Action"`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Map raw replies onto domain improvements, parsing priorities leniently.
pub fn map_improvements(replies: &[ImprovementReply]) -> Vec<Improvement> {
    replies
        .iter()
        .map(|r| Improvement {
            priority: Priority::parse_lenient(&r.priority),
            title: r.title.clone(),
            suggestion: r.suggestion.clone(),
        })
        .collect()
}

/// Per-dimension found/missing summary fed to the improvement calls.
pub fn analysis_summary(dimensions: &[DimensionScore]) -> String {
    dimensions
        .iter()
        .map(|dim| {
            let found: Vec<&str> = dim
                .sub_criteria
                .iter()
                .filter(|s| s.found)
                .map(|s| s.detail.as_str())
                .collect();
            let missing: Vec<&str> = dim
                .sub_criteria
                .iter()
                .filter(|s| !s.found)
                .map(|s| s.detail.as_str())
                .collect();
            format!(
                "**{}** ({}/100):\n  Found: {}\n  Missing: {}",
                title_case(&dim.name),
                dim.score,
                if found.is_empty() { "Nothing detected".to_string() } else { found.join(", ") },
                if missing.is_empty() { "All criteria met".to_string() } else { missing.join(", ") },
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Judge feedback on the original output, fed to the improvement calls.
pub fn output_quality_summary(evaluation: Option<&OutputEvaluation>) -> String {
    let Some(eval) = evaluation else {
        return NO_OUTPUT_QUALITY.to_string();
    };
    let mut lines = vec![format!(
        "Overall output quality: {}% ({})",
        (eval.overall_score * 100.0) as i64,
        eval.grade
    )];
    for dim in &eval.dimensions {
        let mut line = format!(
            "- **{}** ({}%): {}",
            title_case(&dim.name.replace('_', " ")),
            (dim.score * 100.0) as i64,
            dim.comment
        );
        if !dim.recommendation.is_empty() && dim.recommendation != NO_CHANGE {
            line.push_str(&format!("\n  Recommended fix: {}", dim.recommendation));
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// `- [PRIORITY] title: suggestion`, one per line.
pub fn improvements_text(improvements: &[Improvement]) -> String {
    improvements
        .iter()
        .map(|imp| format!("- [{}] {}: {}", imp.priority, imp.title, imp.suggestion))
        .collect::<Vec<_>>()
        .join("\n")
}

fn improvement_input(request: &ImproveRequest<'_>, summary: &str, output_quality: &str) -> Result<String, EvaluatorError> {
    let mut ctx = Context::new();
    ctx.insert("input_text", request.input_text);
    ctx.insert("analysis_summary", summary);
    ctx.insert("overall_score", &request.overall_score);
    ctx.insert("grade", request.grade.as_str());
    ctx.insert("output_quality", output_quality);
    render(templates::IMPROVEMENT_INPUT, &ctx)
}

async fn two_phase(
    gateway: &dyn ModelGateway,
    request: &ImproveRequest<'_>,
    summary: &str,
    output_quality: &str,
) -> Result<ImproveOutcome, EvaluatorError> {
    log::info!(
        "Large prompt ({} chars), using two-phase improvement",
        request.input_text.chars().count()
    );
    let instructions = improvement_instructions(request.historical_context, request.guidance, true)?;
    let input = format!(
        "{}\n\nGenerate improvement suggestions only (no rewritten prompt).",
        improvement_input(request, summary, output_quality)?
    );

    let reply: Option<ImprovementsReply> = invoke_structured(gateway, &instructions, &input).await?;
    let improvements = map_improvements(&reply.map(|r| r.improvements).unwrap_or_default());
    if improvements.is_empty() {
        log::warn!("Two-phase improvement produced no suggestions");
        return Ok(ImproveOutcome::empty(ImproveStrategy::TwoPhase));
    }

    let mut ctx = Context::new();
    ctx.insert("input_text", request.input_text);
    ctx.insert("analysis_summary", summary);
    ctx.insert("improvements", &improvements_text(&improvements));
    let rewrite_input = render(templates::PLAIN_REWRITE_INPUT, &ctx)?;
    let rewritten_prompt = invoke_plain_text(gateway, templates::PLAIN_REWRITE, &rewrite_input).await?;
    if rewritten_prompt.is_none() {
        log::warn!("Two-phase rewrite came back empty");
    }

    Ok(ImproveOutcome {
        improvements,
        rewritten_prompt,
        tot_audit: None,
        strategy: ImproveStrategy::TwoPhase,
    })
}

async fn single_shot(
    gateway: &dyn ModelGateway,
    request: &ImproveRequest<'_>,
    summary: &str,
    output_quality: &str,
) -> Result<ImproveOutcome, EvaluatorError> {
    let instructions = improvement_instructions(request.historical_context, request.guidance, false)?;
    let input = format!(
        "{}\n\nGenerate improvements and a rewritten version.",
        improvement_input(request, summary, output_quality)?
    );

    let reply: Option<ImprovementsReply> = invoke_structured(gateway, &instructions, &input).await?;
    let Some(reply) = reply else {
        log::warn!("Improvement reply could not be parsed, returning no improvements");
        return Ok(ImproveOutcome::empty(ImproveStrategy::SingleShot));
    };
    Ok(ImproveOutcome {
        improvements: map_improvements(&reply.improvements),
        rewritten_prompt: reply.rewritten_prompt.filter(|p| !p.trim().is_empty()),
        tot_audit: None,
        strategy: ImproveStrategy::SingleShot,
    })
}

/// Generate improvements and a rewrite for the analysed prompt.
///
/// Unparsable replies give an empty outcome; gateway errors are returned for
/// the stage to classify.
pub async fn generate(
    gateway: &dyn ModelGateway,
    request: &ImproveRequest<'_>,
) -> Result<ImproveOutcome, EvaluatorError> {
    let summary = analysis_summary(request.dimensions);
    let output_quality = output_quality_summary(request.output_evaluation);

    if request.input_text.chars().count() > LARGE_PROMPT_CHARS {
        return two_phase(gateway, request, &summary, &output_quality).await;
    }

    if request.use_tot {
        let tot_request = TreeSearchRequest {
            input_text: request.input_text,
            analysis_summary: &summary,
            overall_score: request.overall_score,
            grade: request.grade,
            output_quality: &output_quality,
            num_branches: request.num_branches,
        };
        if let Some(result) = tree_search::run(gateway, &tot_request).await? {
            return Ok(ImproveOutcome {
                improvements: result.improvements,
                rewritten_prompt: result.rewritten_prompt,
                tot_audit: Some(result.audit),
                strategy: ImproveStrategy::TreeSearch,
            });
        }
        log::warn!("Tree search produced nothing, falling back to single-shot improvement");
    }

    single_shot(gateway, request, &summary, &output_quality).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
