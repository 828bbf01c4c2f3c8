//! Self-audit of the finished evaluation.

use tera::Context;

use crate::evaluator::errors::EvaluatorError;
use crate::evaluator::schemas::MetaEvaluationReply;
use crate::evaluator::{DimensionScore, Improvement, MetaAssessment};
use crate::improver::{map_improvements, title_case};
use crate::llms::invoke_structured;
use crate::pipeline::stage::Stage;
use crate::pipeline::state::{EvaluationState, StatePatch};
use crate::prompts::{render, templates};

use super::{recover, RunContext};

pub const META_NO_RESULT: &str = "Meta-evaluation could not produce results.";
const META_INPUT: &str = "Evaluate the quality of this evaluation and suggest refinements.";

/// `- **Task**: 70/100 (2/3 sub-criteria met)` per dimension.
pub fn dimension_summary(dimensions: &[DimensionScore]) -> String {
    if dimensions.is_empty() {
        return "No dimension scores available.".to_string();
    }
    dimensions
        .iter()
        .map(|dim| {
            let met = dim.sub_criteria.iter().filter(|s| s.found).count();
            format!(
                "- **{}**: {}/100 ({}/{} sub-criteria met)",
                title_case(&dim.name),
                dim.score,
                met,
                dim.sub_criteria.len()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn improvements_summary(improvements: &[Improvement]) -> String {
    if improvements.is_empty() {
        return "No improvements were suggested.".to_string();
    }
    improvements
        .iter()
        .map(|imp| format!("- [{}] **{}**: {}", imp.priority, imp.title, imp.suggestion))
        .collect::<Vec<_>>()
        .join("\n")
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

async fn audit(state: &EvaluationState, ctx: &RunContext<'_>) -> Result<StatePatch, EvaluatorError> {
    let gateway = ctx.gateway()?;

    let mut tctx = Context::new();
    tctx.insert("input_text", &state.input_text);
    tctx.insert("overall_score", &state.overall_score);
    tctx.insert("grade", state.grade.as_str());
    tctx.insert("dimension_summary", &dimension_summary(&state.dimension_scores));
    tctx.insert("improvements", &improvements_summary(&state.improvements));
    tctx.insert(
        "rewritten_prompt",
        state.rewritten_prompt.as_deref().unwrap_or("No rewritten prompt was generated."),
    );
    tctx.insert("rounds", &state.strategy.meta_refinement_rounds);
    let instructions = render(templates::META_AUDIT, &tctx)?;

    let reply: Option<MetaEvaluationReply> = invoke_structured(gateway.as_ref(), &instructions, META_INPUT).await?;
    let Some(reply) = reply else {
        log::warn!("Meta-evaluation returned no result, skipping refinement");
        return Ok(StatePatch {
            meta_findings: Some(vec![META_NO_RESULT.to_string()]),
            ..StatePatch::message("Meta-evaluation skipped: could not parse self-assessment.")
        });
    };

    let a = reply.meta_assessment;
    let assessment = MetaAssessment {
        accuracy_score: clamp_unit(a.accuracy_score),
        completeness_score: clamp_unit(a.completeness_score),
        actionability_score: clamp_unit(a.actionability_score),
        faithfulness_score: clamp_unit(a.faithfulness_score),
        overall_confidence: clamp_unit(a.overall_confidence),
    };

    let improvements = (!reply.refined_improvements.is_empty()).then(|| {
        let mut merged = state.improvements.clone();
        merged.extend(map_improvements(&reply.refined_improvements).into_iter().map(|imp| Improvement {
            title: format!("[Meta] {}", imp.title),
            ..imp
        }));
        merged
    });
    let rewritten_prompt = reply.refined_rewritten_prompt.filter(|p| !p.trim().is_empty());

    Ok(StatePatch {
        meta_assessment: Some(assessment),
        meta_findings: Some(reply.meta_findings),
        improvements,
        rewritten_prompt,
        ..StatePatch::message(format!(
            "Meta-evaluation complete: confidence {}%.",
            (assessment.overall_confidence * 100.0).round_ties_even() as i64
        ))
    })
}

pub async fn meta_audit(state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    if !state.strategy.use_meta {
        return StatePatch::message("Meta-evaluation disabled for this strategy: skipping.");
    }
    log::info!("Stage {} starting", Stage::MetaAudit);
    match audit(state, ctx).await {
        Ok(patch) => patch,
        Err(e) => {
            let fallback = StatePatch {
                meta_findings: Some(vec![format!("Meta-evaluation failed: {}", e)]),
                ..StatePatch::message(format!("Meta-evaluation failed: {}. Skipping self-assessment.", e))
            };
            recover(Stage::MetaAudit, e, fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{EvaluationStrategy, StrategyConfig};
    use crate::evaluator::{Priority, SubCriterionResult};
    use crate::llms::scripted::ScriptedGateway;
    use crate::llms::FixedGatewayFactory;

    fn state() -> EvaluationState {
        let mut state = EvaluationState::new("Write me something about dogs");
        state.improvements = vec![Improvement {
            priority: Priority::High,
            title: "Audience".into(),
            suggestion: "Name the reader".into(),
        }];
        state.rewritten_prompt = Some("Write for kids.".into());
        state
    }

    #[test]
    fn test_dimension_summary() {
        let dims = vec![DimensionScore::new(
            "task",
            60,
            vec![
                SubCriterionResult { name: "a".into(), found: true, detail: "x".into() },
                SubCriterionResult { name: "b".into(), found: false, detail: "y".into() },
            ],
        )];
        assert_eq!(dimension_summary(&dims), "- **Task**: 60/100 (1/2 sub-criteria met)");
        assert_eq!(dimension_summary(&[]), "No dimension scores available.");
    }

    #[tokio::test]
    async fn test_refinements_are_merged() {
        let gateway = Arc::new(ScriptedGateway::new().on(
            "meta-evaluator",
            r#"{"meta_assessment":{"accuracy_score":0.9,"completeness_score":0.8,"actionability_score":0.85,
                "faithfulness_score":0.7,"overall_confidence":0.87},
               "refined_improvements":[{"priority":"low","title":"Length","suggestion":"Give a word count"}],
               "refined_rewritten_prompt":"Write 200 words for kids.","meta_findings":["Missed length"]}"#,
        ));
        let factory = FixedGatewayFactory(gateway);
        let ctx = RunContext::new(&factory);
        let patch = meta_audit(&state(), &ctx).await;

        assert_eq!(patch.meta_assessment.unwrap().overall_confidence, 0.87);
        let improvements = patch.improvements.unwrap();
        assert_eq!(improvements.len(), 2);
        assert_eq!(improvements[1].title, "[Meta] Length");
        assert_eq!(improvements[1].priority, Priority::Low);
        assert_eq!(patch.rewritten_prompt.as_deref(), Some("Write 200 words for kids."));
        assert_eq!(patch.meta_findings.unwrap(), vec!["Missed length".to_string()]);
    }

    #[tokio::test]
    async fn test_partial_reply_uses_half_defaults() {
        let gateway = Arc::new(ScriptedGateway::new().on("meta-evaluator", r#"{"meta_findings":["ok"]}"#));
        let factory = FixedGatewayFactory(gateway);
        let ctx = RunContext::new(&factory);
        let patch = meta_audit(&state(), &ctx).await;
        assert_eq!(patch.meta_assessment.unwrap().accuracy_score, 0.5);
        assert!(patch.improvements.is_none());
        assert!(patch.rewritten_prompt.is_none());
    }

    #[tokio::test]
    async fn test_parse_failure_and_disabled_strategy() {
        let gateway = Arc::new(ScriptedGateway::new().on("", "cannot comply"));
        let factory = FixedGatewayFactory(gateway);
        let ctx = RunContext::new(&factory);
        let patch = meta_audit(&state(), &ctx).await;
        assert!(patch.meta_assessment.is_none());
        assert_eq!(patch.meta_findings.unwrap(), vec![META_NO_RESULT.to_string()]);

        let factory = FixedGatewayFactory(Arc::new(ScriptedGateway::new()));
        let ctx = RunContext::new(&factory);
        let mut s = state();
        s.strategy = StrategyConfig::preset(EvaluationStrategy::Standard);
        let patch = meta_audit(&s, &ctx).await;
        assert!(patch.meta_findings.is_none());
        assert!(patch.summary().contains("skipping"));
    }
}
