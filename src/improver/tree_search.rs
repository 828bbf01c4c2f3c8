//! Tree-of-thought improvement search.
//!
//! One call generates `n` divergent branches, a second call selects one of
//! them or synthesizes a merged prompt. [`resolve_selection`] turns the two
//! replies into improvements, a rewrite and an audit trail.

use tera::Context;

use super::map_improvements;
use crate::evaluator::errors::EvaluatorError;
use crate::evaluator::schemas::{BranchReply, BranchesReply, SelectionReply};
use crate::evaluator::{Grade, Improvement, TotAuditTrail, TotBranchAudit};
use crate::llms::{invoke_structured, ModelGateway};
use crate::prompts::{render, templates};

pub const FALLBACK_RATIONALE: &str =
    "Automatic: highest confidence branch selected (selection LLM call failed)";
const DEFAULT_RATIONALE: &str = "LLM-selected best branch";
const PREVIEW_CHARS: usize = 200;

/// Result of a tree search that produced at least one branch.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSearchResult {
    pub improvements: Vec<Improvement>,
    pub rewritten_prompt: Option<String>,
    pub audit: TotAuditTrail,
}

/// Everything the two calls need to know about the prompt.
#[derive(Debug, Clone)]
pub struct TreeSearchRequest<'a> {
    pub input_text: &'a str,
    pub analysis_summary: &'a str,
    pub overall_score: u32,
    pub grade: Grade,
    pub output_quality: &'a str,
    pub num_branches: usize,
}

/// Index of the branch with the highest confidence; the first one on ties.
pub fn highest_confidence(branches: &[BranchReply]) -> usize {
    branches
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_conf), (i, b)| {
            if b.confidence > best_conf {
                (i, b.confidence)
            } else {
                (best, best_conf)
            }
        })
        .0
}

fn audit_entries(branches: &[BranchReply]) -> Vec<TotBranchAudit> {
    branches
        .iter()
        .map(|b| TotBranchAudit {
            approach: b.approach.clone(),
            improvements_count: b.improvements.len(),
            rewritten_prompt_preview: b.rewritten_prompt.chars().take(PREVIEW_CHARS).collect(),
            confidence: b.confidence,
        })
        .collect()
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Combine the generated branches with the selection reply (`None` when the
/// selection call produced nothing usable).
///
/// `branches` must be non-empty.
pub fn resolve_selection(branches: &[BranchReply], selection: Option<&SelectionReply>) -> TreeSearchResult {
    let audit_branches = audit_entries(branches);

    let Some(selection) = selection else {
        let best = highest_confidence(branches);
        log::warn!("Branch selection failed, using highest-confidence branch {}", best);
        let branch = &branches[best];
        return TreeSearchResult {
            improvements: map_improvements(&branch.improvements),
            rewritten_prompt: non_empty(&branch.rewritten_prompt),
            audit: TotAuditTrail {
                branches: audit_branches,
                selected_branch_index: best as i64,
                selection_rationale: FALLBACK_RATIONALE.to_string(),
                synthesized: false,
            },
        };
    };

    let index = match selection.selected_branch_index {
        Some(index) => index,
        None => {
            let best = highest_confidence(branches);
            log::info!("Selection returned no index, using highest-confidence branch {}", best);
            best as i64
        }
    };

    let synthesized = selection.synthesized_prompt.as_deref().and_then(non_empty);
    let selected = usize::try_from(index).ok().and_then(|i| branches.get(i));

    let (improvements, rewritten_prompt) = match selected {
        Some(branch) => (
            map_improvements(&branch.improvements),
            synthesized.clone().or_else(|| non_empty(&branch.rewritten_prompt)),
        ),
        None => {
            log::warn!("Selected branch index {} is out of range ({} branches)", index, branches.len());
            (Vec::new(), synthesized.clone())
        }
    };

    let rationale = if selection.rationale.is_empty() {
        DEFAULT_RATIONALE.to_string()
    } else {
        selection.rationale.clone()
    };

    TreeSearchResult {
        improvements,
        rewritten_prompt,
        audit: TotAuditTrail {
            branches: audit_branches,
            selected_branch_index: index,
            selection_rationale: rationale,
            synthesized: synthesized.is_some(),
        },
    }
}

/// Markdown rendering of the branches for the selection call.
pub fn format_branches(branches: &[BranchReply]) -> String {
    branches
        .iter()
        .enumerate()
        .map(|(i, branch)| {
            let improvements = branch
                .improvements
                .iter()
                .map(|imp| format!("  - [{}] {}: {}", imp.priority, imp.title, imp.suggestion))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "### Branch {} (confidence: {:.2})\n**Approach:** {}\n**Improvements:**\n{}\n**Rewritten prompt:**\n```\n{}\n```",
                i + 1,
                branch.confidence,
                branch.approach,
                improvements,
                branch.rewritten_prompt
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Run both phases. `Ok(None)` means generation produced no branches and the
/// caller should fall back to single-shot improvement.
pub async fn run(
    gateway: &dyn ModelGateway,
    request: &TreeSearchRequest<'_>,
) -> Result<Option<TreeSearchResult>, EvaluatorError> {
    let mut ctx = Context::new();
    ctx.insert("num_branches", &request.num_branches);
    ctx.insert("input_text", request.input_text);
    ctx.insert("analysis_summary", request.analysis_summary);
    ctx.insert("overall_score", &request.overall_score);
    ctx.insert("grade", request.grade.as_str());
    ctx.insert("output_quality", request.output_quality);
    let instructions = render(templates::TOT_GENERATE, &ctx)?;
    let input = format!(
        "Generate {} distinct improvement branches for the prompt above.",
        request.num_branches
    );

    let generated: Option<BranchesReply> = invoke_structured(gateway, &instructions, &input).await?;
    let branches = match generated {
        Some(reply) if !reply.branches.is_empty() => reply.branches,
        _ => {
            log::warn!("Branch generation returned no branches, falling back to single-shot");
            return Ok(None);
        }
    };
    log::info!("Generated {} improvement branches", branches.len());

    let mut ctx = Context::new();
    ctx.insert("num_branches", &branches.len());
    ctx.insert("input_text", request.input_text);
    ctx.insert("overall_score", &request.overall_score);
    ctx.insert("grade", request.grade.as_str());
    ctx.insert("branches", &format_branches(&branches));
    let instructions = render(templates::TOT_SELECT, &ctx)?;

    let selection: Option<SelectionReply> = invoke_structured(
        gateway,
        &instructions,
        "Select the best branch or synthesize the strongest elements.",
    )
    .await?;

    Ok(Some(resolve_selection(&branches, selection.as_ref())))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::schemas::ImprovementReply;
    use crate::evaluator::Priority;
    use crate::llms::scripted::ScriptedGateway;

    fn branch(approach: &str, confidence: f64, rewrite: &str) -> BranchReply {
        BranchReply {
            approach: approach.to_string(),
            improvements: vec![ImprovementReply {
                priority: "high".to_string(),
                title: format!("{} title", approach),
                suggestion: "do it".to_string(),
            }],
            rewritten_prompt: rewrite.to_string(),
            confidence,
        }
    }

    fn branches() -> Vec<BranchReply> {
        vec![
            branch("restructure", 0.6, "rewrite A"),
            branch("persona", 0.9, "rewrite B"),
            branch("examples", 0.7, "rewrite C"),
        ]
    }

    #[test]
    fn test_failed_selection_uses_highest_confidence() {
        let out = resolve_selection(&branches(), None);
        assert_eq!(out.audit.selected_branch_index, 1);
        assert_eq!(out.audit.selection_rationale, FALLBACK_RATIONALE);
        assert!(!out.audit.synthesized);
        assert_eq!(out.rewritten_prompt.as_deref(), Some("rewrite B"));
        assert_eq!(out.improvements[0].priority, Priority::High);
        assert_eq!(out.audit.branches.len(), 3);
    }

    #[test]
    fn test_null_index_picks_highest_confidence_and_keeps_rationale() {
        let selection = SelectionReply {
            selected_branch_index: None,
            synthesized_prompt: None,
            rationale: "persona is strongest".to_string(),
        };
        let out = resolve_selection(&branches(), Some(&selection));
        assert_eq!(out.audit.selected_branch_index, 1);
        assert_eq!(out.audit.selection_rationale, "persona is strongest");
        assert_eq!(out.rewritten_prompt.as_deref(), Some("rewrite B"));
    }

    #[test]
    fn test_out_of_range_index_gives_no_improvements() {
        let selection = SelectionReply {
            selected_branch_index: Some(7),
            synthesized_prompt: Some(String::new()),
            rationale: String::new(),
        };
        let out = resolve_selection(&branches(), Some(&selection));
        assert!(out.improvements.is_empty());
        assert_eq!(out.rewritten_prompt, None);
        assert_eq!(out.audit.selected_branch_index, 7);
        assert_eq!(out.audit.selection_rationale, DEFAULT_RATIONALE);

        let negative = SelectionReply {
            selected_branch_index: Some(-1),
            ..selection
        };
        assert!(resolve_selection(&branches(), Some(&negative)).improvements.is_empty());
    }

    #[test]
    fn test_synthesized_prompt_wins() {
        let selection = SelectionReply {
            selected_branch_index: Some(0),
            synthesized_prompt: Some("merged prompt".to_string()),
            rationale: "merged".to_string(),
        };
        let out = resolve_selection(&branches(), Some(&selection));
        assert_eq!(out.rewritten_prompt.as_deref(), Some("merged prompt"));
        assert!(out.audit.synthesized);
        assert_eq!(out.improvements[0].title, "restructure title");
    }

    #[test]
    fn test_empty_branch_rewrite_is_absent() {
        let selection = SelectionReply {
            selected_branch_index: Some(0),
            synthesized_prompt: None,
            rationale: "r".to_string(),
        };
        let out = resolve_selection(&[branch("a", 0.5, "")], Some(&selection));
        assert_eq!(out.rewritten_prompt, None);
    }

    #[test]
    fn test_highest_confidence_first_on_ties() {
        let tied = vec![branch("a", 0.8, "x"), branch("b", 0.8, "y")];
        assert_eq!(highest_confidence(&tied), 0);
    }

    #[test]
    fn test_audit_preview_is_truncated() {
        let long = "p".repeat(500);
        let out = resolve_selection(&[branch("a", 0.5, &long)], None);
        assert_eq!(out.audit.branches[0].rewritten_prompt_preview.len(), 200);
        assert_eq!(out.audit.branches[0].improvements_count, 1);
    }

    #[test]
    fn test_format_branches() {
        let text = format_branches(&branches()[..1]);
        assert_eq!(
            text,
            "### Branch 1 (confidence: 0.60)\n**Approach:** restructure\n**Improvements:**\n  - [high] restructure title: do it\n**Rewritten prompt:**\n```\nrewrite A\n```"
        );
    }

    fn request() -> TreeSearchRequest<'static> {
        TreeSearchRequest {
            input_text: "Write me something about dogs",
            analysis_summary: "summary",
            overall_score: 12,
            grade: Grade::Weak,
            output_quality: "No output quality data available.",
            num_branches: 3,
        }
    }

    #[tokio::test]
    async fn test_run_both_phases() {
        let gateway = ScriptedGateway::new()
            .on(
                "structurally different",
                r#"{"branches":[{"approach":"a","improvements":[],"rewritten_prompt":"ra","confidence":0.4},
                                {"approach":"b","improvements":[],"rewritten_prompt":"rb","confidence":0.8}]}"#,
            )
            .on("candidate improvement branches", r#"{"selected_branch_index":0,"rationale":"a is tighter"}"#);
        let out = run(&gateway, &request()).await.unwrap().unwrap();
        assert_eq!(out.rewritten_prompt.as_deref(), Some("ra"));
        assert_eq!(out.audit.selection_rationale, "a is tighter");
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_run_selection_failure_falls_back() {
        let gateway = ScriptedGateway::new()
            .on(
                "structurally different",
                r#"{"branches":[{"approach":"a","rewritten_prompt":"ra","confidence":0.4},
                                {"approach":"b","rewritten_prompt":"rb","confidence":0.8}]}"#,
            )
            .on("candidate improvement branches", "I cannot decide.");
        let out = run(&gateway, &request()).await.unwrap().unwrap();
        assert_eq!(out.audit.selected_branch_index, 1);
        assert_eq!(out.audit.selection_rationale, FALLBACK_RATIONALE);
    }

    #[tokio::test]
    async fn test_run_without_branches_is_none() {
        let gateway = ScriptedGateway::new().on("structurally different", r#"{"branches":[]}"#);
        assert!(run(&gateway, &request()).await.unwrap().is_none());
    }
}
