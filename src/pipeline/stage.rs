//! Stage identifiers and the routing table.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::EvaluationState;
use crate::evaluator::{EvalMode, EvalPhase, FollowupIntent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Route,
    Analyze,
    AnalyzeSystem,
    Score,
    RunOutput,
    JudgeOutput,
    Improve,
    RunOptimized,
    JudgeOptimized,
    MetaAudit,
    BuildReport,
    Followup,
}

impl Stage {
    pub const ENTRY: Stage = Stage::Route;

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Route => "route",
            Stage::Analyze => "analyze",
            Stage::AnalyzeSystem => "analyze_system",
            Stage::Score => "score",
            Stage::RunOutput => "run_output",
            Stage::JudgeOutput => "judge_output",
            Stage::Improve => "improve",
            Stage::RunOptimized => "run_optimized",
            Stage::JudgeOptimized => "judge_optimized",
            Stage::MetaAudit => "meta_audit",
            Stage::BuildReport => "build_report",
            Stage::Followup => "followup",
        }
    }

    /// The stage to run after `self`, or `None` to stop.
    ///
    /// Any recorded fatal error stops the run.
    pub fn next(self, state: &EvaluationState) -> Option<Stage> {
        if state.is_aborted() {
            return None;
        }
        match self {
            Stage::Route => Some(match (state.phase, state.mode) {
                (EvalPhase::Output, _) => Stage::RunOutput,
                (_, EvalMode::SystemPrompt) => Stage::AnalyzeSystem,
                (_, EvalMode::Prompt) => Stage::Analyze,
            }),
            Stage::Analyze | Stage::AnalyzeSystem => Some(Stage::Score),
            Stage::Score => Some(match state.phase {
                EvalPhase::Full => Stage::RunOutput,
                EvalPhase::Structure | EvalPhase::Output => Stage::Improve,
            }),
            Stage::RunOutput => Some(Stage::JudgeOutput),
            Stage::JudgeOutput => Some(match state.phase {
                EvalPhase::Output => Stage::BuildReport,
                EvalPhase::Structure | EvalPhase::Full => Stage::Improve,
            }),
            Stage::Improve => Some(match state.rewritten_prompt {
                Some(_) => Stage::RunOptimized,
                None => Stage::MetaAudit,
            }),
            Stage::RunOptimized => Some(Stage::JudgeOptimized),
            Stage::JudgeOptimized => Some(Stage::MetaAudit),
            Stage::MetaAudit => Some(Stage::BuildReport),
            Stage::BuildReport => state.should_continue.then_some(Stage::Followup),
            Stage::Followup => match state.followup_intent {
                Some(FollowupIntent::ReEvaluate) => Some(Stage::Route),
                Some(FollowupIntent::Explain | FollowupIntent::AdjustRewrite | FollowupIntent::ModeSwitch)
                | None => None,
            },
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
