//! Evaluation state and the patches stages return.
//!
//! Stages never mutate [`EvaluationState`] directly. Each returns a sparse
//! [`StatePatch`]; the scheduler merges it with [`EvaluationState::apply`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::Stage;
use crate::config::StrategyConfig;
use crate::evaluator::{
    DimensionScore, EvalMode, EvalPhase, EvaluationResult, FollowupIntent, FullEvaluationReport,
    Grade, Improvement, MetaAssessment, OutputEvaluation, PromptType, TaskType, TcreiFlags,
    TotAuditTrail,
};

/// Default number of executions per prompt in the output phases.
pub const DEFAULT_EXECUTION_COUNT: usize = 2;

/// Upper bound on executions per prompt.
pub const MAX_EXECUTION_COUNT: usize = 5;

/// The single record threaded through every stage of one evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationState {
    // Identity
    pub session_id: Uuid,
    pub input_text: String,
    pub mode: EvalMode,
    pub phase: EvalPhase,
    pub expected_outcome: Option<String>,
    pub task_type: TaskType,
    pub prompt_type: PromptType,
    pub strategy: StrategyConfig,
    pub execution_count: usize,

    // Structural results
    pub dimension_scores: Vec<DimensionScore>,
    pub tcrei_flags: TcreiFlags,
    pub overall_score: u32,
    pub grade: Grade,
    pub chunk_count: usize,
    pub cot_reasoning_trace: Option<String>,

    // Improvement results
    pub improvements: Vec<Improvement>,
    pub rewritten_prompt: Option<String>,
    pub tot_audit: Option<TotAuditTrail>,
    pub evaluation_result: Option<EvaluationResult>,

    // Output results
    pub llm_outputs: Vec<String>,
    pub output_summary: Option<String>,
    pub output_evaluation: Option<OutputEvaluation>,
    pub optimized_outputs: Vec<String>,
    pub optimized_output_summary: Option<String>,
    pub optimized_output_evaluation: Option<OutputEvaluation>,

    // Meta results
    pub meta_assessment: Option<MetaAssessment>,
    pub meta_findings: Vec<String>,

    pub report: Option<FullEvaluationReport>,

    // Control
    pub current_stage: Option<Stage>,
    /// Presence means the run is aborted. Never cleared once set.
    pub fatal_error: Option<String>,
    pub should_continue: bool,
    pub followup_message: Option<String>,
    pub followup_intent: Option<FollowupIntent>,
    pub transcript: Vec<String>,
}

impl EvaluationState {
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            input_text: input_text.into(),
            mode: EvalMode::Prompt,
            phase: EvalPhase::Structure,
            expected_outcome: None,
            task_type: TaskType::General,
            prompt_type: PromptType::Initial,
            strategy: StrategyConfig::default(),
            execution_count: DEFAULT_EXECUTION_COUNT,
            dimension_scores: Vec::new(),
            tcrei_flags: TcreiFlags::default(),
            overall_score: 0,
            grade: Grade::Weak,
            chunk_count: 0,
            cot_reasoning_trace: None,
            improvements: Vec::new(),
            rewritten_prompt: None,
            tot_audit: None,
            evaluation_result: None,
            llm_outputs: Vec::new(),
            output_summary: None,
            output_evaluation: None,
            optimized_outputs: Vec::new(),
            optimized_output_summary: None,
            optimized_output_evaluation: None,
            meta_assessment: None,
            meta_findings: Vec::new(),
            report: None,
            current_stage: None,
            fatal_error: None,
            should_continue: false,
            followup_message: None,
            followup_intent: None,
            transcript: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_phase(mut self, phase: EvalPhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_expected_outcome(mut self, expected: impl Into<String>) -> Self {
        self.expected_outcome = Some(expected.into());
        self
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    /// Clamped to `1..=MAX_EXECUTION_COUNT`.
    pub fn with_execution_count(mut self, count: usize) -> Self {
        self.execution_count = count.clamp(1, MAX_EXECUTION_COUNT);
        self
    }

    /// Queue a follow-up message to be handled after the report is built.
    pub fn with_followup(mut self, message: impl Into<String>) -> Self {
        self.followup_message = Some(message.into());
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.fatal_error.is_some()
    }

    /// Merge a stage patch. A fatal error already recorded is never replaced.
    pub fn apply(&mut self, patch: StatePatch) {
        let StatePatch {
            input_text,
            mode,
            phase,
            prompt_type,
            dimension_scores,
            tcrei_flags,
            overall_score,
            grade,
            chunk_count,
            cot_reasoning_trace,
            improvements,
            rewritten_prompt,
            tot_audit,
            evaluation_result,
            llm_outputs,
            output_summary,
            output_evaluation,
            optimized_outputs,
            optimized_output_summary,
            optimized_output_evaluation,
            meta_assessment,
            meta_findings,
            report,
            should_continue,
            followup_intent,
            consume_followup,
            fatal_error,
            messages,
        } = patch;

        set(&mut self.input_text, input_text);
        set(&mut self.mode, mode);
        set(&mut self.phase, phase);
        set(&mut self.prompt_type, prompt_type);
        set(&mut self.dimension_scores, dimension_scores);
        set(&mut self.tcrei_flags, tcrei_flags);
        set(&mut self.overall_score, overall_score);
        set(&mut self.grade, grade);
        set(&mut self.chunk_count, chunk_count);
        set(&mut self.improvements, improvements);
        set(&mut self.llm_outputs, llm_outputs);
        set(&mut self.optimized_outputs, optimized_outputs);
        set(&mut self.meta_findings, meta_findings);
        set(&mut self.should_continue, should_continue);

        set_some(&mut self.cot_reasoning_trace, cot_reasoning_trace);
        set_some(&mut self.rewritten_prompt, rewritten_prompt);
        set_some(&mut self.tot_audit, tot_audit);
        set_some(&mut self.evaluation_result, evaluation_result);
        set_some(&mut self.output_summary, output_summary);
        set_some(&mut self.output_evaluation, output_evaluation);
        set_some(&mut self.optimized_output_summary, optimized_output_summary);
        set_some(&mut self.optimized_output_evaluation, optimized_output_evaluation);
        set_some(&mut self.meta_assessment, meta_assessment);
        set_some(&mut self.report, report);
        set_some(&mut self.followup_intent, followup_intent);

        if consume_followup {
            self.followup_message = None;
        }
        if self.fatal_error.is_none() {
            self.fatal_error = fatal_error;
        }
        self.transcript.extend(messages);
    }

    /// Clear every result before a follow-up re-enters the pipeline.
    ///
    /// Session identity, the expected outcome, the transcript, strategy,
    /// execution count, task type and phase survive; mode detection runs
    /// again on the new input.
    pub fn reset_for_reentry(&mut self) {
        let fresh = EvaluationState::new(std::mem::take(&mut self.input_text));
        *self = EvaluationState {
            session_id: self.session_id,
            expected_outcome: self.expected_outcome.take(),
            phase: self.phase,
            task_type: self.task_type,
            strategy: self.strategy,
            execution_count: self.execution_count,
            current_stage: self.current_stage,
            transcript: std::mem::take(&mut self.transcript),
            ..fresh
        };
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn set_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Sparse update returned by a stage. `None` fields leave the state as is.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub input_text: Option<String>,
    pub mode: Option<EvalMode>,
    pub phase: Option<EvalPhase>,
    pub prompt_type: Option<PromptType>,

    pub dimension_scores: Option<Vec<DimensionScore>>,
    pub tcrei_flags: Option<TcreiFlags>,
    pub overall_score: Option<u32>,
    pub grade: Option<Grade>,
    pub chunk_count: Option<usize>,
    pub cot_reasoning_trace: Option<String>,

    pub improvements: Option<Vec<Improvement>>,
    pub rewritten_prompt: Option<String>,
    pub tot_audit: Option<TotAuditTrail>,
    pub evaluation_result: Option<EvaluationResult>,

    pub llm_outputs: Option<Vec<String>>,
    pub output_summary: Option<String>,
    pub output_evaluation: Option<OutputEvaluation>,
    pub optimized_outputs: Option<Vec<String>>,
    pub optimized_output_summary: Option<String>,
    pub optimized_output_evaluation: Option<OutputEvaluation>,

    pub meta_assessment: Option<MetaAssessment>,
    pub meta_findings: Option<Vec<String>>,

    pub report: Option<FullEvaluationReport>,

    pub should_continue: Option<bool>,
    pub followup_intent: Option<FollowupIntent>,
    /// Drop the pending follow-up message.
    pub consume_followup: bool,
    pub fatal_error: Option<String>,
    /// Lines appended to the transcript.
    pub messages: Vec<String>,
}

impl StatePatch {
    /// A patch carrying only a transcript line.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            messages: vec![text.into()],
            ..Self::default()
        }
    }

    /// A patch that aborts the run with `message`.
    pub fn fatal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            messages: vec![message.clone()],
            fatal_error: Some(message),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.messages.push(text.into());
        self
    }

    /// First transcript line, used as the stage summary in progress events.
    pub fn summary(&self) -> &str {
        self.messages.first().map(String::as_str).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_sets_only_present_fields() {
        let mut state = EvaluationState::new("hello");
        state.overall_score = 40;
        state.apply(StatePatch {
            grade: Some(Grade::Good),
            rewritten_prompt: Some("better".into()),
            ..StatePatch::message("scored")
        });
        assert_eq!(state.overall_score, 40);
        assert_eq!(state.grade, Grade::Good);
        assert_eq!(state.rewritten_prompt.as_deref(), Some("better"));
        assert_eq!(state.transcript, vec!["scored".to_string()]);
    }

    #[test]
    fn test_fatal_error_is_never_cleared_or_replaced() {
        let mut state = EvaluationState::new("hello");
        state.apply(StatePatch::fatal("first"));
        state.apply(StatePatch::default());
        state.apply(StatePatch::fatal("second"));
        assert_eq!(state.fatal_error.as_deref(), Some("first"));
        assert!(state.is_aborted());
    }

    #[test]
    fn test_consume_followup() {
        let mut state = EvaluationState::new("hello").with_followup("why?");
        state.apply(StatePatch {
            consume_followup: true,
            followup_intent: Some(FollowupIntent::Explain),
            ..StatePatch::default()
        });
        assert!(state.followup_message.is_none());
        assert_eq!(state.followup_intent, Some(FollowupIntent::Explain));
    }

    #[test]
    fn test_reset_for_reentry_keeps_session() {
        let mut state = EvaluationState::new("old")
            .with_mode(EvalMode::SystemPrompt)
            .with_task_type(TaskType::CodingTask)
            .with_execution_count(4);
        state.overall_score = 77;
        state.rewritten_prompt = Some("r".into());
        state.transcript.push("line".into());
        let session = state.session_id;
        state.input_text = "new".into();

        state.reset_for_reentry();
        assert_eq!(state.session_id, session);
        assert_eq!(state.input_text, "new");
        assert_eq!(state.overall_score, 0);
        assert!(state.rewritten_prompt.is_none());
        assert_eq!(state.mode, EvalMode::Prompt);
        assert_eq!(state.task_type, TaskType::CodingTask);
        assert_eq!(state.execution_count, 4);
        assert_eq!(state.transcript, vec!["line".to_string()]);
    }

    #[test]
    fn test_reset_for_reentry_keeps_expected_outcome() {
        let mut state = EvaluationState::new("You are a support agent.")
            .with_mode(EvalMode::SystemPrompt)
            .with_expected_outcome("Polite answers");
        state.input_text = "Be brief and friendly.".into();

        state.reset_for_reentry();
        assert_eq!(state.expected_outcome.as_deref(), Some("Polite answers"));
        assert_eq!(state.mode, EvalMode::Prompt);
        let mode = crate::pipeline::stages::router::detect_mode(
            &state.input_text,
            state.expected_outcome.as_deref(),
            state.mode,
        );
        assert_eq!(mode, EvalMode::SystemPrompt);
    }
}
