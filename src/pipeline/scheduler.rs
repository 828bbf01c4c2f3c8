//! Stage scheduler.
//!
//! [`Pipeline::run`] drives one evaluation from [`Stage::ENTRY`] until the
//! routing table has no next stage or a stage records a fatal error.

use std::path::PathBuf;
use std::sync::Arc;

use super::events::{emit, ProgressEvent, ProgressSender};
use super::stage::Stage;
use super::stages::{execute, RunContext};
use super::state::EvaluationState;
use crate::config::LlmProvider;
use crate::history::EvaluationHistory;
use crate::llms::GatewayFactory;

/// Stage executions allowed per run, follow-up loops included.
pub const MAX_STAGE_EXECUTIONS: usize = 64;

/// Result of a run.
#[derive(Debug, Clone)]
pub enum Outcome {
    Completed(EvaluationState),
    /// Stopped early. `message` is the recorded fatal error, verbatim.
    Aborted { message: String, state: EvaluationState },
}

impl Outcome {
    pub fn state(&self) -> &EvaluationState {
        match self {
            Outcome::Completed(state) | Outcome::Aborted { state, .. } => state,
        }
    }

    pub fn into_state(self) -> EvaluationState {
        match self {
            Outcome::Completed(state) | Outcome::Aborted { state, .. } => state,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Aborted { message, .. } => Some(message),
        }
    }
}

/// Long-lived evaluation pipeline. Cheap to share; each [`run`](Self::run)
/// builds its own gateway through the factory.
#[derive(Clone)]
pub struct Pipeline {
    gateways: Arc<dyn GatewayFactory>,
    provider: Option<LlmProvider>,
    config_dir: Option<PathBuf>,
    history: Option<Arc<dyn EvaluationHistory>>,
    max_steps: usize,
}

impl Pipeline {
    pub fn new(gateways: Arc<dyn GatewayFactory>) -> Self {
        Self {
            gateways,
            provider: None,
            config_dir: None,
            history: None,
            max_steps: MAX_STAGE_EXECUTIONS,
        }
    }

    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    pub fn with_history(mut self, history: Arc<dyn EvaluationHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Run `state` through the stage graph.
    ///
    /// Progress events go to `events` when given. A follow-up that asks for
    /// re-evaluation loops back to [`Stage::Route`] with a reset state.
    pub async fn run(&self, mut state: EvaluationState, events: Option<&ProgressSender>) -> Outcome {
        let ctx = RunContext::new(self.gateways.as_ref())
            .with_provider(self.provider)
            .with_config_dir(self.config_dir.as_deref())
            .with_history(self.history.as_deref());

        log::info!(
            "Evaluation {} starting (phase={}, strategy={})",
            state.session_id,
            state.phase.as_str(),
            state.strategy.label()
        );

        let mut next = Some(Stage::ENTRY);
        let mut previous: Option<Stage> = None;
        let mut steps = 0usize;

        while let Some(stage) = next {
            if steps >= self.max_steps {
                let message = format!(
                    "Evaluation stopped after {} stage executions without reaching a final stage.",
                    steps
                );
                log::error!("{}", message);
                state.fatal_error = Some(message.clone());
                return Outcome::Aborted { message, state };
            }
            steps += 1;

            if stage == Stage::Route && previous == Some(Stage::Followup) {
                log::info!("Re-entering pipeline for session {}", state.session_id);
                state.reset_for_reentry();
            }

            state.current_stage = Some(stage);
            emit(events, ProgressEvent::StageStarted { stage });

            let patch = execute(stage, &state, &ctx).await;
            let summary = patch.summary().to_string();
            state.apply(patch);

            emit(events, ProgressEvent::StageFinished { stage, summary });

            if let Some(message) = state.fatal_error.clone() {
                log::error!("Evaluation aborted at {}: {}", stage, message);
                return Outcome::Aborted { message, state };
            }

            previous = Some(stage);
            next = stage.next(&state);
        }

        log::info!(
            "Evaluation {} finished after {} stages: {}/100 ({})",
            state.session_id,
            steps,
            state.overall_score,
            state.grade.as_str()
        );
        Outcome::Completed(state)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::config::{EvaluationStrategy, Settings, StrategyConfig};
    use crate::evaluator::{EvalPhase, FollowupIntent, Grade};
    use crate::llms::scripted::ScriptedGateway;
    use crate::llms::{FixedGatewayFactory, SettingsGatewayFactory};

    const EMPTY_ANALYSIS: &str = r#"{"dimensions":{
        "task":{"score":0,"sub_criteria":[]},
        "context":{"score":0,"sub_criteria":[]},
        "references":{"score":0,"sub_criteria":[]},
        "constraints":{"score":0,"sub_criteria":[]}},
        "tcrei_flags":{"task":false}}"#;
    const IMPROVEMENTS: &str = r#"{"improvements":[{"priority":"CRITICAL","title":"Task","suggestion":"State the deliverable"}],"rewritten_prompt":"Write a 300-word article about dog breeds for first-time owners."}"#;
    const JUDGMENT: &str = r#"{"dimensions":[{"name":"relevance","score":0.8,"comment":"ok","recommendation":""}],"overall_score":0.8,"findings":[]}"#;

    fn standard() -> StrategyConfig {
        StrategyConfig::preset(EvaluationStrategy::Standard)
    }

    fn scripted() -> ScriptedGateway {
        ScriptedGateway::new()
            .on("Evaluate this prompt", EMPTY_ANALYSIS)
            .on("Generate improvements and a rewritten version", IMPROVEMENTS)
            .on("LLM-as-judge", JUDGMENT)
    }

    fn pipeline(gateway: Arc<ScriptedGateway>) -> Pipeline {
        Pipeline::new(Arc::new(FixedGatewayFactory(gateway)))
    }

    async fn visited(pipeline: &Pipeline, state: EvaluationState) -> (Outcome, Vec<Stage>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let outcome = pipeline.run(state, Some(&tx)).await;
        drop(tx);
        let mut stages = Vec::new();
        while let Some(event) = rx.recv().await {
            if let ProgressEvent::StageStarted { stage } = event {
                stages.push(stage);
            }
        }
        (outcome, stages)
    }

    #[tokio::test]
    async fn test_structure_run_on_vague_prompt() {
        let gateway = Arc::new(scripted().on("", "A dog article."));
        let state = EvaluationState::new("Write me something about dogs").with_strategy(standard());
        let (outcome, stages) = visited(&pipeline(gateway), state).await;

        assert!(outcome.is_completed());
        let state = outcome.state();
        assert_eq!(state.overall_score, 0);
        assert_eq!(state.grade, Grade::Weak);
        assert_eq!(state.improvements.len(), 1);
        assert!(state.report.is_some());
        assert_eq!(
            stages,
            vec![
                Stage::Route,
                Stage::Analyze,
                Stage::Score,
                Stage::Improve,
                Stage::RunOptimized,
                Stage::JudgeOptimized,
                Stage::MetaAudit,
                Stage::BuildReport,
            ]
        );
    }

    #[tokio::test]
    async fn test_output_phase_skips_structural_stages() {
        let gateway = Arc::new(scripted().on("", "Dogs are great."));
        let state = EvaluationState::new("Write me something about dogs")
            .with_phase(EvalPhase::Output)
            .with_strategy(standard());
        let (outcome, stages) = visited(&pipeline(gateway), state).await;

        assert!(outcome.is_completed());
        assert_eq!(
            stages,
            vec![Stage::Route, Stage::RunOutput, Stage::JudgeOutput, Stage::BuildReport]
        );
        for skipped in [Stage::Analyze, Stage::AnalyzeSystem, Stage::Improve, Stage::RunOptimized] {
            assert!(!stages.contains(&skipped));
        }
        assert!(outcome.state().output_evaluation.is_some());
    }

    #[tokio::test]
    async fn test_fatal_error_stops_run() {
        let gateway = Arc::new(ScriptedGateway::new().fail_on("", "Your credit balance is too low to access the API"));
        let state = EvaluationState::new("Write me something about dogs").with_strategy(standard());
        let (outcome, stages) = visited(&pipeline(gateway.clone()), state).await;

        assert!(!outcome.is_completed());
        assert!(outcome.error().unwrap().contains("Insufficient Credits"));
        assert_eq!(outcome.state().current_stage, Some(Stage::Analyze));
        assert_eq!(stages, vec![Stage::Route, Stage::Analyze]);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_aborts_before_any_call() {
        let pipeline = Pipeline::new(Arc::new(SettingsGatewayFactory::new(Settings::default())));
        let outcome = pipeline.run(EvaluationState::new("Summarize this report"), None).await;
        assert!(outcome.error().unwrap().contains("Invalid API Key"));
        assert_eq!(outcome.state().current_stage, Some(Stage::Analyze));
    }

    #[tokio::test]
    async fn test_followup_re_evaluates_new_prompt() {
        let gateway = Arc::new(
            scripted()
                .on(
                    "follow-up conversation",
                    r#"{"intent":"re_evaluate","response":"Re-evaluating the new prompt.","new_prompt":"Write a haiku about dogs"}"#,
                )
                .on("", "A dog article."),
        );
        let state = EvaluationState::new("Write me something about dogs")
            .with_strategy(standard())
            .with_followup("Evaluate my haiku version instead");
        let session = state.session_id;
        let (outcome, stages) = visited(&pipeline(gateway.clone()), state).await;

        assert!(outcome.is_completed());
        let state = outcome.state();
        assert_eq!(state.session_id, session);
        assert_eq!(state.input_text, "Write a haiku about dogs");
        assert!(state.followup_message.is_none());
        assert!(state.report.is_some());
        assert!(state.transcript.iter().any(|m| m == "Re-evaluating the new prompt."));
        assert_eq!(stages.iter().filter(|s| **s == Stage::Route).count(), 2);
        assert_eq!(stages.iter().filter(|s| **s == Stage::Followup).count(), 1);
        assert_eq!(stages.last(), Some(&Stage::BuildReport));
        assert_eq!(gateway.calls_matching("follow-up conversation"), 1);
    }

    #[tokio::test]
    async fn test_explain_followup_terminates() {
        let gateway = Arc::new(
            scripted()
                .on("follow-up conversation", r#"{"intent":"explain","response":"Task scored lowest."}"#)
                .on("", "A dog article."),
        );
        let state = EvaluationState::new("Write me something about dogs")
            .with_strategy(standard())
            .with_followup("Why is it weak?");
        let (outcome, stages) = visited(&pipeline(gateway), state).await;

        assert_eq!(stages.last(), Some(&Stage::Followup));
        assert_eq!(outcome.state().followup_intent, Some(FollowupIntent::Explain));
    }

    #[tokio::test]
    async fn test_step_guard() {
        let gateway = Arc::new(scripted().on("", "A dog article."));
        let pipeline = pipeline(gateway).with_max_steps(3);
        let outcome = pipeline
            .run(EvaluationState::new("Write me something about dogs").with_strategy(standard()), None)
            .await;
        let message = outcome.error().unwrap();
        assert!(message.contains("3 stage executions"));
        assert!(!crate::evaluator::errors::is_fatal_message(message));
    }

    #[tokio::test]
    async fn test_run_without_listener() {
        let gateway = Arc::new(scripted().on("", "A dog article."));
        let outcome = pipeline(gateway)
            .run(EvaluationState::new("Write me something about dogs").with_strategy(standard()), None)
            .await;
        assert!(outcome.into_state().report.is_some());
    }
}
