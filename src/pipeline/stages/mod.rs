//! Stage implementations.
//!
//! Every stage reads the state and returns a [`StatePatch`]. Errors never
//! leave a stage: [`recover`] turns fatal ones into an abort patch and
//! everything else into the stage's degraded result.

pub mod analyzer;
pub mod followup;
pub mod improver;
pub mod meta_auditor;
pub mod output;
pub mod report_builder;
pub mod router;
pub mod scorer;

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::stage::Stage;
use super::state::{EvaluationState, StatePatch};
use crate::config::{EvalConfig, LlmProvider};
use crate::evaluator::errors::{format_fatal_error, EvaluatorError, ErrorKind};
use crate::evaluator::TaskType;
use crate::history::EvaluationHistory;
use crate::llms::{GatewayFactory, ModelGateway};

/// Collaborators shared by the stages of one run.
///
/// The gateway is built on first use and reused for the rest of the run.
pub struct RunContext<'a> {
    gateways: &'a dyn GatewayFactory,
    provider: Option<LlmProvider>,
    gateway: OnceCell<Arc<dyn ModelGateway>>,
    config_dir: Option<&'a Path>,
    history: Option<&'a dyn EvaluationHistory>,
}

impl<'a> RunContext<'a> {
    pub fn new(gateways: &'a dyn GatewayFactory) -> Self {
        Self {
            gateways,
            provider: None,
            gateway: OnceCell::new(),
            config_dir: None,
            history: None,
        }
    }

    pub fn with_provider(mut self, provider: Option<LlmProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_config_dir(mut self, dir: Option<&'a Path>) -> Self {
        self.config_dir = dir;
        self
    }

    pub fn with_history(mut self, history: Option<&'a dyn EvaluationHistory>) -> Self {
        self.history = history;
        self
    }

    pub fn gateway(&self) -> Result<Arc<dyn ModelGateway>, EvaluatorError> {
        self.gateway
            .get_or_try_init(|| self.gateways.create(self.provider))
            .map(Arc::clone)
            .map_err(EvaluatorError::from)
    }

    pub fn history(&self) -> Option<&'a dyn EvaluationHistory> {
        self.history
    }

    /// Weights and grading scale for `task_type`; built-in defaults when the
    /// configured file is unusable.
    pub fn eval_config(&self, task_type: TaskType) -> EvalConfig {
        EvalConfig::load(self.config_dir, task_type).unwrap_or_else(|e| {
            log::warn!("Falling back to default {} config: {}", task_type.as_str(), e);
            EvalConfig::default_for(task_type)
        })
    }
}

/// Fatal errors become an abort patch; anything else yields `fallback`.
pub(crate) fn recover(stage: Stage, err: EvaluatorError, fallback: StatePatch) -> StatePatch {
    if err.kind() == ErrorKind::Fatal {
        log::error!("Fatal error in {}: {}", stage, err);
        return StatePatch::fatal(format_fatal_error(&err.to_string()));
    }
    log::warn!("Stage {} degraded: {}", stage, err);
    fallback
}

/// Run one stage against the current state.
pub async fn execute(stage: Stage, state: &EvaluationState, ctx: &RunContext<'_>) -> StatePatch {
    match stage {
        Stage::Route => router::route(state),
        Stage::Analyze => analyzer::analyze(state, ctx).await,
        Stage::AnalyzeSystem => analyzer::analyze_system(state, ctx).await,
        Stage::Score => scorer::score(state, ctx),
        Stage::RunOutput => output::run_output(state, ctx).await,
        Stage::JudgeOutput => output::judge_output(state, ctx).await,
        Stage::Improve => improver::improve(state, ctx).await,
        Stage::RunOptimized => output::run_optimized(state, ctx).await,
        Stage::JudgeOptimized => output::judge_optimized(state, ctx).await,
        Stage::MetaAudit => meta_auditor::meta_audit(state, ctx).await,
        Stage::BuildReport => report_builder::build_report(state, ctx).await,
        Stage::Followup => followup::followup(state, ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::llms::SettingsGatewayFactory;

    #[test]
    fn test_recover_classifies() {
        let fatal = recover(
            Stage::Analyze,
            EvaluatorError::Analysis { message: "rate limit reached".into() },
            StatePatch::message("fallback"),
        );
        assert!(fatal.fatal_error.unwrap().contains("Rate Limit"));

        let degraded = recover(
            Stage::Analyze,
            EvaluatorError::Analysis { message: "bad json".into() },
            StatePatch::message("fallback"),
        );
        assert!(degraded.fatal_error.is_none());
        assert_eq!(degraded.summary(), "fallback");
    }

    #[test]
    fn test_missing_key_gateway_is_fatal() {
        let factory = SettingsGatewayFactory::new(Settings::default());
        let ctx = RunContext::new(&factory);
        let err = ctx.gateway().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }
}
