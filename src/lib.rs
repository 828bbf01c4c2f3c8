//! # prompt-evaluator
//!
//! Evaluates prompts and system prompts against the T.C.R.E.I. rubric,
//! runs them through a language model, judges the output, proposes an
//! improved rewrite and audits the whole evaluation.
//!
//! The entry point is [`Pipeline`]: build one with a
//! [`GatewayFactory`](llms::GatewayFactory), then
//! [`run`](Pipeline::run) an [`EvaluationState`] through the stage graph.
//!
//! ```no_run
//! use std::sync::Arc;
//! use prompt_evaluator::{config::Settings, llms::SettingsGatewayFactory, EvaluationState, Pipeline};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let factory = SettingsGatewayFactory::new(Settings::from_env()?);
//! let pipeline = Pipeline::new(Arc::new(factory));
//! let outcome = pipeline.run(EvaluationState::new("Write me something about dogs"), None).await;
//! println!("{}/100", outcome.state().overall_score);
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod config;
pub mod evaluator;
pub mod history;
pub mod improver;
pub mod llms;
pub mod pipeline;
pub mod prompts;
pub mod runner;
pub mod scoring;
pub mod server;

pub use config::{EvaluationStrategy, Settings, StrategyConfig};
pub use evaluator::errors::{ErrorKind, EvaluatorError, GatewayError};
pub use evaluator::{EvalMode, EvalPhase, FullEvaluationReport, Grade, TaskType};
pub use pipeline::{EvaluationState, Outcome, Pipeline, ProgressEvent, Stage};

/// Crate version, reported by `GET /health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
