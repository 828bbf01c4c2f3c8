//! Evaluation pipeline: state, stage graph, scheduler and stage implementations.

pub mod events;
pub mod scheduler;
pub mod stage;
pub mod stages;
pub mod state;

pub use events::{ProgressEvent, ProgressSender};
pub use scheduler::{Outcome, Pipeline, MAX_STAGE_EXECUTIONS};
pub use stage::Stage;
pub use stages::RunContext;
pub use state::{EvaluationState, StatePatch, DEFAULT_EXECUTION_COUNT, MAX_EXECUTION_COUNT};
