//! Progress events emitted by the scheduler.
//!
//! Advisory only: the run behaves the same whether or not anyone listens.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::stage::Stage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    StageStarted { stage: Stage },
    StageFinished { stage: Stage, summary: String },
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// Send `event` if a listener is attached. A closed channel is ignored.
pub(crate) fn emit(sender: Option<&ProgressSender>, event: ProgressEvent) {
    if let Some(tx) = sender {
        if tx.send(event).is_err() {
            log::debug!("Progress listener dropped");
        }
    }
}
