//! Multi-run executor: one prompt, `n` concurrent generations.
//!
//! Runs never fail the batch. A failed run is kept in its slot as an
//! `[Error: ...]` placeholder so run numbering stays stable.

use futures::future::join_all;

use crate::evaluator::errors::EvaluatorError;
use crate::llms::{GatewayRequest, ModelGateway};

const ERROR_PREFIX: &str = "[Error:";
const EMPTY_RESPONSE: &str = "[Empty response]";

/// Raw outputs in run order plus the display summary.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRunOutput {
    pub outputs: Vec<String>,
    pub summary: String,
}

impl MultiRunOutput {
    fn from_outputs(outputs: Vec<String>) -> Self {
        let summary = if !outputs.is_empty() && outputs.iter().all(|o| is_error_placeholder(o)) {
            outputs[0].clone()
        } else {
            format_multi_output(&outputs)
        };
        Self { outputs, summary }
    }

    pub fn failures(&self) -> usize {
        self.outputs.iter().filter(|o| is_error_placeholder(o)).count()
    }

    pub fn all_failed(&self) -> bool {
        !self.outputs.is_empty() && self.failures() == self.outputs.len()
    }

    /// Partial-batch error describing the failed runs, if any.
    pub fn batch_error(&self) -> Option<EvaluatorError> {
        let failed = self.failures();
        (failed > 0).then(|| EvaluatorError::Batch {
            failed,
            total: self.outputs.len(),
        })
    }
}

pub fn is_error_placeholder(output: &str) -> bool {
    output.starts_with(ERROR_PREFIX)
}

/// Label runs as `--- Run k ---` blocks; a single output is returned bare.
pub fn format_multi_output(outputs: &[String]) -> String {
    if outputs.len() == 1 {
        return outputs[0].clone();
    }
    outputs
        .iter()
        .enumerate()
        .map(|(i, output)| format!("--- Run {} ---\n{}", i + 1, output))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Execute `prompt` `runs` times concurrently against `gateway`.
pub async fn run_n_times(gateway: &dyn ModelGateway, prompt: &str, runs: usize) -> MultiRunOutput {
    let request = GatewayRequest::text("", prompt);
    let calls = (0..runs.max(1)).map(|_| gateway.invoke(&request));

    let outputs: Vec<String> = join_all(calls)
        .await
        .into_iter()
        .enumerate()
        .map(|(i, result)| match result {
            Ok(text) if text.trim().is_empty() => EMPTY_RESPONSE.to_string(),
            Ok(text) => text,
            Err(e) => {
                log::warn!("Run {} of {} failed: {}", i + 1, runs, e);
                format!("[Error: {}]", e)
            }
        })
        .collect();

    let output = MultiRunOutput::from_outputs(outputs);
    if let Some(err) = output.batch_error() {
        log::warn!("{} ({:?})", err, err.kind());
    }
    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::errors::ErrorKind;
    use crate::llms::scripted::ScriptedGateway;

    #[tokio::test]
    async fn test_one_failure_in_three() {
        let gateway = ScriptedGateway::new()
            .on("", "first")
            .fail_on("", "model overloaded")
            .on("", "third");
        let out = run_n_times(&gateway, "Tell me a joke", 3).await;

        assert_eq!(out.outputs.len(), 3);
        let errors: Vec<&String> = out.outputs.iter().filter(|o| is_error_placeholder(o)).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("model overloaded"));
        let ok: Vec<&String> = out.outputs.iter().filter(|o| !is_error_placeholder(o)).collect();
        assert_eq!(ok.len(), 2);
        assert!(ok.iter().all(|o| *o == "first" || *o == "third"));
        assert!(out.summary.contains("--- Run 3 ---"));
        assert_eq!(out.batch_error().unwrap().kind(), ErrorKind::PartialBatch);
    }

    #[tokio::test]
    async fn test_single_run_is_bare() {
        let gateway = ScriptedGateway::new().on("", "only output");
        let out = run_n_times(&gateway, "p", 1).await;
        assert_eq!(out.summary, "only output");
        assert!(out.batch_error().is_none());
    }

    #[tokio::test]
    async fn test_all_failed_summary_is_first_error() {
        let gateway = ScriptedGateway::new().fail_on("", "Connection refused");
        let out = run_n_times(&gateway, "p", 2).await;
        assert!(out.all_failed());
        assert_eq!(out.summary, out.outputs[0]);
        assert!(out.summary.starts_with("[Error: scripted request failed: Connection refused"));
    }

    #[tokio::test]
    async fn test_empty_reply_placeholder() {
        let gateway = ScriptedGateway::new().on("", "  ");
        let out = run_n_times(&gateway, "p", 1).await;
        assert_eq!(out.outputs, vec!["[Empty response]".to_string()]);
    }

    #[test]
    fn test_format_labels_runs() {
        let text = format_multi_output(&["a".to_string(), "b".to_string()]);
        assert_eq!(text, "--- Run 1 ---\na\n\n--- Run 2 ---\nb");
    }
}
