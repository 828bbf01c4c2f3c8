//! Typed calls over a [`ModelGateway`].
//!
//! Parse failures are never errors: they come back as `Ok(None)` and the
//! caller substitutes its default. Fatal provider failures are returned as
//! `Err` so the stage can abort the run.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use super::{GatewayRequest, ModelGateway, StructuredMode};
use crate::evaluator::errors::GatewayError;

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:json)?\s*\n?(.*?)```").unwrap());
static BRACED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Pull a JSON document out of free text: a fenced block first, then the
/// outermost braces, else the trimmed text itself.
pub fn extract_json(content: &str) -> &str {
    if let Some(inner) = FENCED_JSON.captures(content).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }
    if let Some(m) = BRACED.find(content) {
        return m.as_str().trim();
    }
    content.trim()
}

fn parse_non_default<T>(json: &str) -> Option<T>
where
    T: DeserializeOwned + Default + PartialEq,
{
    match serde_json::from_str::<T>(json) {
        Ok(value) if value != T::default() => Some(value),
        Ok(_) => {
            log::warn!("Structured reply parsed to all-default values");
            None
        }
        Err(e) => {
            log::warn!("JSON parsing failed (length={}): {}", json.len(), e);
            None
        }
    }
}

/// Propagate fatal errors, swallow the rest as "no result".
fn escalate_fatal(err: GatewayError, phase: &str) -> Result<(), GatewayError> {
    if err.is_fatal() {
        log::error!("Fatal gateway error during {}: {}", phase, err);
        return Err(err);
    }
    log::warn!("Gateway call failed during {}: {}", phase, err);
    Ok(())
}

/// Invoke the gateway and parse the reply as `T`.
///
/// `NativeThenText` adapters are first asked for JSON directly; when that
/// reply does not parse (or parses to `T::default()`), one more call is made
/// in text mode and the JSON is extracted from the prose. `TextOnly`
/// adapters go straight to the text path.
pub async fn invoke_structured<T>(
    gateway: &dyn ModelGateway,
    instructions: &str,
    input: &str,
) -> Result<Option<T>, GatewayError>
where
    T: DeserializeOwned + Default + PartialEq,
{
    if gateway.structured_mode() == StructuredMode::NativeThenText {
        match gateway.invoke(&GatewayRequest::json(instructions, input)).await {
            Ok(reply) => {
                if let Some(value) = parse_non_default::<T>(reply.trim()) {
                    return Ok(Some(value));
                }
                log::debug!("Native JSON reply unusable, retrying with text extraction");
            }
            Err(e) => escalate_fatal(e, "native structured call")?,
        }
    }

    match gateway.invoke(&GatewayRequest::text(instructions, input)).await {
        Ok(reply) => {
            if reply.trim().is_empty() {
                log::warn!("Empty text reply from {}", gateway.provider());
                return Ok(None);
            }
            let trimmed = reply.trim_end();
            if !trimmed.ends_with(['}', ']', '`']) {
                log::warn!(
                    "Reply appears truncated (length={}); consider raising the max token limit",
                    reply.len()
                );
            }
            Ok(parse_non_default::<T>(extract_json(&reply)))
        }
        Err(e) => {
            escalate_fatal(e, "text structured call")?;
            Ok(None)
        }
    }
}

/// Invoke the gateway for free text. Empty replies and non-fatal failures give `None`.
pub async fn invoke_plain_text(
    gateway: &dyn ModelGateway,
    instructions: &str,
    input: &str,
) -> Result<Option<String>, GatewayError> {
    match gateway.invoke(&GatewayRequest::text(instructions, input)).await {
        Ok(reply) => {
            let trimmed = reply.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Err(e) => {
            escalate_fatal(e, "plain text call")?;
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::schemas::{AnalysisReply, ImprovementsReply};
    use crate::llms::scripted::ScriptedGateway;

    #[test]
    fn test_extract_json_prefers_fenced_block() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nand {\"b\": 2}";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_outer_braces() {
        let text = "Sure! {\"a\": {\"b\": 2}} Hope that helps.";
        assert_eq!(extract_json(text), "{\"a\": {\"b\": 2}}");
        assert_eq!(extract_json("  plain  "), "plain");
    }

    #[tokio::test]
    async fn test_native_success_uses_one_call() {
        let gateway = ScriptedGateway::new()
            .on("", r#"{"improvements":[{"priority":"HIGH","title":"t","suggestion":"s"}]}"#);
        let reply: Option<ImprovementsReply> =
            invoke_structured(&gateway, "improve", "input").await.unwrap();
        assert_eq!(reply.unwrap().improvements.len(), 1);
        assert_eq!(gateway.calls(), 1);
        assert!(gateway.requests()[0].json_mode);
    }

    #[tokio::test]
    async fn test_falls_back_to_text_extraction() {
        let gateway = ScriptedGateway::new()
            .on("", "not json at all")
            .on("", "Result:\n```json\n{\"dimensions\":{\"task\":{\"score\":55}}}\n```");
        let reply: Option<AnalysisReply> =
            invoke_structured(&gateway, "analyze", "input").await.unwrap();
        assert_eq!(reply.unwrap().dimensions["task"].score, 55);
        assert_eq!(gateway.calls(), 2);
        assert!(!gateway.requests()[1].json_mode);
    }

    #[tokio::test]
    async fn test_all_default_reply_counts_as_failure() {
        let gateway = ScriptedGateway::new().on("", "{}");
        let reply: Option<AnalysisReply> =
            invoke_structured(&gateway, "analyze", "input").await.unwrap();
        assert!(reply.is_none());
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_text_only_adapter_skips_native_call() {
        let gateway = ScriptedGateway::new()
            .text_only()
            .on("", "{\"dimensions\":{\"task\":{\"score\":10}}}");
        let reply: Option<AnalysisReply> =
            invoke_structured(&gateway, "analyze", "input").await.unwrap();
        assert!(reply.is_some());
        assert_eq!(gateway.calls(), 1);
        assert!(!gateway.requests()[0].json_mode);
    }

    #[tokio::test]
    async fn test_fatal_error_propagates() {
        let gateway = ScriptedGateway::new().fail_on("", "Anthropic API error (401): invalid x-api-key");
        let result: Result<Option<AnalysisReply>, _> =
            invoke_structured(&gateway, "analyze", "input").await;
        assert!(result.unwrap_err().is_fatal());
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_recoverable_error_becomes_none() {
        let gateway = ScriptedGateway::new().fail_on("", "Anthropic API error (400): prompt is malformed");
        let result: Option<AnalysisReply> =
            invoke_structured(&gateway, "analyze", "input").await.unwrap();
        assert!(result.is_none());
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_plain_text_trims_and_handles_empty() {
        let gateway = ScriptedGateway::new().on("", "  rewritten  \n").on("", "   ");
        assert_eq!(
            invoke_plain_text(&gateway, "i", "x").await.unwrap().as_deref(),
            Some("rewritten")
        );
        assert_eq!(invoke_plain_text(&gateway, "i", "x").await.unwrap(), None);
    }
}
