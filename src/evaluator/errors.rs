//! Error taxonomy for the evaluation pipeline.
//!
//! Stages never let errors cross their boundary. Every failure is
//! classified into an [`ErrorKind`]: provider-level failures are
//! [`ErrorKind::Fatal`] and abort the run, everything else degrades the
//! stage to a safe default.

use thiserror::Error;

/// How the scheduler treats a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Provider outage, credentials, billing, quota or rate limit. Aborts the run.
    Fatal,
    /// Parse or content failure. The stage falls back to defaults.
    Recoverable,
    /// One unit of a concurrent fan-out failed; siblings are kept.
    PartialBatch,
}

/// Signatures of provider-level failures, matched case-insensitively as substrings.
pub const FATAL_PATTERNS: &[&str] = &[
    // Anthropic
    "credit balance is too low",
    "invalid x-api-key",
    "invalid api key",
    "authentication error",
    "permission denied",
    "billing",
    // Google
    "quota exceeded",
    "resource exhausted",
    "permission_denied",
    "403 forbidden",
    "401 unauthorized",
    "service account",
    "credentials",
    "could not automatically determine credentials",
    // Ollama
    "model not found",
    "connection refused",
    "failed to connect",
    // Any provider
    "rate limit",
    "too many requests",
];

const ERROR_EXCERPT_CHARS: usize = 500;

/// Errors raised by a model gateway adapter.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Non-success HTTP status after retries were exhausted or not applicable.
    #[error("{provider} API error ({status}): {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response.
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    /// The response could not be interpreted.
    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse { provider: String, message: String },

    /// The adapter could not be constructed.
    #[error("Gateway configuration error: {message}")]
    Config { message: String },
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        classify(&self.to_string())
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

/// Domain errors raised inside stages.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Prompt analysis failed: {message}")]
    Analysis { message: String },

    #[error("Scoring computation failed: {message}")]
    Scoring { message: String },

    #[error("Improvement generation failed: {message}")]
    Improvement { message: String },

    #[error("Output evaluation failed: {message}")]
    OutputEvaluation { message: String },

    #[error("Report assembly failed: {message}")]
    ReportBuild { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Meta-evaluation failed: {message}")]
    MetaEvaluation { message: String },

    #[error("Strategy error: {message}")]
    Strategy { message: String },

    /// `failed` of `total` concurrent units failed.
    #[error("{failed} of {total} runs failed")]
    Batch { failed: usize, total: usize },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl EvaluatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvaluatorError::Gateway(e) => e.kind(),
            EvaluatorError::Batch { .. } => ErrorKind::PartialBatch,
            other => classify(&other.to_string()),
        }
    }
}

/// True when `message` matches one of [`FATAL_PATTERNS`].
pub fn is_fatal_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    FATAL_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Fatal or recoverable, by message signature.
pub fn classify(message: &str) -> ErrorKind {
    if is_fatal_message(message) {
        ErrorKind::Fatal
    } else {
        ErrorKind::Recoverable
    }
}

/// Turn a fatal provider error into a categorized message with remediation hints.
///
/// The original error text is embedded (truncated) so it can be surfaced verbatim.
pub fn format_fatal_error(message: &str) -> String {
    let lower = message.to_lowercase();
    let excerpt: String = message.chars().take(ERROR_EXCERPT_CHARS).collect();

    if lower.contains("credit balance") || lower.contains("billing") {
        return format!(
            "**LLM Provider Error: Insufficient Credits**\n\n\
             The LLM API returned a billing error. Check the plan and billing \
             settings of your provider account.\n\n```\n{excerpt}\n```"
        );
    }
    if lower.contains("api key")
        || lower.contains("api_key")
        || lower.contains("x-api-key")
        || lower.contains("authentication")
    {
        return format!(
            "**LLM Provider Error: Invalid API Key**\n\n\
             The API key is missing or invalid. Check the environment:\n\
             - `ANTHROPIC_API_KEY` for Anthropic\n\
             - `GOOGLE_API_KEY` for Google Gemini\n\
             - `OPENAI_API_KEY` for OpenAI\n\n```\n{excerpt}\n```"
        );
    }
    if lower.contains("quota") || lower.contains("rate limit") || lower.contains("too many requests") {
        return format!(
            "**LLM Provider Error: Quota / Rate Limit Exceeded**\n\n\
             The API rate limit or quota has been exceeded. Wait a moment and \
             try again, or switch providers.\n\n```\n{excerpt}\n```"
        );
    }
    if lower.contains("model not found") {
        return format!(
            "**Ollama Error: Model Not Found**\n\n\
             The requested model is not available in your Ollama instance. \
             Pull it with:\n```\nollama pull <model-name>\n```\n\n```\n{excerpt}\n```"
        );
    }
    if lower.contains("connection refused") || lower.contains("failed to connect") {
        return format!(
            "**Ollama Error: Connection Refused**\n\n\
             Cannot connect to the model server. Make sure it is running and \
             that `OLLAMA_BASE_URL` is correct (default: `http://localhost:11434`).\n\n\
             ```\n{excerpt}\n```"
        );
    }
    if lower.contains("credentials") || lower.contains("service account") || lower.contains("permission") {
        return format!(
            "**LLM Provider Error: Credentials / Permissions**\n\n\
             The credentials are missing or lack the required permissions.\n\n\
             ```\n{excerpt}\n```"
        );
    }
    format!(
        "**LLM Provider Error**\n\n\
         The LLM API call failed with a provider-level error. Check your \
         configuration and try again.\n\n```\n{excerpt}\n```"
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_patterns_match_case_insensitively() {
        assert!(is_fatal_message("Your credit balance is too low to access the API"));
        assert!(is_fatal_message("HTTP 401 Unauthorized"));
        assert!(is_fatal_message("Rate limited by Anthropic API (429)"));
        assert!(is_fatal_message("tcp connect error: Connection refused (os error 111)"));
        assert!(!is_fatal_message("expected value at line 1 column 1"));
    }

    #[test]
    fn test_gateway_error_kind() {
        let err = GatewayError::Http {
            provider: "Anthropic".into(),
            status: 401,
            body: r#"{"error":{"message":"invalid x-api-key"}}"#.into(),
        };
        assert_eq!(err.kind(), ErrorKind::Fatal);

        let err = GatewayError::InvalidResponse {
            provider: "Gemini".into(),
            message: "no candidates".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Recoverable);
    }

    #[test]
    fn test_evaluator_error_kind() {
        let err = EvaluatorError::Analysis { message: "bad json".into() };
        assert_eq!(err.kind(), ErrorKind::Recoverable);
        assert_eq!(EvaluatorError::Batch { failed: 1, total: 3 }.kind(), ErrorKind::PartialBatch);

        let err: EvaluatorError = GatewayError::Config {
            message: "invalid api key: ANTHROPIC_API_KEY is not set".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_format_fatal_error_categories() {
        assert!(format_fatal_error("credit balance is too low").contains("Insufficient Credits"));
        assert!(format_fatal_error("invalid x-api-key").contains("Invalid API Key"));
        assert!(format_fatal_error("Too Many Requests").contains("Quota / Rate Limit"));
        assert!(format_fatal_error("model not found: qwen3").contains("Model Not Found"));
        assert!(format_fatal_error("failed to connect").contains("Connection Refused"));
        assert!(format_fatal_error("service account missing").contains("Credentials / Permissions"));
        assert!(format_fatal_error("something odd").starts_with("**LLM Provider Error**"));
    }

    #[test]
    fn test_format_fatal_error_truncates_excerpt() {
        let long = format!("billing {}", "x".repeat(2_000));
        let formatted = format_fatal_error(&long);
        let kept = 500 - "billing ".len();
        assert!(formatted.contains(&"x".repeat(kept)));
        assert!(!formatted.contains(&"x".repeat(kept + 1)));
    }
}
