//! Model gateway layer.
//!
//! - [`ModelGateway`] - the one capability every stage talks to
//! - [`structured`] - schema-typed calls with a text-extraction fallback
//! - [`providers`] - HTTP adapters (Anthropic, Gemini, OpenAI-compatible)
//! - [`factory`] - builds the gateway for one request from [`Settings`](crate::config::Settings)

pub mod factory;
pub mod providers;
pub mod structured;

#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;

use crate::evaluator::errors::GatewayError;

pub use factory::{FixedGatewayFactory, GatewayFactory, SettingsGatewayFactory};
pub use structured::{extract_json, invoke_plain_text, invoke_structured};

/// How an adapter obtains JSON from its backend.
///
/// Chosen once when the adapter is built; callers never branch on the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredMode {
    /// Ask the backend for JSON natively, fall back to text extraction.
    NativeThenText,
    /// Always request plain text and extract the JSON from it.
    TextOnly,
}

/// One call: system-level instructions plus the user input.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    /// May be empty, in which case no system instruction is sent.
    pub instructions: String,
    pub input: String,
    /// Request a JSON-only reply where the backend supports it.
    pub json_mode: bool,
}

impl GatewayRequest {
    pub fn text(instructions: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            input: input.into(),
            json_mode: false,
        }
    }

    pub fn json(instructions: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            json_mode: true,
            ..Self::text(instructions, input)
        }
    }
}

/// A language-model backend.
///
/// Implementations are stateless per call, so one instance may be shared by
/// concurrent calls within a stage.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Provider name used in reports, e.g. `anthropic`.
    fn provider(&self) -> &str;

    fn model(&self) -> &str;

    fn structured_mode(&self) -> StructuredMode {
        StructuredMode::NativeThenText
    }

    /// Send one request and return the reply text.
    async fn invoke(&self, request: &GatewayRequest) -> Result<String, GatewayError>;
}
