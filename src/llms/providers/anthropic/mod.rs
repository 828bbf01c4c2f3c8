//! Anthropic Messages API adapter.
//!
//! JSON mode pre-fills the assistant turn with `{` so the model continues
//! a JSON object; the brace is put back in front of the reply.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::utils::{build_client, post_json_with_retry, TransportOptions};
use crate::evaluator::errors::GatewayError;
use crate::llms::{GatewayRequest, ModelGateway, StructuredMode};

const PROVIDER: &str = "Anthropic";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicGateway {
    pub model: String,
    api_key: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
    options: TransportOptions,
    client: reqwest::Client,
}

impl AnthropicGateway {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        max_tokens: u32,
        options: TransportOptions,
    ) -> Result<Self, GatewayError> {
        let client = build_client(PROVIDER, &options)?;
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: None,
            max_tokens,
            temperature: 0.0,
            options,
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn api_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string())
    }

    pub fn build_request_body(&self, request: &GatewayRequest) -> Value {
        let mut messages = vec![json!({"role": "user", "content": request.input})];
        if request.json_mode {
            messages.push(json!({"role": "assistant", "content": "{"}));
        }
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": messages,
        });
        if !request.instructions.is_empty() {
            body["system"] = Value::String(request.instructions.clone());
        }
        body
    }

    /// Concatenate the text blocks of a Messages API reply.
    pub fn parse_response(response: &Value, json_mode: bool) -> Result<String, GatewayError> {
        if response.get("type").and_then(|t| t.as_str()) == Some("error") {
            let message = response
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown Anthropic error");
            return Err(GatewayError::InvalidResponse {
                provider: PROVIDER.to_string(),
                message: message.to_string(),
            });
        }

        let blocks = response
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| GatewayError::InvalidResponse {
                provider: PROVIDER.to_string(),
                message: "reply has no content blocks".to_string(),
            })?;

        let text: String = blocks
            .iter()
            .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
            .collect();

        if response.get("stop_reason").and_then(|s| s.as_str()) == Some("max_tokens") {
            log::warn!("Anthropic reply hit max_tokens ({} chars)", text.len());
        }

        Ok(if json_mode { format!("{{{}", text) } else { text })
    }
}

#[async_trait]
impl ModelGateway for AnthropicGateway {
    fn provider(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn structured_mode(&self) -> StructuredMode {
        StructuredMode::NativeThenText
    }

    async fn invoke(&self, request: &GatewayRequest) -> Result<String, GatewayError> {
        let url = format!("{}/v1/messages", self.api_base_url());
        let body = self.build_request_body(request);
        log::debug!("Anthropic call: model={}, json_mode={}", self.model, request.json_mode);

        let response = post_json_with_retry(PROVIDER, &self.options, || {
            self.client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .header("content-type", "application/json")
                .json(&body)
        })
        .await?;

        Self::parse_response(&response, request.json_mode)
    }
}
