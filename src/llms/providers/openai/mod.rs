//! OpenAI-compatible chat completions adapter.
//!
//! Also serves Ollama through its `/v1` compatibility endpoint, where no
//! API key is sent.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::utils::{build_client, post_json_with_retry, TransportOptions};
use crate::evaluator::errors::GatewayError;
use crate::llms::{GatewayRequest, ModelGateway, StructuredMode};

pub struct OpenAiGateway {
    provider: String,
    label: String,
    pub model: String,
    api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f64,
    options: TransportOptions,
    client: reqwest::Client,
}

impl OpenAiGateway {
    pub fn new(
        model: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
        max_tokens: u32,
        options: TransportOptions,
    ) -> Result<Self, GatewayError> {
        let client = build_client("OpenAI", &options)?;
        Ok(Self {
            provider: "openai".to_string(),
            label: "OpenAI".to_string(),
            model: model.into(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_tokens,
            temperature: 0.0,
            options,
            client,
        })
    }

    /// Adapter for a local Ollama server at `ollama_base_url`.
    pub fn ollama(
        model: impl Into<String>,
        ollama_base_url: &str,
        max_tokens: u32,
        options: TransportOptions,
    ) -> Result<Self, GatewayError> {
        let base = format!("{}/v1", ollama_base_url.trim_end_matches('/'));
        let mut gateway = Self::new(model, None, base, max_tokens, options)?;
        gateway.provider = "ollama".to_string();
        gateway.label = "Ollama".to_string();
        Ok(gateway)
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn build_request_body(&self, request: &GatewayRequest) -> Value {
        let mut messages = Vec::new();
        if !request.instructions.is_empty() {
            messages.push(json!({"role": "system", "content": request.instructions}));
        }
        messages.push(json!({"role": "user", "content": request.input}));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        if request.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }
        body
    }

    pub fn parse_response(&self, response: &Value) -> Result<String, GatewayError> {
        if let Some(message) = response.pointer("/error/message").and_then(|m| m.as_str()) {
            return Err(GatewayError::InvalidResponse {
                provider: self.label.clone(),
                message: message.to_string(),
            });
        }
        response
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| GatewayError::InvalidResponse {
                provider: self.label.clone(),
                message: "reply has no message content".to_string(),
            })
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn structured_mode(&self) -> StructuredMode {
        StructuredMode::NativeThenText
    }

    async fn invoke(&self, request: &GatewayRequest) -> Result<String, GatewayError> {
        let url = self.endpoint();
        let body = self.build_request_body(request);
        log::debug!("{} call: model={}, json_mode={}", self.label, self.model, request.json_mode);

        let response = post_json_with_retry(&self.label, &self.options, || {
            let builder = self.client.post(&url).json(&body);
            match &self.api_key {
                Some(key) => builder.bearer_auth(key),
                None => builder,
            }
        })
        .await?;

        self.parse_response(&response)
    }
}
