//! Google Gemini `generateContent` adapter.
//!
//! Gemini's JSON mode rejects some of the nested reply shapes used here,
//! so the adapter always asks for text and lets the caller extract JSON.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::utils::{build_client, post_json_with_retry, TransportOptions};
use crate::evaluator::errors::GatewayError;
use crate::llms::{GatewayRequest, ModelGateway, StructuredMode};

const PROVIDER: &str = "Google";

pub struct GeminiGateway {
    pub model: String,
    api_key: String,
    pub base_url: Option<String>,
    pub max_output_tokens: u32,
    pub temperature: f64,
    options: TransportOptions,
    client: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        max_output_tokens: u32,
        options: TransportOptions,
    ) -> Result<Self, GatewayError> {
        let client = build_client(PROVIDER, &options)?;
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: None,
            max_output_tokens,
            temperature: 0.0,
            options,
            client,
        })
    }

    pub fn api_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base_url(), self.model)
    }

    pub fn build_request_body(&self, request: &GatewayRequest) -> Value {
        let mut body = json!({
            "contents": [{"role": "user", "parts": [{"text": request.input}]}],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
            },
        });
        if !request.instructions.is_empty() {
            body["systemInstruction"] = json!({"parts": [{"text": request.instructions}]});
        }
        body
    }

    pub fn parse_response(response: &Value) -> Result<String, GatewayError> {
        if let Some(message) = response.pointer("/error/message").and_then(|m| m.as_str()) {
            return Err(GatewayError::InvalidResponse {
                provider: PROVIDER.to_string(),
                message: message.to_string(),
            });
        }

        let parts = response
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())
            .ok_or_else(|| {
                let reason = response
                    .pointer("/promptFeedback/blockReason")
                    .and_then(|r| r.as_str())
                    .unwrap_or("no candidates");
                GatewayError::InvalidResponse {
                    provider: PROVIDER.to_string(),
                    message: format!("reply has no content ({})", reason),
                }
            })?;

        Ok(parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect())
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    fn provider(&self) -> &str {
        "google"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn structured_mode(&self) -> StructuredMode {
        StructuredMode::TextOnly
    }

    async fn invoke(&self, request: &GatewayRequest) -> Result<String, GatewayError> {
        let url = self.endpoint();
        let body = self.build_request_body(request);
        log::debug!("Gemini call: model={}", self.model);

        let response = post_json_with_retry(PROVIDER, &self.options, || {
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(&body)
        })
        .await?;

        Self::parse_response(&response)
    }
}
