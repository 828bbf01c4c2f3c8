//! Gateway construction.
//!
//! A request gets one gateway for its whole run. [`SettingsGatewayFactory`]
//! builds it from [`Settings`]; [`FixedGatewayFactory`] hands out a
//! pre-built instance (tests, embedding callers).

use std::sync::Arc;

use super::providers::utils::TransportOptions;
use super::providers::{AnthropicGateway, GeminiGateway, OpenAiGateway};
use super::ModelGateway;
use crate::config::{LlmProvider, Settings};
use crate::evaluator::errors::GatewayError;

pub trait GatewayFactory: Send + Sync {
    /// Build a gateway for `provider`, or the configured default when `None`.
    fn create(&self, provider: Option<LlmProvider>) -> Result<Arc<dyn ModelGateway>, GatewayError>;
}

pub struct SettingsGatewayFactory {
    settings: Settings,
}

impl SettingsGatewayFactory {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn transport(&self) -> TransportOptions {
        TransportOptions {
            timeout_secs: self.settings.request_timeout_secs,
            ..TransportOptions::default()
        }
    }
}

fn missing_key(provider: &str, var: &str) -> GatewayError {
    GatewayError::Config {
        message: format!("{} requires {}: invalid API key (not set)", provider, var),
    }
}

impl GatewayFactory for SettingsGatewayFactory {
    fn create(&self, provider: Option<LlmProvider>) -> Result<Arc<dyn ModelGateway>, GatewayError> {
        let provider = provider.unwrap_or(self.settings.provider);
        let s = &self.settings;
        let model = s.model_for(provider).to_string();
        log::info!("Creating {} gateway (model={})", provider.as_str(), model);

        let gateway: Arc<dyn ModelGateway> = match provider {
            LlmProvider::Anthropic => {
                let key = s
                    .anthropic_api_key
                    .clone()
                    .ok_or_else(|| missing_key("Anthropic", "ANTHROPIC_API_KEY"))?;
                Arc::new(AnthropicGateway::new(model, key, s.max_tokens, self.transport())?)
            }
            LlmProvider::Google => {
                let key = s
                    .google_api_key
                    .clone()
                    .ok_or_else(|| missing_key("Google", "GOOGLE_API_KEY"))?;
                Arc::new(GeminiGateway::new(model, key, s.max_tokens, self.transport())?)
            }
            LlmProvider::OpenAi => {
                let key = s
                    .openai_api_key
                    .clone()
                    .ok_or_else(|| missing_key("OpenAI", "OPENAI_API_KEY"))?;
                Arc::new(OpenAiGateway::new(
                    model,
                    Some(key),
                    s.openai_base_url.clone(),
                    s.max_tokens,
                    self.transport(),
                )?)
            }
            LlmProvider::Ollama => Arc::new(OpenAiGateway::ollama(
                model,
                &s.ollama_base_url,
                s.max_tokens,
                self.transport(),
            )?),
        };
        Ok(gateway)
    }
}

/// Always returns the same gateway, whatever provider is asked for.
pub struct FixedGatewayFactory(pub Arc<dyn ModelGateway>);

impl GatewayFactory for FixedGatewayFactory {
    fn create(&self, _provider: Option<LlmProvider>) -> Result<Arc<dyn ModelGateway>, GatewayError> {
        Ok(Arc::clone(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llms::scripted::ScriptedGateway;

    #[test]
    fn test_missing_key_is_fatal() {
        let factory = SettingsGatewayFactory::new(Settings::default());
        let err = factory.create(None).err().unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_builds_configured_provider() {
        let settings = Settings {
            provider: LlmProvider::Google,
            google_api_key: Some("g".into()),
            ..Settings::default()
        };
        let factory = SettingsGatewayFactory::new(settings);
        let gw = factory.create(None).unwrap();
        assert_eq!(gw.provider(), "google");
        assert_eq!(gw.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let factory = SettingsGatewayFactory::new(Settings::default());
        let gw = factory.create(Some(LlmProvider::Ollama)).unwrap();
        assert_eq!(gw.provider(), "ollama");
        assert_eq!(gw.model(), "qwen3:4b");
    }

    #[test]
    fn test_fixed_factory_shares_instance() {
        let factory = FixedGatewayFactory(Arc::new(ScriptedGateway::new()));
        let a = factory.create(None).unwrap();
        let b = factory.create(Some(LlmProvider::OpenAi)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
