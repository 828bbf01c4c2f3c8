//! Runtime settings read from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::pipeline::MAX_EXECUTION_COUNT;

/// Model backend used for every gateway call of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    Google,
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Google => "google",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Ollama => "ollama",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            "google" | "gemini" => Ok(LlmProvider::Google),
            "openai" => Ok(LlmProvider::OpenAi),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::Invalid {
                message: format!("unknown LLM provider '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub provider: LlmProvider,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub google_api_key: Option<String>,
    pub google_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub request_timeout_secs: f64,
    pub max_tokens: u32,
    /// Runs per prompt in the multi-run executor (1..=5).
    pub execution_count: usize,
    pub config_dir: Option<PathBuf>,
    pub history_db: Option<PathBuf>,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            anthropic_api_key: None,
            anthropic_model: "claude-sonnet-4-20250514".to_string(),
            google_api_key: None,
            google_model: "gemini-2.5-flash".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "qwen3:4b".to_string(),
            request_timeout_secs: 120.0,
            max_tokens: 16_384,
            execution_count: 2,
            config_dir: None,
            history_db: None,
            server_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(provider) = get("LLM_PROVIDER") {
            settings.provider = provider.parse()?;
        }
        settings.anthropic_api_key = get("ANTHROPIC_API_KEY");
        settings.google_api_key = get("GOOGLE_API_KEY");
        settings.openai_api_key = get("OPENAI_API_KEY");
        if let Some(v) = get("ANTHROPIC_MODEL") {
            settings.anthropic_model = v;
        }
        if let Some(v) = get("GOOGLE_MODEL") {
            settings.google_model = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            settings.openai_model = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            settings.openai_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("OLLAMA_BASE_URL") {
            settings.ollama_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("OLLAMA_MODEL") {
            settings.ollama_model = v;
        }
        if let Some(v) = get("LLM_REQUEST_TIMEOUT") {
            settings.request_timeout_secs = v.parse().map_err(|_| ConfigError::Invalid {
                message: format!("LLM_REQUEST_TIMEOUT is not a number: {}", v),
            })?;
        }
        if let Some(v) = get("EVAL_EXECUTION_COUNT") {
            let count: usize = v.parse().map_err(|_| ConfigError::Invalid {
                message: format!("EVAL_EXECUTION_COUNT is not an integer: {}", v),
            })?;
            settings.execution_count = count.clamp(1, MAX_EXECUTION_COUNT);
        }
        settings.config_dir = get("EVAL_CONFIG_DIR").map(PathBuf::from);
        settings.history_db = get("EVAL_HISTORY_DB").map(PathBuf::from);
        if let Some(v) = get("SERVER_ADDR") {
            settings.server_addr = v;
        }
        Ok(settings)
    }

    /// Model name of the configured provider.
    pub fn model_for(&self, provider: LlmProvider) -> &str {
        match provider {
            LlmProvider::Anthropic => &self.anthropic_model,
            LlmProvider::Google => &self.google_model,
            LlmProvider::OpenAi => &self.openai_model,
            LlmProvider::Ollama => &self.ollama_model,
        }
    }
}
