//! Hosted LLM clients.
//!
//! Everything Scholar generates goes through a single-turn completion:
//! a system prompt, a user prompt, and the text that comes back.

mod anthropic;
mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use crate::config::{LlmProvider, LlmSettings};
use crate::error::{Result, ScholarError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A single-turn completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Text returned by a completion, with usage when the provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// Trait for hosted LLM backends.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name, for logs and responses.
    fn name(&self) -> &str;

    /// Model used for completions.
    fn model(&self) -> &str;

    /// Run a single-turn completion.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Build the configured LLM client, optionally overriding the model.
pub fn create_client(settings: &LlmSettings, model: Option<&str>) -> Result<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(settings.timeout_seconds);
    let model = model.unwrap_or_else(|| settings.model()).to_string();

    let key = settings.api_key().ok_or_else(|| {
        let var = settings.key_env();
        ScholarError::Config(format!(
            "{} not set. Set it with: export {}='...' (provider: {})",
            var, var, settings.provider
        ))
    })?;

    match settings.provider {
        LlmProvider::Anthropic => Ok(Arc::new(
            AnthropicClient::new(key, timeout)?
                .with_model(&model)
                .with_base_url(&settings.anthropic_base_url),
        )),
        LlmProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(&key, &model, timeout)?)),
    }
}

/// Build the shared reqwest client used by every outbound integration.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("scholar/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ScholarError::Http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let settings = LlmSettings {
            provider: LlmProvider::OpenAi,
            openai_api_key: Some(" ".to_string()),
            api_key_env: Some("SCHOLAR_TEST_UNSET_LLM_KEY".to_string()),
            ..LlmSettings::default()
        };
        let err = create_client(&settings, None).err().unwrap();
        assert!(matches!(err, ScholarError::Config(_)));
        assert!(err.to_string().contains("SCHOLAR_TEST_UNSET_LLM_KEY"));
    }

    #[test]
    fn test_model_override() {
        let settings = LlmSettings {
            anthropic_api_key: Some("sk-ant-test".to_string()),
            ..LlmSettings::default()
        };
        let client = create_client(&settings, Some("claude-3-5-haiku-latest")).unwrap();
        assert_eq!(client.name(), "anthropic");
        assert_eq!(client.model(), "claude-3-5-haiku-latest");
    }
}
