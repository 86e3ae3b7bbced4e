//! OpenAI chat completions backend.

use super::{http_client, Completion, CompletionRequest, LlmClient};
use crate::error::{Result, ScholarError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based LLM client.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    /// Create a client with an explicit key and request timeout.
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config).with_http_client(http_client(timeout)?);

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| ScholarError::Llm(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.clone())
                .build()
                .map_err(|e| ScholarError::Llm(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens)
            .build()
            .map_err(|e| ScholarError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| ScholarError::Llm(format!("OpenAI API error: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ScholarError::Llm("Empty response from OpenAI".to_string()))?
            .clone();

        debug!("OpenAI completion: {} chars", text.len());

        Ok(Completion {
            text,
            model: response.model,
            input_tokens: response.usage.as_ref().map(|u| u.prompt_tokens as u64),
            output_tokens: response.usage.as_ref().map(|u| u.completion_tokens as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenAiClient::new("sk-test", "gpt-4o-mini", Duration::from_secs(30)).unwrap();
        assert_eq!(client.name(), "openai");
        assert_eq!(client.model(), "gpt-4o-mini");
    }
}
