//! Anthropic Messages API client.

use super::{http_client, Completion, CompletionRequest, LlmClient};
use crate::error::{Result, ScholarError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const API_VERSION: &str = "2023-06-01";

/// Client for `POST /v1/messages`.
pub struct AnthropicClient {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            http: http_client(timeout)?,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

/// Concatenate the text blocks of a Messages API response.
fn parse_response(body: &str, requested_model: &str) -> Result<Completion> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| ScholarError::Llm(format!("Failed to parse Claude response: {}", e)))?;

    let text = response
        .content
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(ScholarError::Llm("Empty response from Claude".to_string()));
    }

    Ok(Completion {
        text,
        model: response.model.unwrap_or_else(|| requested_model.to_string()),
        input_tokens: response.usage.as_ref().map(|u| u.input_tokens),
        output_tokens: response.usage.as_ref().map(|u| u.output_tokens),
    })
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = serde_json::json!({
            "model": &self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": &request.system,
            "messages": [{ "role": "user", "content": &request.prompt }],
        });

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ScholarError::Llm(format!("Claude API error {}: {}", status, text)));
        }

        let completion = parse_response(&text, &self.model)?;
        debug!(
            "Claude completion: {} chars, usage in={:?} out={:?}",
            completion.text.len(),
            completion.input_tokens,
            completion.output_tokens
        );
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let body = r#"{
            "id": "msg_1",
            "model": "claude-sonnet-4-20250514",
            "content": [
                {"type": "text", "text": "Hello "},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "world"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        }"#;

        let completion = parse_response(body, "fallback").unwrap();
        assert_eq!(completion.text, "Hello world");
        assert_eq!(completion.model, "claude-sonnet-4-20250514");
        assert_eq!(completion.input_tokens, Some(12));
    }

    #[test]
    fn test_parse_response_rejects_empty() {
        let body = r#"{"content": []}"#;
        assert!(matches!(parse_response(body, "m"), Err(ScholarError::Llm(_))));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = AnthropicClient::new("k".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9999/");
        assert_eq!(client.base_url, "http://localhost:9999");
    }
}
