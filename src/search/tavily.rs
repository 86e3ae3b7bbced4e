//! Tavily search provider.

use super::{SearchProvider, SearchResult};
use crate::error::{Result, ScholarError};
use crate::llm::http_client;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

pub struct TavilyProvider {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl TavilyProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            base_url: "https://api.tavily.com".to_string(),
            http: http_client(timeout)?,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    published_date: Option<String>,
}

fn parse_response(body: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let response: TavilyResponse = serde_json::from_str(body)
        .map_err(|e| ScholarError::Search(format!("Failed to parse Tavily response: {}", e)))?;

    Ok(response
        .results
        .into_iter()
        .filter(|r| !r.url.trim().is_empty())
        .take(limit)
        .enumerate()
        .map(|(i, r)| {
            let mut result = SearchResult::new("tavily", i as u32 + 1, &r.title, &r.url, &r.content);
            result.published = r.published_date;
            result.provider_score = r.score;
            result
        })
        .collect())
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        "tavily"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let body = serde_json::json!({
            "api_key": &self.api_key,
            "query": query,
            "max_results": limit,
            "search_depth": "basic",
        });

        let resp = self
            .http
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ScholarError::Search(format!("Tavily error {}: {}", status, text)));
        }

        let results = parse_response(&text, limit)?;
        debug!("Tavily returned {} results", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results_assigns_positions() {
        let body = r#"{
            "query": "photosynthesis",
            "results": [
                {"title": "Photosynthesis", "url": "https://www.britannica.com/science/photosynthesis", "content": "Photosynthesis, the process by which green plants...", "score": 0.98},
                {"title": "", "url": "", "content": "dropped"},
                {"title": "Light reactions", "url": "https://bio.example.edu/light", "content": "The light reactions", "published_date": "2024-01-01"}
            ]
        }"#;

        let results = parse_response(body, 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].position, 1);
        assert_eq!(results[1].position, 2);
        assert_eq!(results[1].published.as_deref(), Some("2024-01-01"));
        assert_eq!(results[0].provider_score, Some(0.98));
        assert_eq!(results[1].provider_score, None);
        assert_eq!(results[0].score, 0.0);
    }

    #[test]
    fn test_parse_missing_results_field() {
        assert!(parse_response("{}", 5).unwrap().is_empty());
    }
}
