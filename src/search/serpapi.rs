//! SerpAPI (Google organic results) provider.

use super::{SearchProvider, SearchResult};
use crate::error::{Result, ScholarError};
use crate::llm::http_client;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

pub struct SerpApiProvider {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl SerpApiProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            base_url: "https://serpapi.com".to_string(),
            http: http_client(timeout)?,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    date: Option<String>,
}

/// Parse a SerpAPI response body. Results without a link are skipped.
fn parse_response(body: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let response: SerpApiResponse = serde_json::from_str(body)
        .map_err(|e| ScholarError::Search(format!("Failed to parse SerpAPI response: {}", e)))?;

    if let Some(err) = response.error {
        // SerpAPI reports "no results" as an error string.
        if err.to_lowercase().contains("hasn't returned any results") {
            return Ok(Vec::new());
        }
        return Err(ScholarError::Search(format!("SerpAPI error: {}", err)));
    }

    Ok(response
        .organic_results
        .into_iter()
        .filter(|r| !r.link.trim().is_empty())
        .enumerate()
        .map(|(i, r)| {
            let position = r.position.unwrap_or(i as u32 + 1);
            let mut result = SearchResult::new("serpapi", position, &r.title, &r.link, &r.snippet);
            result.published = r.date;
            result
        })
        .take(limit)
        .collect())
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    fn name(&self) -> &str {
        "serpapi"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let num = limit.to_string();
        let resp = self
            .http
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ScholarError::Search(format!("SerpAPI error {}: {}", status, body)));
        }

        let results = parse_response(&body, limit)?;
        debug!("SerpAPI returned {} results", results.len());
        Ok(results)
    }
}
