//! Web search across hosted providers.
//!
//! Each provider returns ranked results; the [`SearchOrchestrator`] merges
//! them, removes duplicates by normalized URL and re-ranks with a relevance
//! heuristic.

mod normalize;
mod orchestrator;
mod serpapi;
mod tavily;

pub use normalize::{host_of, normalize_url};
pub use orchestrator::{SearchOrchestrator, SearchReport};
pub use serpapi::SerpApiProvider;
pub use tavily::TavilyProvider;

use crate::config::SearchSettings;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A single search hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Provider that first returned this result.
    pub source: String,
    /// Every provider that returned this URL.
    #[serde(default)]
    pub sources: Vec<String>,
    /// 1-based rank within the provider's list (best rank after merging).
    pub position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// The provider's own relevance score, when it reports one (Tavily).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_score: Option<f32>,
    /// Relevance score assigned by the orchestrator.
    #[serde(default)]
    pub score: f32,
}

impl SearchResult {
    pub fn new(source: &str, position: u32, title: &str, url: &str, snippet: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            url: url.trim().to_string(),
            snippet: snippet.trim().to_string(),
            source: source.to_string(),
            sources: vec![source.to_string()],
            position,
            published: None,
            provider_score: None,
            score: 0.0,
        }
    }
}

/// Trait for web search backends.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name used in results and logs.
    fn name(&self) -> &str;

    /// Run a query and return up to `limit` results in provider rank order.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

/// Build the providers enabled in settings. Providers without an API key are skipped.
pub fn create_providers(settings: &SearchSettings, timeout: Duration) -> Result<Vec<Arc<dyn SearchProvider>>> {
    let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();

    for name in &settings.providers {
        match name.to_lowercase().as_str() {
            "serpapi" => match settings.serpapi_key() {
                Some(key) => providers.push(Arc::new(
                    SerpApiProvider::new(key, timeout)?.with_base_url(&settings.serpapi_base_url),
                )),
                None => warn!("SerpAPI enabled but SERPAPI_API_KEY is not set, skipping"),
            },
            "tavily" => match settings.tavily_key() {
                Some(key) => providers.push(Arc::new(
                    TavilyProvider::new(key, timeout)?.with_base_url(&settings.tavily_base_url),
                )),
                None => warn!("Tavily enabled but TAVILY_API_KEY is not set, skipping"),
            },
            other => warn!("Unknown search provider '{}', skipping", other),
        }
    }

    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_and_keyless_providers_are_skipped() {
        let settings = SearchSettings {
            providers: vec!["bing".to_string(), "serpapi".to_string()],
            serpapi_api_key: Some("serp-key".to_string()),
            ..SearchSettings::default()
        };
        let providers = create_providers(&settings, Duration::from_secs(5)).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "serpapi");
    }

    #[test]
    fn test_new_result_trims_fields() {
        let r = SearchResult::new("tavily", 2, " Title ", " https://a.org ", " text ");
        assert_eq!(r.title, "Title");
        assert_eq!(r.url, "https://a.org");
        assert_eq!(r.sources, vec!["tavily".to_string()]);
    }
}
