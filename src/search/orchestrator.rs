//! Multi-provider search with deduplication and relevance ranking.

use super::normalize::{host_of, normalize_url};
use super::{SearchProvider, SearchResult};
use crate::error::{Result, ScholarError};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Domains that always get the trusted-source bonus.
const DEFAULT_TRUSTED_DOMAINS: &[&str] = &["wikipedia.org", "khanacademy.org", "britannica.com"];

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "her", "was", "one",
    "our", "out", "has", "how", "its", "what", "who", "why", "with", "this", "that", "from",
    "into", "about", "does", "when", "where", "which", "your",
];

const RANK_WEIGHT: f32 = 3.0;
const TITLE_TERM_WEIGHT: f32 = 2.0;
const SNIPPET_TERM_WEIGHT: f32 = 1.0;
const TRUSTED_DOMAIN_BONUS: f32 = 1.5;
const AGREEMENT_BONUS: f32 = 1.0;
const SHORT_SNIPPET_PENALTY: f32 = 1.0;
const SHORT_SNIPPET_CHARS: usize = 40;

/// Merged search output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub providers_used: Vec<String>,
    pub failed_providers: Vec<String>,
}

impl SearchReport {
    /// Numbered title/url/snippet digest used as LLM context.
    pub fn digest(&self, max_results: usize) -> String {
        self.results
            .iter()
            .take(max_results)
            .enumerate()
            .map(|(i, r)| format!("[{}] {}\n{}\n{}", i + 1, r.title, r.url, r.snippet))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Queries every provider, merges and ranks the results.
pub struct SearchOrchestrator {
    providers: Vec<Arc<dyn SearchProvider>>,
    max_results: usize,
    per_provider_results: usize,
    trusted_domains: Vec<String>,
}

impl SearchOrchestrator {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self {
            providers,
            max_results: 10,
            per_provider_results: 10,
            trusted_domains: DEFAULT_TRUSTED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_per_provider_results(mut self, per_provider_results: usize) -> Self {
        self.per_provider_results = per_provider_results;
        self
    }

    /// Add domains to the built-in trusted list.
    pub fn with_trusted_domains(mut self, domains: &[String]) -> Self {
        for domain in domains {
            let domain = domain.trim().trim_start_matches("www.").to_lowercase();
            if !domain.is_empty() && !self.trusted_domains.contains(&domain) {
                self.trusted_domains.push(domain);
            }
        }
        self
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Run the query against every provider concurrently and rank the merged results.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchReport> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScholarError::InvalidInput("Search query is empty".to_string()));
        }
        if self.providers.is_empty() {
            return Err(ScholarError::Config(
                "No search providers configured. Set SERPAPI_API_KEY and/or TAVILY_API_KEY."
                    .to_string(),
            ));
        }

        let calls = self
            .providers
            .iter()
            .map(|p| p.search(query, self.per_provider_results));
        let outcomes = join_all(calls).await;

        let mut batches = Vec::new();
        let mut providers_used = Vec::new();
        let mut failed_providers = Vec::new();
        let mut last_error = None;

        for (provider, outcome) in self.providers.iter().zip(outcomes) {
            match outcome {
                Ok(results) => {
                    providers_used.push(provider.name().to_string());
                    batches.push(results);
                }
                Err(e) => {
                    warn!("Search provider {} failed: {}", provider.name(), e);
                    failed_providers.push(provider.name().to_string());
                    last_error = Some(e);
                }
            }
        }

        if providers_used.is_empty() {
            let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
            return Err(ScholarError::Search(format!("All search providers failed: {}", reason)));
        }

        let merged = merge_results(batches);
        let terms = query_terms(query);
        let mut ranked: Vec<SearchResult> = merged
            .into_iter()
            .map(|mut r| {
                r.score = self.score(&r, &terms);
                r
            })
            .collect();

        // sort_by is stable, so ties keep merge order.
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(self.max_results);

        info!(
            "Search '{}' returned {} results from {:?}",
            query,
            ranked.len(),
            providers_used
        );

        Ok(SearchReport {
            query: query.to_string(),
            results: ranked,
            providers_used,
            failed_providers,
        })
    }

    /// Relevance heuristic: provider rank, query-term overlap, source trust and provider agreement.
    fn score(&self, result: &SearchResult, terms: &[String]) -> f32 {
        let rank = result.position.clamp(1, 10) as f32;
        let mut score = (11.0 - rank) / 10.0 * RANK_WEIGHT;

        let title_words = tokenize(&result.title);
        let snippet_words = tokenize(&result.snippet);
        for term in terms {
            if title_words.contains(term) {
                score += TITLE_TERM_WEIGHT;
            }
            if snippet_words.contains(term) {
                score += SNIPPET_TERM_WEIGHT;
            }
        }

        if self.is_trusted(&result.url) {
            score += TRUSTED_DOMAIN_BONUS;
        }

        score += AGREEMENT_BONUS * result.sources.len().saturating_sub(1) as f32;

        if result.snippet.chars().count() < SHORT_SNIPPET_CHARS {
            score -= SHORT_SNIPPET_PENALTY;
        }

        score
    }

    fn is_trusted(&self, url: &str) -> bool {
        let Some(host) = host_of(url) else {
            return false;
        };
        if host.ends_with(".edu") || host.ends_with(".gov") {
            return true;
        }
        self.trusted_domains
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
    }
}

/// Merge provider batches in order, collapsing results with the same normalized URL.
fn merge_results(batches: Vec<Vec<SearchResult>>) -> Vec<SearchResult> {
    let mut merged: Vec<SearchResult> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for result in batches.into_iter().flatten() {
        let key = normalize_url(&result.url);
        match index.get(&key) {
            Some(&i) => {
                let existing = &mut merged[i];
                if !existing.sources.contains(&result.source) {
                    existing.sources.push(result.source.clone());
                }
                existing.position = existing.position.min(result.position);
                if result.snippet.len() > existing.snippet.len() {
                    existing.snippet = result.snippet;
                }
                if existing.title.is_empty() {
                    existing.title = result.title;
                }
                if existing.published.is_none() {
                    existing.published = result.published;
                }
                if existing.provider_score.is_none() {
                    existing.provider_score = result.provider_score;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(result);
            }
        }
    }

    merged
}

/// Lowercase alphanumeric words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct query terms of three or more characters, stop words removed.
fn query_terms(query: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for word in tokenize(query) {
        if word.chars().count() >= 3 && !STOP_WORDS.contains(&word.as_str()) && !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeProvider {
        name: &'static str,
        results: Vec<SearchResult>,
        fail: bool,
    }

    impl FakeProvider {
        fn ok(name: &'static str, results: Vec<SearchResult>) -> Arc<dyn SearchProvider> {
            Arc::new(Self { name, results, fail: false })
        }

        fn failing(name: &'static str) -> Arc<dyn SearchProvider> {
            Arc::new(Self { name, results: Vec::new(), fail: true })
        }
    }

    #[async_trait]
    impl SearchProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchResult>> {
            if self.fail {
                return Err(ScholarError::Search("quota exceeded".to_string()));
            }
            Ok(self.results.iter().take(limit).cloned().collect())
        }
    }

    const LONG: &str = "A thorough explanation of how plants convert light energy into chemical energy.";

    #[test]
    fn test_query_terms() {
        assert_eq!(
            query_terms("What is the Photosynthesis process? photosynthesis"),
            vec!["photosynthesis".to_string(), "process".to_string()]
        );
    }

    #[test]
    fn test_merge_collapses_duplicates_and_keeps_longer_snippet() {
        let batches = vec![
            vec![SearchResult::new("serpapi", 3, "Cells", "https://www.example.com/cells/", "short")],
            vec![
                SearchResult::new("tavily", 1, "Cells!", "http://example.com/cells#top", LONG),
                SearchResult::new("tavily", 2, "Other", "https://other.org", LONG),
            ],
        ];

        let merged = merge_results(batches);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title, "Cells");
        assert_eq!(merged[0].snippet, LONG);
        assert_eq!(merged[0].position, 1);
        assert_eq!(merged[0].sources, vec!["serpapi".to_string(), "tavily".to_string()]);
        assert_eq!(merged[0].source, "serpapi");
    }

    #[test]
    fn test_score_components() {
        let orchestrator = SearchOrchestrator::new(Vec::new());
        let terms = query_terms("photosynthesis light");

        let plain = SearchResult::new("serpapi", 10, "Unrelated", "https://blog.example.com", "tiny");
        // rank 10 -> 0.3, short snippet -> -1.0
        assert!((orchestrator.score(&plain, &terms) - (0.3 - 1.0)).abs() < 1e-5);

        let mut strong = SearchResult::new(
            "serpapi",
            1,
            "Photosynthesis",
            "https://en.wikipedia.org/wiki/Photosynthesis",
            "Photosynthesis uses light energy to make sugar in the chloroplast.",
        );
        strong.sources.push("tavily".to_string());
        // rank 3.0 + title 2.0 + snippet 2 * 1.0 + trusted 1.5 + agreement 1.0
        assert!((orchestrator.score(&strong, &terms) - 9.5).abs() < 1e-5);
    }

    #[test]
    fn test_trusted_domains() {
        let orchestrator =
            SearchOrchestrator::new(Vec::new()).with_trusted_domains(&["www.NASA.com".to_string()]);
        assert!(orchestrator.is_trusted("https://biology.mit.edu/x"));
        assert!(orchestrator.is_trusted("https://www.cdc.gov/"));
        assert!(orchestrator.is_trusted("https://science.nasa.com/a"));
        assert!(!orchestrator.is_trusted("https://notwikipedia.org/"));
        assert!(!orchestrator.is_trusted("nonsense"));
    }

    #[tokio::test]
    async fn test_search_ranks_merged_results() {
        let serp = FakeProvider::ok(
            "serpapi",
            vec![
                SearchResult::new("serpapi", 1, "Cooking blog", "https://food.example.com", LONG),
                SearchResult::new("serpapi", 2, "Photosynthesis basics", "https://www.khanacademy.org/photo", LONG),
            ],
        );
        let tavily = FakeProvider::ok(
            "tavily",
            vec![SearchResult::new("tavily", 1, "Photosynthesis", "https://khanacademy.org/photo/", LONG)],
        );

        let report = SearchOrchestrator::new(vec![serp, tavily])
            .search("photosynthesis")
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].url, "https://www.khanacademy.org/photo");
        assert_eq!(report.results[0].sources.len(), 2);
        assert!(report.results[0].score > report.results[1].score);
        assert_eq!(report.providers_used, vec!["serpapi".to_string(), "tavily".to_string()]);
        assert!(report.failed_providers.is_empty());
    }

    #[tokio::test]
    async fn test_one_failed_provider_is_tolerated() {
        let serp = FakeProvider::failing("serpapi");
        let tavily = FakeProvider::ok(
            "tavily",
            vec![SearchResult::new("tavily", 1, "Cells", "https://cells.example.org", LONG)],
        );

        let report = SearchOrchestrator::new(vec![serp, tavily]).search("cells").await.unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failed_providers, vec!["serpapi".to_string()]);
    }

    #[tokio::test]
    async fn test_all_providers_failing_is_an_error() {
        let orchestrator =
            SearchOrchestrator::new(vec![FakeProvider::failing("serpapi"), FakeProvider::failing("tavily")]);
        let err = orchestrator.search("cells").await.unwrap_err();
        assert!(matches!(err, ScholarError::Search(_)));
    }

    #[tokio::test]
    async fn test_truncates_to_max_results_and_rejects_blank_query() {
        let results = (1..=6)
            .map(|i| SearchResult::new("serpapi", i, "t", &format!("https://site{}.com", i), LONG))
            .collect();
        let orchestrator = SearchOrchestrator::new(vec![FakeProvider::ok("serpapi", results)]).with_max_results(3);

        let report = orchestrator.search("anything").await.unwrap();
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[0].url, "https://site1.com");

        assert!(matches!(
            orchestrator.search("   ").await,
            Err(ScholarError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_digest_format() {
        let report = SearchReport {
            query: "q".to_string(),
            results: vec![SearchResult::new("tavily", 1, "Title", "https://a.org", "Snippet")],
            providers_used: vec!["tavily".to_string()],
            failed_providers: Vec::new(),
        };
        assert_eq!(report.digest(5), "[1] Title\nhttps://a.org\nSnippet");
    }
}
