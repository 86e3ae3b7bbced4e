//! Pre-flight checks before expensive operations.
//!
//! Validates that the required API keys are configured before starting
//! operations that would otherwise fail after the first network call.

use crate::config::Settings;
use crate::error::{Result, ScholarError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Web search needs at least one search provider key.
    Search,
    /// Material generation needs an LLM key.
    Generate,
    /// Research needs an LLM key, and a search key when grounded in the web.
    Research { web: bool },
    /// Video search needs a YouTube Data API key.
    VideoSearch,
    /// Transcripts need nothing.
    Transcript,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Search => check_search_key(settings)?,
        Operation::Generate => check_llm_key(settings)?,
        Operation::Research { web } => {
            check_llm_key(settings)?;
            if web {
                check_search_key(settings)?;
            }
        }
        Operation::VideoSearch => {
            if settings.youtube.key().is_none() {
                return Err(ScholarError::Config(
                    "YOUTUBE_API_KEY not set. Set it with: export YOUTUBE_API_KEY='...'".to_string(),
                ));
            }
        }
        Operation::Transcript => {
            // Captions are public
        }
    }
    Ok(())
}

fn check_llm_key(settings: &Settings) -> Result<()> {
    let var = settings.llm.key_env();
    if settings.llm.api_key().is_some() {
        Ok(())
    } else {
        Err(ScholarError::Config(format!(
            "{} not set. Set it with: export {}='...' (provider: {})",
            var, var, settings.llm.provider
        )))
    }
}

fn check_search_key(settings: &Settings) -> Result<()> {
    let search = &settings.search;
    let configured = search.providers.iter().any(|p| match p.to_lowercase().as_str() {
        "serpapi" => search.serpapi_key().is_some(),
        "tavily" => search.tavily_key().is_some(),
        _ => false,
    });
    if configured {
        Ok(())
    } else {
        Err(ScholarError::Config(
            "No search provider key set. Set SERPAPI_API_KEY and/or TAVILY_API_KEY.".to_string(),
        ))
    }
}
