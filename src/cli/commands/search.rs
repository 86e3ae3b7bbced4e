//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::studio::Studio;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: Option<usize>, json: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Search, &settings)?;
    let studio = Studio::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let report = studio.search(query).await;
    spinner.finish_and_clear();

    let mut report = match report {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    };
    if let Some(limit) = limit {
        report.results.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for failed in &report.failed_providers {
        Output::warning(&format!("{} failed; results are from the remaining providers", failed));
    }

    if report.results.is_empty() {
        Output::warning("No results found matching your query.");
        return Ok(());
    }

    Output::success(&format!(
        "Found {} results via {}",
        report.results.len(),
        report.providers_used.join(", ")
    ));
    for (i, result) in report.results.iter().enumerate() {
        Output::search_result(
            i + 1,
            &result.title,
            &result.url,
            &result.snippet,
            result.score,
            &result.sources,
        );
    }

    Ok(())
}
