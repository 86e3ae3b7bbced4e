//! Research command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::research::ResearchRequest;
use crate::studio::Studio;
use anyhow::Result;

/// Run a multi-persona research brief.
pub async fn run_research(
    topic: &str,
    personas: Vec<String>,
    web: bool,
    save: bool,
    json: bool,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Research { web }, &settings)?;
    let studio = Studio::new(settings)?;

    let persona_count = if personas.is_empty() {
        None
    } else {
        Some(personas.len())
    };
    let request = ResearchRequest {
        topic: topic.to_string(),
        context: None,
        personas,
    };

    let message = match persona_count {
        Some(n) => format!("Researching '{}' with {} personas...", topic, n),
        None => format!("Researching '{}'...", topic),
    };
    let spinner = Output::spinner(&message);
    let report = studio.research(request, web).await;
    spinner.finish_and_clear();
    let report = report?;

    for failed in report.analyses.iter().filter(|a| !a.succeeded()) {
        Output::warning(&format!("{} analysis failed", failed.persona));
    }

    if save {
        studio.save_report(&report).await?;
        Output::success(&format!("Saved research report {}", report.id));
    }

    let content = if json {
        serde_json::to_string_pretty(&report)?
    } else {
        report.to_markdown()
    };
    Output::emit(&content, output.as_deref())
}
