//! Doctor command - verify API keys and configuration.

use super::config::mask;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Scholar Doctor");
    println!();
    println!("Checking API keys and configuration...\n");

    let mut checks = Vec::new();

    let sections = [
        ("LLM", vec![check_llm(settings)]),
        ("Search Providers", check_search(settings)),
        ("YouTube", vec![check_youtube(settings)]),
        ("Storage", check_storage(settings)),
        ("Configuration", vec![check_config_file(config_path)]),
    ];

    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Scholar.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Scholar is ready to use.");
    }

    Ok(())
}

fn key_check(name: &str, key: Option<String>, missing: CheckStatus, hint: &str) -> CheckResult {
    match key {
        Some(key) => CheckResult::ok(name, &format!("configured ({})", mask(&key))),
        None if missing == CheckStatus::Error => CheckResult::error(name, "not set", hint),
        None => CheckResult::warning(name, "not set", hint),
    }
}

/// The active provider's key is required; generation cannot work without it.
fn check_llm(settings: &Settings) -> CheckResult {
    let llm = &settings.llm;
    let name = llm.key_env();
    let key = llm.api_key();
    let mut result = key_check(
        name,
        key,
        CheckStatus::Error,
        &format!("Set with: export {}='...' or set llm.provider", name),
    );
    if result.status == CheckStatus::Ok {
        result.message = format!("{}, model {}", result.message, llm.model());
    }
    result
}

/// Each enabled provider is optional, but at least one is needed for search.
fn check_search(settings: &Settings) -> Vec<CheckResult> {
    let search = &settings.search;
    let mut results: Vec<CheckResult> = search
        .providers
        .iter()
        .map(|p| match p.to_lowercase().as_str() {
            "serpapi" => key_check(
                "SERPAPI_API_KEY",
                search.serpapi_key(),
                CheckStatus::Warning,
                "Set with: export SERPAPI_API_KEY='...'",
            ),
            "tavily" => key_check(
                "TAVILY_API_KEY",
                search.tavily_key(),
                CheckStatus::Warning,
                "Set with: export TAVILY_API_KEY='tvly-...'",
            ),
            other => CheckResult::warning(
                other,
                "unknown provider",
                "Supported providers: serpapi, tavily",
            ),
        })
        .collect();

    if !results.iter().any(|r| r.status == CheckStatus::Ok) {
        results.push(CheckResult::warning(
            "Web search",
            "no provider available",
            "search and research --web will not work",
        ));
    }
    results
}

fn check_youtube(settings: &Settings) -> CheckResult {
    key_check(
        "YOUTUBE_API_KEY",
        settings.youtube.key(),
        CheckStatus::Warning,
        "Only needed for video search; transcripts work without it",
    )
}

fn check_storage(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &format!("{}", data_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Library",
            &format!("{} ({})", db_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Library",
            &format!("{} (not created yet)", db_path.display()),
            "The library is created the first time something is saved",
        ));
    }

    results
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: scholar config init",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_llm_check_reports_model() {
        let mut settings = Settings::default();
        settings.llm.anthropic_api_key = Some("sk-ant-api03-abcdefgh1234".to_string());
        let result = check_llm(&settings);
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("sk-ant...1234"));
        assert!(result.message.contains(settings.llm.model()));
    }

    #[test]
    fn test_unknown_search_provider_warns() {
        let mut settings = Settings::default();
        settings.search.providers = vec!["bing".to_string()];
        let results = check_search(&settings);
        assert_eq!(results[0].message, "unknown provider");
        assert_eq!(results.last().unwrap().name, "Web search");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }
}
