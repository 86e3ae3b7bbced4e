//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<PathBuf>, settings: Settings) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&masked(settings))
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!("{} already exists", config_path.display()));
                Output::info("Use --force to overwrite it with defaults.");
                return Ok(());
            }
            Settings::default().save_to(&config_path)?;
            Output::success(&format!("Wrote default config to {}", config_path.display()));
            Output::info("API keys are read from ANTHROPIC_API_KEY, OPENAI_API_KEY, SERPAPI_API_KEY, TAVILY_API_KEY and YOUTUBE_API_KEY.");
        }
    }

    Ok(())
}

/// Hide API keys written in the config file.
fn masked(mut settings: Settings) -> Settings {
    for key in [
        &mut settings.llm.anthropic_api_key,
        &mut settings.llm.openai_api_key,
        &mut settings.search.serpapi_api_key,
        &mut settings.search.tavily_api_key,
        &mut settings.youtube.api_key,
    ] {
        if let Some(value) = key.as_mut() {
            *value = mask(value);
        }
    }
    settings
}

pub(crate) fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 10 {
        return "****".to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("sk-ant-api03-abcdefgh1234"), "sk-ant...1234");
    }

    #[test]
    fn test_show_masks_keys() {
        let mut settings = Settings::default();
        settings.search.tavily_api_key = Some("tvly-0123456789abcdef".to_string());
        let shown = masked(settings);
        assert_eq!(shown.search.tavily_api_key.as_deref(), Some("tvly-0...cdef"));
        assert!(shown.llm.anthropic_api_key.is_none());
    }

    #[test]
    fn test_init_respects_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9999\n").unwrap();

        run_config(&ConfigAction::Init { force: false }, Some(path.clone()), Settings::default()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("9999"));

        run_config(&ConfigAction::Init { force: true }, Some(path.clone()), Settings::default()).unwrap();
        let written = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(written.server.port, 8888);
    }
}
