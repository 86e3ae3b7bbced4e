//! Configuration settings for Scholar.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub research: ResearchSettings,
    pub youtube: YoutubeSettings,
    pub library: LibrarySettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.scholar".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Hosted LLM backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API (default).
    #[default]
    Anthropic,
    /// OpenAI chat completions.
    OpenAi,
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            "openai" | "gpt" => Ok(LlmProvider::OpenAi),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Anthropic => write!(f, "anthropic"),
            LlmProvider::OpenAi => write!(f, "openai"),
        }
    }
}

/// LLM settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub anthropic_model: String,
    pub openai_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    pub anthropic_base_url: String,
    /// Falls back to ANTHROPIC_API_KEY.
    pub anthropic_api_key: Option<String>,
    /// Falls back to OPENAI_API_KEY.
    pub openai_api_key: Option<String>,
    /// Read the active provider's key from this variable instead of the default one.
    pub api_key_env: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            anthropic_model: "claude-sonnet-4-20250514".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
            timeout_seconds: 120,
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            anthropic_api_key: None,
            openai_api_key: None,
            api_key_env: None,
        }
    }
}

impl LlmSettings {
    /// Model name for the configured provider.
    pub fn model(&self) -> &str {
        match self.provider {
            LlmProvider::Anthropic => &self.anthropic_model,
            LlmProvider::OpenAi => &self.openai_model,
        }
    }

    /// Environment variable holding the active provider's key.
    pub fn key_env(&self) -> &str {
        match (self.api_key_env.as_deref().map(str::trim), self.provider) {
            (Some(name), _) if !name.is_empty() => name,
            (_, LlmProvider::Anthropic) => "ANTHROPIC_API_KEY",
            (_, LlmProvider::OpenAi) => "OPENAI_API_KEY",
        }
    }

    /// Key for the active provider: config value first, then [`Self::key_env`].
    pub fn api_key(&self) -> Option<String> {
        let configured = match self.provider {
            LlmProvider::Anthropic => self.anthropic_api_key.as_deref(),
            LlmProvider::OpenAi => self.openai_api_key.as_deref(),
        };
        resolve_key(configured, self.key_env())
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Enabled providers, in merge order (serpapi, tavily).
    pub providers: Vec<String>,
    /// Maximum results returned after merging.
    pub max_results: usize,
    /// Results requested from each provider.
    pub per_provider_results: usize,
    pub serpapi_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub serpapi_base_url: String,
    pub tavily_base_url: String,
    /// Extra domains that get the trusted-source bonus.
    pub trusted_domains: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            providers: vec!["serpapi".to_string(), "tavily".to_string()],
            max_results: 10,
            per_provider_results: 10,
            serpapi_api_key: None,
            tavily_api_key: None,
            serpapi_base_url: "https://serpapi.com".to_string(),
            tavily_base_url: "https://api.tavily.com".to_string(),
            trusted_domains: Vec::new(),
        }
    }
}

impl SearchSettings {
    pub fn serpapi_key(&self) -> Option<String> {
        resolve_key(self.serpapi_api_key.as_deref(), "SERPAPI_API_KEY")
    }

    pub fn tavily_key(&self) -> Option<String> {
        resolve_key(self.tavily_api_key.as_deref(), "TAVILY_API_KEY")
    }
}

/// Multi-persona research settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    /// Pause between persona calls, in milliseconds.
    pub inter_call_delay_ms: u64,
    /// Enabled persona names. Empty means all built-in personas.
    pub personas: Vec<String>,
    pub persona_max_tokens: u32,
    pub synthesis_max_tokens: u32,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            inter_call_delay_ms: 1500,
            personas: Vec::new(),
            persona_max_tokens: 1500,
            synthesis_max_tokens: 3000,
        }
    }
}

/// YouTube settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key (needed for video search). Falls back to YOUTUBE_API_KEY.
    pub api_key: Option<String>,
    /// Caption language to request.
    pub language: String,
    pub base_url: String,
    pub data_api_url: String,
    /// Transcript characters passed to the LLM as source text.
    pub max_transcript_chars: usize,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            language: "en".to_string(),
            base_url: "https://www.youtube.com".to_string(),
            data_api_url: "https://www.googleapis.com/youtube/v3".to_string(),
            max_transcript_chars: 24_000,
        }
    }
}

impl YoutubeSettings {
    pub fn key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), "YOUTUBE_API_KEY")
    }
}

/// Saved-material library settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Path to the SQLite database.
    pub sqlite_path: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.scholar/library.db".to_string(),
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// Config value first, then the environment. Blank values count as unset.
fn resolve_key(configured: Option<&str>, env_var: &str) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| {
            std::env::var(env_var)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ScholarError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scholar")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite library path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.library.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            provider = "openai"

            [research]
            inter_call_delay_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(settings.llm.provider, LlmProvider::OpenAi);
        assert_eq!(settings.llm.model(), "gpt-4o-mini");
        assert_eq!(settings.research.inter_call_delay_ms, 0);
        assert_eq!(settings.search.max_results, 10);
        assert_eq!(settings.server.port, 8888);
    }

    #[test]
    fn test_configured_key_wins_and_blank_is_unset() {
        assert_eq!(
            resolve_key(Some("  abc  "), "SCHOLAR_TEST_UNSET_VAR"),
            Some("abc".to_string())
        );
        assert_eq!(resolve_key(Some("   "), "SCHOLAR_TEST_UNSET_VAR"), None);
        assert_eq!(resolve_key(None, "SCHOLAR_TEST_UNSET_VAR"), None);
    }

    #[test]
    fn test_llm_key_follows_provider_and_env_override() {
        let mut llm = LlmSettings {
            anthropic_api_key: Some("sk-ant".to_string()),
            ..LlmSettings::default()
        };
        assert_eq!(llm.key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(llm.api_key().as_deref(), Some("sk-ant"));

        llm.provider = LlmProvider::OpenAi;
        llm.api_key_env = Some("SCHOLAR_TEST_UNSET_VAR".to_string());
        assert_eq!(llm.key_env(), "SCHOLAR_TEST_UNSET_VAR");
        assert_eq!(llm.api_key(), None);

        llm.api_key_env = Some(" ".to_string());
        assert_eq!(llm.key_env(), "OPENAI_API_KEY");
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Claude".parse::<LlmProvider>().unwrap(), LlmProvider::Anthropic);
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert!("bard".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.search.trusted_domains = vec!["nasa.gov".to_string()];
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.search.trusted_domains, vec!["nasa.gov".to_string()]);
    }
}
