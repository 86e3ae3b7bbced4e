//! Error types for Scholar.

use thiserror::Error;

/// Library-level error type for Scholar operations.
#[derive(Error, Debug)]
pub enum ScholarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("YouTube error: {0}")]
    Youtube(String),

    #[error("Could not interpret model output: {0}")]
    Parse(String),

    #[error("Library error: {0}")]
    Library(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl ScholarError {
    /// Whether the error came from an upstream service (LLM, search, YouTube).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ScholarError::Llm(_)
                | ScholarError::Search(_)
                | ScholarError::Youtube(_)
                | ScholarError::Http(_)
        )
    }
}

/// Result type alias for Scholar operations.
pub type Result<T> = std::result::Result<T, ScholarError>;
