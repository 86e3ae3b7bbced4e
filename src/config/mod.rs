//! Configuration module for Scholar.
//!
//! Handles loading and managing application settings, prompt templates and personas.

mod prompts;
mod settings;

pub use prompts::{Persona, PromptPair, Prompts, ResearchPrompts};
pub use settings::{
    GeneralSettings, LibrarySettings, LlmProvider, LlmSettings, PromptSettings,
    ResearchSettings, SearchSettings, ServerSettings, Settings, YoutubeSettings,
};
