//! Scholar - Study Materials and Research Briefs
//!
//! A CLI tool and HTTP API that turns a topic, a source text or a YouTube
//! transcript into classroom material with an LLM.
//!
//! # Overview
//!
//! Scholar allows you to:
//! - Generate quizzes, lesson plans, vocabulary lists and Mermaid diagrams
//! - Run multi-persona research briefs, optionally grounded in web search
//! - Search the web across several providers with merged, ranked results
//! - Fetch YouTube transcripts and build materials from them
//! - Keep generated material in a local SQLite library
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `llm` - LLM client abstraction (Anthropic, OpenAI)
//! - `search` - Search providers and the merging orchestrator
//! - `youtube` - Transcripts, video metadata and video search
//! - `materials` - Material generation and reply coercion
//! - `research` - Multi-persona analysis and synthesis
//! - `library` - Saved materials and reports
//! - `studio` - Wires the components together for the CLI and server
//! - `server` - HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use scholar::config::Settings;
//! use scholar::materials::{MaterialKind, MaterialRequest};
//! use scholar::studio::Studio;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let studio = Studio::new(settings)?;
//!
//!     let request = MaterialRequest::new("photosynthesis");
//!     let material = studio.generate(MaterialKind::Quiz, &request).await?;
//!     println!("{}", material.to_markdown());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod library;
pub mod llm;
pub mod materials;
pub mod research;
pub mod search;
pub mod server;
pub mod studio;
pub mod youtube;

pub use error::{Result, ScholarError};
