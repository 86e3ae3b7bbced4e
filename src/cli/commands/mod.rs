//! CLI command implementations.

mod config;
mod doctor;
mod generate;
mod library;
mod research;
mod search;
mod serve;
mod transcript;
mod videos;

pub use config::run_config;
pub use doctor::run_doctor;
pub use generate::{run_generate, GenerateOptions};
pub use library::run_library;
pub use research::run_research;
pub use search::run_search;
pub use serve::run_serve;
pub use transcript::run_transcript;
pub use videos::run_videos;
