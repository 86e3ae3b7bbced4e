//! CLI module for Scholar.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Args, Parser, Subcommand};

/// Scholar - study materials from topics, web research and YouTube
///
/// Generates quizzes, lesson plans, vocabulary lists and diagrams with an LLM,
/// runs multi-persona research briefs, and keeps what you save in a local library.
#[derive(Parser, Debug)]
#[command(name = "scholar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every material generator.
#[derive(Args, Debug, Clone)]
pub struct MaterialArgs {
    /// Topic (optional with --video; defaults to the video title)
    pub topic: Option<String>,

    /// Use a YouTube video's transcript as the source
    #[arg(long)]
    pub video: Option<String>,

    /// Audience, e.g. "Grade 7" or "undergraduate"
    #[arg(short, long)]
    pub grade: Option<String>,

    /// Read source text from a file
    #[arg(long, conflicts_with = "video")]
    pub source: Option<String>,

    /// Save the result to the library
    #[arg(short, long)]
    pub save: bool,

    /// Print JSON instead of Markdown
    #[arg(long)]
    pub json: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check API keys and configuration
    Doctor,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long, env = "SCHOLAR_HOST")]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long, env = "SCHOLAR_PORT")]
        port: Option<u16>,
    },

    /// Search the web across all configured providers
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a multi-persona research brief on a topic
    Research {
        /// Topic to research
        topic: String,

        /// Persona to include (repeatable; default: all)
        #[arg(short, long = "persona")]
        personas: Vec<String>,

        /// Ground the analysis in web search results
        #[arg(short = 'w', long)]
        web: bool,

        /// Save the report to the library
        #[arg(short, long)]
        save: bool,

        /// Print JSON instead of Markdown
        #[arg(long)]
        json: bool,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Generate a multiple-choice quiz
    Quiz {
        #[command(flatten)]
        args: MaterialArgs,

        /// Number of questions
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Generate a lesson plan
    Lesson {
        #[command(flatten)]
        args: MaterialArgs,
    },

    /// Generate a vocabulary list
    Vocab {
        #[command(flatten)]
        args: MaterialArgs,

        /// Number of terms
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Generate a Mermaid diagram
    Diagram {
        #[command(flatten)]
        args: MaterialArgs,

        /// Diagram kind (flowchart, mindmap, timeline, sequence)
        #[arg(short, long, default_value = "flowchart")]
        kind: String,
    },

    /// Fetch a YouTube transcript
    Transcript {
        /// YouTube URL or video ID
        video: String,

        /// Prefix each line with its timestamp
        #[arg(short, long)]
        timestamps: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Search YouTube videos
    Videos {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Browse saved materials and research reports
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum LibraryAction {
    /// List saved materials (and research reports)
    List {
        /// Only this kind (quiz, lesson, vocab, diagram)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Show a saved material or research report
    Show {
        /// Item ID
        id: String,

        /// Print JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },

    /// Delete a saved material
    Delete {
        /// Item ID
        id: String,
    },

    /// Export a saved material or research report
    Export {
        /// Item ID
        id: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quiz_with_video() {
        let cli = Cli::try_parse_from([
            "scholar", "-vv", "quiz", "--video", "https://youtu.be/abcdefghijk", "-n", "8", "--save",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Quiz { args, count } => {
                assert!(args.topic.is_none());
                assert_eq!(args.video.as_deref(), Some("https://youtu.be/abcdefghijk"));
                assert_eq!(count, Some(8));
                assert!(args.save);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_research_personas() {
        let cli = Cli::try_parse_from([
            "scholar", "research", "fractions", "-p", "Master Teacher", "-p", "Student Advocate", "-w",
        ])
        .unwrap();
        match cli.command {
            Commands::Research { personas, web, .. } => {
                assert_eq!(personas, vec!["Master Teacher", "Student Advocate"]);
                assert!(web);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_source_conflicts_with_video() {
        assert!(Cli::try_parse_from([
            "scholar", "lesson", "t", "--video", "abcdefghijk", "--source", "notes.txt"
        ])
        .is_err());
    }

    #[test]
    fn test_library_export_defaults_to_markdown() {
        let cli = Cli::try_parse_from(["scholar", "library", "export", "some-id"]).unwrap();
        match cli.command {
            Commands::Library {
                action: LibraryAction::Export { format, output, .. },
            } => {
                assert_eq!(format, "markdown");
                assert!(output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
