//! Scholar CLI entry point.

use anyhow::Result;
use clap::Parser;
use scholar::cli::commands::{self, GenerateOptions};
use scholar::cli::{Cli, Commands};
use scholar::config::Settings;
use scholar::materials::MaterialKind;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scholar={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    match cli.command {
        Commands::Doctor => {
            let path = config_path.unwrap_or_else(Settings::default_config_path);
            commands::run_doctor(&settings, &path)?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, port, settings).await?;
        }

        Commands::Search { query, limit, json } => {
            commands::run_search(&query, limit, json, settings).await?;
        }

        Commands::Research {
            topic,
            personas,
            web,
            save,
            json,
            output,
        } => {
            commands::run_research(&topic, personas, web, save, json, output, settings).await?;
        }

        Commands::Quiz { args, count } => {
            let options = GenerateOptions {
                count,
                diagram_kind: None,
            };
            commands::run_generate(MaterialKind::Quiz, args, options, settings).await?;
        }

        Commands::Lesson { args } => {
            commands::run_generate(MaterialKind::LessonPlan, args, GenerateOptions::default(), settings)
                .await?;
        }

        Commands::Vocab { args, count } => {
            let options = GenerateOptions {
                count,
                diagram_kind: None,
            };
            commands::run_generate(MaterialKind::Vocabulary, args, options, settings).await?;
        }

        Commands::Diagram { args, kind } => {
            let options = GenerateOptions {
                count: None,
                diagram_kind: Some(kind),
            };
            commands::run_generate(MaterialKind::Diagram, args, options, settings).await?;
        }

        Commands::Transcript {
            video,
            timestamps,
            json,
            output,
        } => {
            commands::run_transcript(&video, timestamps, json, output, settings).await?;
        }

        Commands::Videos { query, limit } => {
            commands::run_videos(&query, limit, settings).await?;
        }

        Commands::Library { action } => {
            commands::run_library(&action, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}
