//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::studio::Studio;
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct TranscriptExport<'a> {
    video: &'a crate::youtube::VideoInfo,
    transcript: &'a crate::youtube::Transcript,
}

/// Fetch and print a video's captions.
pub async fn run_transcript(
    video: &str,
    timestamps: bool,
    json: bool,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Transcript, &settings)?;
    let studio = Studio::new(settings)?;

    let spinner = Output::spinner("Fetching transcript...");
    let result = studio.transcript(video).await;
    spinner.finish_and_clear();
    let (info, transcript) = result?;

    let content = if json {
        serde_json::to_string_pretty(&TranscriptExport {
            video: &info,
            transcript: &transcript,
        })?
    } else if timestamps {
        transcript.format_with_timestamps()
    } else {
        transcript.full_text.clone()
    };

    if output.is_some() || json {
        return Output::emit(&content, output.as_deref());
    }

    Output::header(&info.title);
    Output::kv("Video", &info.url);
    if let Some(channel) = &info.channel {
        Output::kv("Channel", channel);
    }
    Output::kv("Segments", &transcript.segments.len().to_string());
    println!();
    println!("{}", content);
    Ok(())
}
