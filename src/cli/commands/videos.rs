//! YouTube video search command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::studio::Studio;
use anyhow::Result;

pub async fn run_videos(query: &str, limit: usize, settings: Settings) -> Result<()> {
    preflight::check(Operation::VideoSearch, &settings)?;
    let studio = Studio::new(settings)?;

    let spinner = Output::spinner("Searching YouTube...");
    let videos = studio.video_search(query, limit).await;
    spinner.finish_and_clear();
    let videos = videos?;

    if videos.is_empty() {
        Output::warning("No videos found.");
        return Ok(());
    }

    Output::success(&format!("Found {} videos", videos.len()));
    for video in &videos {
        Output::video(&video.title, &video.id, video.channel.as_deref(), &video.url);
    }
    println!();
    Output::info("Generate from one with: scholar quiz --video <id>");

    Ok(())
}
