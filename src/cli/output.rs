//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a ranked web search result.
    pub fn search_result(rank: usize, title: &str, url: &str, snippet: &str, score: f32, sources: &[String]) {
        println!(
            "\n{} {} (score: {:.2}, via {})",
            style(format!("{:>2}.", rank)).green(),
            style(title).bold(),
            score,
            sources.join(", ")
        );
        println!("    {}", style(url).cyan());
        if !snippet.is_empty() {
            println!("    {}", content_preview(snippet, 200));
        }
    }

    /// Print a video search hit.
    pub fn video(title: &str, id: &str, channel: Option<&str>, url: &str) {
        match channel {
            Some(channel) => println!(
                "  {} {} ({}, {})",
                style("*").cyan(),
                style(title).bold(),
                channel,
                style(id).dim()
            ),
            None => println!("  {} {} ({})", style("*").cyan(), style(title).bold(), style(id).dim()),
        }
        println!("    {}", style(url).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Write `content` to `path`, or print it when no path is given.
    pub fn emit(content: &str, path: Option<&str>) -> anyhow::Result<()> {
        match path {
            Some(path) => {
                let path = Path::new(path);
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, content)?;
                Self::success(&format!("Wrote {}", path.display()));
            }
            None => println!("{}", content),
        }
        Ok(())
    }
}

/// Single-line preview, cut on a char boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
