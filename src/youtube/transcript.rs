//! Transcript model and caption parsing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A complete transcript with segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Caption language.
    pub language: String,
    /// Individual transcript segments with timestamps.
    pub segments: Vec<TranscriptSegment>,
    /// Full transcript text (concatenated segments).
    pub full_text: String,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(video_id: String, language: String, segments: Vec<TranscriptSegment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let duration_seconds = segments.last().map(|s| s.end_seconds).unwrap_or(0.0);

        Self {
            video_id,
            language,
            segments,
            full_text,
            duration_seconds,
        }
    }

    /// Get the text content between two timestamps.
    pub fn text_between(&self, start: f64, end: f64) -> String {
        self.segments
            .iter()
            .filter(|s| s.start_seconds >= start && s.end_seconds <= end)
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Format the transcript with timestamps for display.
    pub fn format_with_timestamps(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("[{}] {}", format_timestamp(s.start_seconds), s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full text cut to at most `max_chars` characters, on a word boundary when possible.
    pub fn excerpt(&self, max_chars: usize) -> String {
        if self.full_text.chars().count() <= max_chars {
            return self.full_text.clone();
        }
        let cut: String = self.full_text.chars().take(max_chars).collect();
        match cut.rfind(' ') {
            Some(idx) if idx > 0 => format!("{}...", &cut[..idx]),
            _ => format!("{}...", cut),
        }
    }
}

/// A single caption line with timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

fn text_element_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<text\b([^>]*)>(.*?)</text>"#).expect("valid caption regex")
    })
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid attribute regex"))
}

fn numeric_entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#(x?[0-9a-fA-F]+);").expect("valid entity regex"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

/// Decode the HTML entities YouTube uses in caption text.
///
/// Captions are often double-escaped (`&amp;#39;`), so `&amp;` is decoded first.
pub fn decode_entities(text: &str) -> String {
    let text = text.replace("&amp;", "&");
    let text = numeric_entity_regex().replace_all(&text, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });
    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Parse a timedtext XML document into segments. Empty lines are dropped.
pub fn parse_timedtext(xml: &str) -> Vec<TranscriptSegment> {
    text_element_regex()
        .captures_iter(xml)
        .filter_map(|caps| {
            let mut start = None;
            let mut dur = 0.0;
            for attr in attribute_regex().captures_iter(&caps[1]) {
                match &attr[1] {
                    "start" => start = attr[2].parse::<f64>().ok(),
                    "dur" => dur = attr[2].parse::<f64>().unwrap_or(0.0),
                    _ => {}
                }
            }
            let start = start?;

            let decoded = decode_entities(&caps[2]);
            let text = tag_regex()
                .replace_all(&decoded, "")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");

            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment::new(start, start + dur, text))
        })
        .collect()
}
