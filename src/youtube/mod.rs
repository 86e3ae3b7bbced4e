//! YouTube integration: video IDs, captions and video search.

mod transcript;

pub use transcript::{
    decode_entities, format_timestamp, parse_timedtext, Transcript, TranscriptSegment,
};

use crate::config::YoutubeSettings;
use crate::error::{Result, ScholarError};
use crate::llm::http_client;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, instrument};

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Matches various YouTube URL formats and bare video IDs
        Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex")
    })
}

/// Extract a video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = video_id_regex().captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Watch URL for a video, optionally starting at a timestamp.
pub fn watch_url(video_id: &str, start_seconds: Option<f64>) -> String {
    match start_seconds {
        Some(t) => format!("https://youtube.com/watch?v={}&t={}s", video_id, t as u32),
        None => format!("https://www.youtube.com/watch?v={}", video_id),
    }
}

/// Metadata about a video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub url: String,
}

/// Client for captions, oEmbed metadata and Data API search.
pub struct YoutubeClient {
    http: reqwest::Client,
    base_url: String,
    data_api_url: String,
    api_key: Option<String>,
    language: String,
}

impl YoutubeClient {
    pub fn new(settings: &YoutubeSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            data_api_url: settings.data_api_url.trim_end_matches('/').to_string(),
            api_key: settings.key(),
            language: settings.language.clone(),
        })
    }
}

/// Where videos, captions and video metadata come from.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Fetch the caption track for a video (URL or bare ID).
    async fn transcript(&self, input: &str) -> Result<Transcript>;

    /// Title and channel for a video ID.
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo>;

    /// Search for videos.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoInfo>>;
}

#[async_trait]
impl VideoSource for YoutubeClient {
    #[instrument(skip(self))]
    async fn transcript(&self, input: &str) -> Result<Transcript> {
        let video_id = extract_video_id(input).ok_or_else(|| {
            ScholarError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", input))
        })?;

        let resp = self
            .http
            .get(format!("{}/api/timedtext", self.base_url))
            .query(&[("lang", self.language.as_str()), ("v", video_id.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ScholarError::Youtube(format!(
                "Caption request for {} failed with {}",
                video_id, status
            )));
        }

        let segments = parse_timedtext(&body);
        if segments.is_empty() {
            return Err(ScholarError::NotFound(format!(
                "no {} transcript available for video {}",
                self.language, video_id
            )));
        }

        info!("Fetched transcript for {} ({} segments)", video_id, segments.len());
        Ok(Transcript::new(video_id, self.language.clone(), segments))
    }

    /// Uses oEmbed, which needs no API key.
    #[instrument(skip(self))]
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo> {
        let url = watch_url(video_id, None);
        let resp = self
            .http
            .get(format!("{}/oembed", self.base_url))
            .query(&[("url", url.as_str()), ("format", "json")])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ScholarError::NotFound(format!("video {}", video_id)));
        }
        if !resp.status().is_success() {
            return Err(ScholarError::Youtube(format!(
                "oEmbed request for {} failed with {}",
                video_id,
                resp.status()
            )));
        }

        let body = resp.text().await?;
        parse_oembed(video_id, &body)
    }

    /// Uses the Data API, which needs a key.
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoInfo>> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            ScholarError::Config("YOUTUBE_API_KEY not set; video search needs a Data API key".to_string())
        })?;
        if query.trim().is_empty() {
            return Err(ScholarError::InvalidInput("Video search query is empty".to_string()));
        }

        let max_results = limit.clamp(1, 50).to_string();
        let resp = self
            .http
            .get(format!("{}/search", self.data_api_url))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query.trim()),
                ("maxResults", max_results.as_str()),
                ("key", key),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ScholarError::Youtube(format!("Data API error {}: {}", status, body)));
        }

        let videos = parse_search_response(&body)?;
        debug!("Video search returned {} results", videos.len());
        Ok(videos)
    }
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    title: String,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

fn parse_oembed(video_id: &str, body: &str) -> Result<VideoInfo> {
    let oembed: OEmbed = serde_json::from_str(body)
        .map_err(|e| ScholarError::Youtube(format!("Failed to parse oEmbed response: {}", e)))?;

    Ok(VideoInfo {
        id: video_id.to_string(),
        title: oembed.title,
        description: None,
        channel: oembed.author_name,
        published_at: None,
        thumbnail_url: oembed.thumbnail_url,
        url: watch_url(video_id, None),
    })
}

fn parse_search_response(body: &str) -> Result<Vec<VideoInfo>> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ScholarError::Youtube(format!("Failed to parse search response: {}", e)))?;

    let items = json["items"].as_array().cloned().unwrap_or_default();

    Ok(items
        .iter()
        .filter_map(|item| {
            let id = item["id"]["videoId"].as_str()?.to_string();
            let snippet = &item["snippet"];
            Some(VideoInfo {
                title: decode_entities(snippet["title"].as_str().unwrap_or("Untitled")),
                description: snippet["description"].as_str().map(decode_entities),
                channel: snippet["channelTitle"].as_str().map(|s| s.to_string()),
                published_at: snippet["publishedAt"].as_str().map(|s| s.to_string()),
                thumbnail_url: snippet["thumbnails"]["medium"]["url"]
                    .as_str()
                    .or_else(|| snippet["thumbnails"]["default"]["url"].as_str())
                    .map(|s| s.to_string()),
                url: watch_url(&id, None),
                id,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));

        assert_eq!(extract_video_id("not-a-video-id"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("abc", Some(65.7)), "https://youtube.com/watch?v=abc&t=65s");
        assert_eq!(watch_url("abc", None), "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn test_parse_search_response() {
        let body = r#"{
            "items": [
                {"id": {"kind": "youtube#video", "videoId": "abcdefghijk"},
                 "snippet": {"title": "Cells &amp; Organelles", "channelTitle": "Bio Channel",
                             "publishedAt": "2023-05-01T00:00:00Z",
                             "thumbnails": {"default": {"url": "https://i.ytimg.com/d.jpg"}}}},
                {"id": {"kind": "youtube#channel", "channelId": "UC123"}, "snippet": {"title": "Channel"}}
            ]
        }"#;

        let videos = parse_search_response(body).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].title, "Cells & Organelles");
        assert_eq!(videos[0].thumbnail_url.as_deref(), Some("https://i.ytimg.com/d.jpg"));
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=abcdefghijk");
    }

    #[test]
    fn test_parse_oembed() {
        let info = parse_oembed(
            "abcdefghijk",
            r#"{"title": "Intro to Cells", "author_name": "Bio Channel", "type": "video"}"#,
        )
        .unwrap();
        assert_eq!(info.title, "Intro to Cells");
        assert_eq!(info.channel.as_deref(), Some("Bio Channel"));
    }

    #[tokio::test]
    async fn test_transcript_rejects_bad_id_before_network() {
        let client = YoutubeClient::new(&YoutubeSettings::default(), Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.transcript("definitely not a video").await,
            Err(ScholarError::InvalidInput(_))
        ));
    }
}
