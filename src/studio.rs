//! High-level facade shared by the CLI and the HTTP server.

use crate::config::{Prompts, Settings};
use crate::error::{Result, ScholarError};
use crate::library::{Library, SavedMaterial, SqliteLibrary};
use crate::llm::{create_client, LlmClient};
use crate::materials::{Material, MaterialGenerator, MaterialKind, MaterialRequest};
use crate::research::{ResearchAnalyzer, ResearchReport, ResearchRequest};
use crate::search::{create_providers, SearchOrchestrator, SearchReport};
use crate::youtube::{extract_video_id, watch_url, Transcript, VideoInfo, VideoSource, YoutubeClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// A material generated from a video transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMaterial {
    /// The caller's topic, or the video title when none was given.
    pub topic: String,
    pub video: VideoInfo,
    pub material: Material,
}

/// Owns every service Scholar talks to.
pub struct Studio {
    settings: Settings,
    prompts: Arc<Prompts>,
    llm: Option<Arc<dyn LlmClient>>,
    search: SearchOrchestrator,
    videos: Arc<dyn VideoSource>,
    library: Arc<dyn Library>,
}

impl Studio {
    /// Build every component from settings.
    ///
    /// A missing LLM key is not fatal here: search, transcripts and the
    /// library still work, and LLM operations report the missing key.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let llm = match create_client(&settings.llm, None) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("LLM unavailable: {}", e);
                None
            }
        };

        let timeout = Duration::from_secs(settings.llm.timeout_seconds);
        let search = orchestrator(&settings, timeout)?;
        let videos: Arc<dyn VideoSource> = Arc::new(YoutubeClient::new(&settings.youtube, timeout)?);
        let library: Arc<dyn Library> = Arc::new(SqliteLibrary::new(&settings.sqlite_path())?);

        Ok(Self::with_components(settings, prompts, llm, search, videos, library))
    }

    /// Assemble a studio from injected components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        llm: Option<Arc<dyn LlmClient>>,
        search: SearchOrchestrator,
        videos: Arc<dyn VideoSource>,
        library: Arc<dyn Library>,
    ) -> Self {
        Self {
            settings,
            prompts: Arc::new(prompts),
            llm,
            search,
            videos,
            library,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn library(&self) -> &Arc<dyn Library> {
        &self.library
    }

    pub fn search_providers(&self) -> Vec<String> {
        self.search.provider_names()
    }

    fn llm(&self) -> Result<Arc<dyn LlmClient>> {
        match &self.llm {
            Some(client) => Ok(client.clone()),
            // Re-run client construction to surface the real configuration error.
            None => create_client(&self.settings.llm, None),
        }
    }

    /// Name and model of the LLM in use, if one is configured.
    pub fn llm_description(&self) -> Option<String> {
        self.llm
            .as_ref()
            .map(|c| format!("{} ({})", c.name(), c.model()))
    }

    pub async fn search(&self, query: &str) -> Result<SearchReport> {
        self.search.search(query).await
    }

    /// Multi-persona research, optionally grounded in web search results.
    pub async fn research(&self, request: ResearchRequest, with_search: bool) -> Result<ResearchReport> {
        let research = &self.settings.research;
        let analyzer = ResearchAnalyzer::new(self.llm()?, self.prompts.clone())
            .with_delay(Duration::from_millis(research.inter_call_delay_ms))
            .with_default_personas(research.personas.clone())
            .with_max_tokens(research.persona_max_tokens, research.synthesis_max_tokens)
            .with_temperature(self.settings.llm.temperature);

        if with_search {
            analyzer.analyze_with_search(&self.search, request).await
        } else {
            analyzer.analyze(&request).await
        }
    }

    fn generator(&self) -> Result<MaterialGenerator> {
        Ok(MaterialGenerator::new(self.llm()?, self.prompts.clone())
            .with_max_tokens(self.settings.llm.max_tokens)
            .with_temperature(self.settings.llm.temperature))
    }

    pub async fn generate(&self, kind: MaterialKind, request: &MaterialRequest) -> Result<Material> {
        self.generator()?.generate(kind, request).await
    }

    /// Generate a material from a video's transcript.
    ///
    /// An empty topic falls back to the video title, and the material is
    /// titled after the video.
    #[instrument(skip(self, request))]
    pub async fn generate_from_video(
        &self,
        kind: MaterialKind,
        video: &str,
        request: MaterialRequest,
    ) -> Result<VideoMaterial> {
        let generator = self.generator()?;
        let transcript = self.videos.transcript(video).await?;
        let info = self.video_info(&transcript.video_id).await;

        let mut request = request;
        if request.topic.trim().is_empty() {
            request.topic = info.title.clone();
        }
        request.source_text = Some(transcript.excerpt(self.settings.youtube.max_transcript_chars));

        let mut material = generator.generate(kind, &request).await?;
        material.set_title(info.title.clone());

        info!("Generated {} from video {}", kind, info.id);
        Ok(VideoMaterial {
            topic: request.topic,
            video: info,
            material,
        })
    }

    /// Video metadata, falling back to a bare entry when oEmbed fails.
    async fn video_info(&self, video_id: &str) -> VideoInfo {
        match self.videos.video_info(video_id).await {
            Ok(info) => info,
            Err(e) => {
                warn!("No metadata for video {}: {}", video_id, e);
                VideoInfo {
                    id: video_id.to_string(),
                    title: format!("YouTube video {}", video_id),
                    description: None,
                    channel: None,
                    published_at: None,
                    thumbnail_url: None,
                    url: watch_url(video_id, None),
                }
            }
        }
    }

    pub async fn transcript(&self, video: &str) -> Result<(VideoInfo, Transcript)> {
        let transcript = self.videos.transcript(video).await?;
        let info = self.video_info(&transcript.video_id).await;
        Ok((info, transcript))
    }

    pub async fn video_search(&self, query: &str, limit: usize) -> Result<Vec<VideoInfo>> {
        if query.trim().is_empty() {
            return Err(ScholarError::InvalidInput("Video search query is empty".to_string()));
        }
        self.videos.search(query, limit).await
    }

    /// Save a material to the library.
    pub async fn save_material(
        &self,
        topic: &str,
        material: Material,
        source: Option<&str>,
    ) -> Result<SavedMaterial> {
        let mut saved = SavedMaterial::new(topic.trim(), material);
        if let Some(source) = source {
            let source = match extract_video_id(source) {
                Some(id) => watch_url(&id, None),
                None => source.to_string(),
            };
            saved = saved.with_source(source);
        }
        self.library.save_material(&saved).await?;
        info!("Saved {} '{}' as {}", saved.kind, saved.title, saved.id);
        Ok(saved)
    }

    pub async fn save_report(&self, report: &ResearchReport) -> Result<()> {
        self.library.save_report(report).await
    }
}

fn orchestrator(settings: &Settings, timeout: Duration) -> Result<SearchOrchestrator> {
    Ok(SearchOrchestrator::new(create_providers(&settings.search, timeout)?)
        .with_max_results(settings.search.max_results)
        .with_per_provider_results(settings.search.per_provider_results)
        .with_trusted_domains(&settings.search.trusted_domains))
}
