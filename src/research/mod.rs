//! Multi-persona research.
//!
//! A topic is analyzed by several personas in turn, then one synthesis call
//! merges the successful analyses into a single brief.

use crate::config::{Persona, Prompts};
use crate::error::{Result, ScholarError};
use crate::llm::{CompletionRequest, LlmClient};
use crate::search::SearchOrchestrator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Search results included as research context.
const SEARCH_CONTEXT_RESULTS: usize = 8;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
    /// Free-text context, e.g. a search digest or transcript excerpt.
    #[serde(default)]
    pub context: Option<String>,
    /// Persona names to run; empty runs the configured default set.
    #[serde(default)]
    pub personas: Vec<String>,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }
}

/// One persona's contribution. `error` is set when the call failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonaAnalysis {
    pub persona: String,
    pub focus: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PersonaAnalysis {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchReport {
    pub id: Uuid,
    pub topic: String,
    pub analyses: Vec<PersonaAnalysis>,
    pub synthesis: String,
    pub created_at: DateTime<Utc>,
}

impl ResearchReport {
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Research: {}\n\n## Synthesis\n\n{}\n", self.topic, self.synthesis.trim());
        for analysis in &self.analyses {
            out.push_str(&format!("\n## {} ({})\n\n", analysis.persona, analysis.focus));
            match &analysis.error {
                Some(e) => out.push_str(&format!("_Analysis failed: {}_\n", e)),
                None => out.push_str(&format!("{}\n", analysis.content.trim())),
            }
        }
        out
    }
}

/// Runs persona analyses sequentially and synthesizes them.
pub struct ResearchAnalyzer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<Prompts>,
    inter_call_delay: Duration,
    default_personas: Vec<String>,
    persona_max_tokens: u32,
    synthesis_max_tokens: u32,
    temperature: f32,
}

impl ResearchAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<Prompts>) -> Self {
        Self {
            llm,
            prompts,
            inter_call_delay: Duration::from_millis(1500),
            default_personas: Vec::new(),
            persona_max_tokens: 1500,
            synthesis_max_tokens: 3000,
            temperature: 0.7,
        }
    }

    /// Pause between consecutive LLM calls.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.inter_call_delay = delay;
        self
    }

    /// Personas used when a request names none.
    pub fn with_default_personas(mut self, personas: Vec<String>) -> Self {
        self.default_personas = personas;
        self
    }

    pub fn with_max_tokens(mut self, persona: u32, synthesis: u32) -> Self {
        self.persona_max_tokens = persona;
        self.synthesis_max_tokens = synthesis;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn select_personas(&self, requested: &[String]) -> Result<Vec<Persona>> {
        let names: &[String] = if requested.is_empty() {
            &self.default_personas
        } else {
            requested
        };

        if names.is_empty() {
            return Ok(self.prompts.research.personas.clone());
        }

        names
            .iter()
            .map(|name| {
                self.prompts.research.persona(name).cloned().ok_or_else(|| {
                    let known: Vec<&str> = self
                        .prompts
                        .research
                        .personas
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect();
                    ScholarError::InvalidInput(format!(
                        "Unknown persona '{}'. Known personas: {}",
                        name,
                        known.join(", ")
                    ))
                })
            })
            .collect()
    }

    /// Analyze a topic with each selected persona, then synthesize.
    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn analyze(&self, request: &ResearchRequest) -> Result<ResearchReport> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(ScholarError::InvalidInput("Research topic is empty".to_string()));
        }
        let personas = self.select_personas(&request.personas)?;
        if personas.is_empty() {
            return Err(ScholarError::Config("No research personas configured".to_string()));
        }

        let context = match request.context.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => format!("Background material:\n{}", text),
            _ => String::new(),
        };

        info!("Researching '{}' with {} personas", topic, personas.len());

        let mut analyses = Vec::with_capacity(personas.len());
        for (i, persona) in personas.iter().enumerate() {
            if i > 0 && !self.inter_call_delay.is_zero() {
                tokio::time::sleep(self.inter_call_delay).await;
            }
            analyses.push(self.run_persona(persona, topic, &context).await);
        }

        let succeeded: Vec<&PersonaAnalysis> = analyses.iter().filter(|a| a.succeeded()).collect();
        if succeeded.is_empty() {
            let reasons: Vec<String> = analyses
                .iter()
                .filter_map(|a| a.error.as_ref().map(|e| format!("{}: {}", a.persona, e)))
                .collect();
            return Err(ScholarError::Llm(format!(
                "every persona analysis failed ({})",
                reasons.join("; ")
            )));
        }

        let analyses_text = succeeded
            .iter()
            .map(|a| format!("### {} ({})\n\n{}", a.persona, a.focus, a.content.trim()))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), topic.to_string());
        vars.insert("analyses".to_string(), analyses_text);

        if !self.inter_call_delay.is_zero() {
            tokio::time::sleep(self.inter_call_delay).await;
        }

        let research = &self.prompts.research;
        let synthesis_request = CompletionRequest::new(
            self.prompts.render_with_custom(&research.synthesis_system, &vars),
            self.prompts.render_with_custom(&research.synthesis_user, &vars),
        )
        .with_max_tokens(self.synthesis_max_tokens)
        .with_temperature(self.temperature);

        let synthesis = self.llm.complete(&synthesis_request).await?.text;

        info!(
            "Research on '{}' done: {}/{} personas succeeded",
            topic,
            succeeded.len(),
            analyses.len()
        );

        Ok(ResearchReport {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            analyses,
            synthesis,
            created_at: Utc::now(),
        })
    }

    async fn run_persona(&self, persona: &Persona, topic: &str, context: &str) -> PersonaAnalysis {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), topic.to_string());
        vars.insert("context".to_string(), context.to_string());
        vars.insert("focus".to_string(), persona.focus.clone());

        let request = CompletionRequest::new(
            self.prompts.render_with_custom(&persona.system, &vars),
            self.prompts.render_with_custom(&self.prompts.research.persona_user, &vars),
        )
        .with_max_tokens(self.persona_max_tokens)
        .with_temperature(self.temperature);

        match self.llm.complete(&request).await {
            Ok(completion) => PersonaAnalysis {
                persona: persona.name.clone(),
                focus: persona.focus.clone(),
                content: completion.text,
                error: None,
            },
            Err(e) => {
                warn!("Persona {} failed: {}", persona.name, e);
                PersonaAnalysis {
                    persona: persona.name.clone(),
                    focus: persona.focus.clone(),
                    content: String::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Search the topic first and use a digest of the top results as context.
    pub async fn analyze_with_search(
        &self,
        search: &SearchOrchestrator,
        mut request: ResearchRequest,
    ) -> Result<ResearchReport> {
        let report = search.search(&request.topic).await?;
        let digest = report.digest(SEARCH_CONTEXT_RESULTS);
        if !digest.is_empty() {
            request.context = Some(match request.context.take() {
                Some(existing) if !existing.trim().is_empty() => format!("{}\n\n{}", existing.trim(), digest),
                _ => digest,
            });
        }
        self.analyze(&request).await
    }
}
