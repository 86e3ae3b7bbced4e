//! Study material generation.
//!
//! Each kind renders its prompt pair, asks the LLM for JSON and coerces the
//! loosely-shaped reply into a typed structure.

pub mod coerce;
mod diagram;
mod lesson;
mod quiz;
mod vocabulary;

pub use diagram::{coerce_diagram, Diagram, DiagramKind};
pub use lesson::{coerce_lesson_plan, Activity, LessonPlan};
pub use quiz::{coerce_quiz, Quiz, QuizQuestion};
pub use vocabulary::{coerce_vocabulary, VocabularyList, VocabularyTerm};

use crate::config::{PromptPair, Prompts};
use crate::error::{Result, ScholarError};
use crate::llm::{CompletionRequest, LlmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const DEFAULT_QUIZ_QUESTIONS: u32 = 5;
const DEFAULT_VOCABULARY_TERMS: u32 = 10;
const MAX_COUNT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Quiz,
    LessonPlan,
    Vocabulary,
    Diagram,
}

impl MaterialKind {
    pub fn all() -> [MaterialKind; 4] {
        [
            MaterialKind::Quiz,
            MaterialKind::LessonPlan,
            MaterialKind::Vocabulary,
            MaterialKind::Diagram,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Quiz => "quiz",
            MaterialKind::LessonPlan => "lesson_plan",
            MaterialKind::Vocabulary => "vocabulary",
            MaterialKind::Diagram => "diagram",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MaterialKind {
    type Err = ScholarError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quiz" => Ok(MaterialKind::Quiz),
            "lesson" | "lesson_plan" | "lesson-plan" | "lessonplan" => Ok(MaterialKind::LessonPlan),
            "vocab" | "vocabulary" => Ok(MaterialKind::Vocabulary),
            "diagram" | "mermaid" => Ok(MaterialKind::Diagram),
            other => Err(ScholarError::InvalidInput(format!(
                "Unknown material kind '{}'. Use quiz, lesson, vocab or diagram.",
                other
            ))),
        }
    }
}

/// Input to a generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialRequest {
    pub topic: String,
    #[serde(default)]
    pub source_text: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    /// Number of questions or terms.
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub diagram_kind: Option<DiagramKind>,
}

impl MaterialRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = Some(source_text.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(ScholarError::InvalidInput("Topic is empty".to_string()));
        }
        if let Some(count) = self.count {
            if count == 0 || count > MAX_COUNT {
                return Err(ScholarError::InvalidInput(format!(
                    "count must be between 1 and {}",
                    MAX_COUNT
                )));
            }
        }
        Ok(())
    }

    fn variables(&self, kind: MaterialKind) -> HashMap<String, String> {
        let default_count = match kind {
            MaterialKind::Vocabulary => DEFAULT_VOCABULARY_TERMS,
            _ => DEFAULT_QUIZ_QUESTIONS,
        };
        let source = match self.source_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => format!("Base the material on this source:\n\"\"\"\n{}\n\"\"\"", text),
            _ => String::new(),
        };

        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), self.topic.trim().to_string());
        vars.insert(
            "grade_level".to_string(),
            self.grade_level.clone().unwrap_or_else(|| "general audience".to_string()),
        );
        vars.insert("count".to_string(), self.count.unwrap_or(default_count).to_string());
        vars.insert("source".to_string(), source);
        vars.insert(
            "diagram_kind".to_string(),
            self.diagram_kind.unwrap_or_default().to_string(),
        );
        vars
    }
}

/// A generated material of any kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    Quiz(Quiz),
    LessonPlan(LessonPlan),
    Vocabulary(VocabularyList),
    Diagram(Diagram),
}

impl Material {
    pub fn kind(&self) -> MaterialKind {
        match self {
            Material::Quiz(_) => MaterialKind::Quiz,
            Material::LessonPlan(_) => MaterialKind::LessonPlan,
            Material::Vocabulary(_) => MaterialKind::Vocabulary,
            Material::Diagram(_) => MaterialKind::Diagram,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Material::Quiz(q) => q.title.clone(),
            Material::LessonPlan(l) => l.title.clone(),
            Material::Vocabulary(v) => v.title(),
            Material::Diagram(d) => d.title.clone(),
        }
    }

    /// Replace the title, e.g. with the source video's title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        match self {
            Material::Quiz(q) => q.title = title,
            Material::LessonPlan(l) => l.title = title,
            Material::Vocabulary(v) => v.topic = title,
            Material::Diagram(d) => d.title = title,
        }
    }

    pub fn to_markdown(&self) -> String {
        match self {
            Material::Quiz(q) => q.to_markdown(),
            Material::LessonPlan(l) => l.to_markdown(),
            Material::Vocabulary(v) => v.to_markdown(),
            Material::Diagram(d) => d.to_markdown(),
        }
    }
}

/// Generates materials with an LLM.
pub struct MaterialGenerator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<Prompts>,
    max_tokens: u32,
    temperature: f32,
}

impl MaterialGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<Prompts>) -> Self {
        Self {
            llm,
            prompts,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn prompt_pair(&self, kind: MaterialKind) -> &PromptPair {
        match kind {
            MaterialKind::Quiz => &self.prompts.quiz,
            MaterialKind::LessonPlan => &self.prompts.lesson_plan,
            MaterialKind::Vocabulary => &self.prompts.vocabulary,
            MaterialKind::Diagram => &self.prompts.diagram,
        }
    }

    /// Generate one material.
    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn generate(&self, kind: MaterialKind, request: &MaterialRequest) -> Result<Material> {
        request.validate()?;

        let vars = request.variables(kind);
        let pair = self.prompt_pair(kind);
        let completion_request = CompletionRequest::new(
            self.prompts.render_with_custom(&pair.system, &vars),
            self.prompts.render_with_custom(&pair.user, &vars),
        )
        .with_max_tokens(self.max_tokens)
        .with_temperature(self.temperature);

        let completion = self.llm.complete(&completion_request).await?;
        debug!("{} reply: {} chars", kind, completion.text.len());

        let topic = request.topic.trim();
        let material = match kind {
            MaterialKind::Diagram => Material::Diagram(coerce_diagram(
                &completion.text,
                topic,
                request.diagram_kind.unwrap_or_default(),
            )?),
            _ => {
                let value = coerce::extract_json(&completion.text)?;
                match kind {
                    MaterialKind::Quiz => Material::Quiz(coerce_quiz(&value, topic)?),
                    MaterialKind::LessonPlan => Material::LessonPlan(coerce_lesson_plan(
                        &value,
                        topic,
                        request.grade_level.as_deref(),
                    )?),
                    _ => Material::Vocabulary(coerce_vocabulary(&value, topic)?),
                }
            }
        };

        info!("Generated {} '{}'", kind, material.title());
        Ok(material)
    }
}
