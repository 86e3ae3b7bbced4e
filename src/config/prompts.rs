//! Prompt templates for Scholar.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A system/user prompt pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub quiz: PromptPair,
    pub lesson_plan: PromptPair,
    pub vocabulary: PromptPair,
    pub diagram: PromptPair,
    pub research: ResearchPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            quiz: default_quiz(),
            lesson_plan: default_lesson_plan(),
            vocabulary: default_vocabulary(),
            diagram: default_diagram(),
            research: ResearchPrompts::default(),
            variables: HashMap::new(),
        }
    }
}

fn default_quiz() -> PromptPair {
    PromptPair {
        system: r#"You are an experienced teacher who writes clear, fair multiple-choice assessments.

Rules:
- Every question has exactly one correct answer
- Distractors are plausible but unambiguously wrong
- Questions test understanding, not trivia about wording
- Explanations are one or two sentences

Respond only with JSON."#
            .to_string(),

        user: r#"Create a quiz of {{count}} multiple-choice questions about: {{topic}}
Audience: {{grade_level}}

{{source}}

Respond with a JSON object:
{
  "title": "Quiz title",
  "questions": [
    {"question": "...", "options": ["...", "...", "...", "..."], "answer_index": 0, "explanation": "..."}
  ]
}"#
        .to_string(),
    }
}

fn default_lesson_plan() -> PromptPair {
    PromptPair {
        system: r#"You are a curriculum designer who writes practical, classroom-ready lesson plans.

Plans have measurable objectives, a realistic timeline, and an assessment that checks the objectives.
Respond only with JSON."#
            .to_string(),

        user: r#"Write a lesson plan about: {{topic}}
Audience: {{grade_level}}

{{source}}

Respond with a JSON object:
{
  "title": "...",
  "grade_level": "...",
  "duration_minutes": 45,
  "objectives": ["..."],
  "materials": ["..."],
  "activities": [{"name": "...", "duration_minutes": 10, "description": "..."}],
  "assessment": "...",
  "differentiation": "..."
}"#
        .to_string(),
    }
}

fn default_vocabulary() -> PromptPair {
    PromptPair {
        system: r#"You are a language specialist who builds vocabulary lists for learners.

Definitions are short and written for the stated audience. Examples use the term in a full sentence.
Respond only with JSON."#
            .to_string(),

        user: r#"Build a vocabulary list of {{count}} key terms for: {{topic}}
Audience: {{grade_level}}

{{source}}

Respond with a JSON object:
{
  "terms": [
    {"term": "...", "definition": "...", "example": "...", "part_of_speech": "noun"}
  ]
}"#
        .to_string(),
    }
}

fn default_diagram() -> PromptPair {
    PromptPair {
        system: r#"You turn educational content into Mermaid diagrams.

Use only valid Mermaid syntax. Keep node labels short. Do not use HTML in labels.
Respond only with JSON."#
            .to_string(),

        user: r#"Create a Mermaid {{diagram_kind}} diagram that explains: {{topic}}

{{source}}

Respond with a JSON object:
{"title": "...", "mermaid": "..."}"#
            .to_string(),
    }
}

/// Prompts for multi-persona research.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchPrompts {
    /// User prompt sent to each persona.
    pub persona_user: String,
    pub synthesis_system: String,
    pub synthesis_user: String,
    pub personas: Vec<Persona>,
}

/// A named prompt template that biases the model toward one viewpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Persona {
    pub name: String,
    /// One-line description of what the persona looks for.
    pub focus: String,
    pub system: String,
}

impl Persona {
    fn new(name: &str, focus: &str, system: &str) -> Self {
        Self {
            name: name.to_string(),
            focus: focus.to_string(),
            system: system.to_string(),
        }
    }
}

impl Default for ResearchPrompts {
    fn default() -> Self {
        Self {
            persona_user: r#"Research topic: {{topic}}

{{context}}

From your perspective ({{focus}}), analyze this topic for someone preparing to teach it.
Give concrete findings, not generic advice. Use short sections with headings."#
                .to_string(),

            synthesis_system: r#"You are a research director. You merge several expert analyses into one coherent brief.

Resolve disagreements explicitly, remove repetition, and keep every concrete recommendation.
Write in Markdown."#
                .to_string(),

            synthesis_user: r#"Topic: {{topic}}

Expert analyses:

{{analyses}}

Write a synthesis with these sections: Key Findings, Teaching Recommendations, Common Misconceptions, Suggested Resources, Open Questions."#
                .to_string(),

            personas: vec![
                Persona::new(
                    "Master Teacher",
                    "classroom delivery and engagement",
                    "You are a master teacher with twenty years of classroom experience. You focus on how a topic lands with real students: hooks, pacing, examples that work, and where lessons usually stall.",
                ),
                Persona::new(
                    "Curriculum Designer",
                    "sequencing and standards alignment",
                    "You are a curriculum designer. You focus on prerequisite knowledge, the order in which ideas should be introduced, and how the topic connects to the rest of a course.",
                ),
                Persona::new(
                    "Subject Matter Expert",
                    "accuracy and depth",
                    "You are a subject matter expert. You focus on factual accuracy, the current state of knowledge, important nuances, and what simplified explanations tend to get wrong.",
                ),
                Persona::new(
                    "Student Advocate",
                    "learner perspective and accessibility",
                    "You represent the learner. You focus on what is confusing, what feels irrelevant, motivation, and how to make the material accessible to students with different needs.",
                ),
                Persona::new(
                    "Assessment Specialist",
                    "measuring understanding",
                    "You are an assessment specialist. You focus on what mastery looks like, which questions reveal misconceptions, and how to check understanding during and after a lesson.",
                ),
            ],
        }
    }
}

impl ResearchPrompts {
    /// Find a persona by name, ignoring case and surrounding whitespace.
    pub fn persona(&self, name: &str) -> Option<&Persona> {
        let wanted = name.trim().to_lowercase();
        self.personas.iter().find(|p| p.name.to_lowercase() == wanted)
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            if let Some(pair) = load_pair(&custom_path, "quiz.toml")? {
                prompts.quiz = pair;
            }
            if let Some(pair) = load_pair(&custom_path, "lesson_plan.toml")? {
                prompts.lesson_plan = pair;
            }
            if let Some(pair) = load_pair(&custom_path, "vocabulary.toml")? {
                prompts.vocabulary = pair;
            }
            if let Some(pair) = load_pair(&custom_path, "diagram.toml")? {
                prompts.diagram = pair;
            }

            let research_path = custom_path.join("research.toml");
            if research_path.exists() {
                let content = std::fs::read_to_string(&research_path)?;
                prompts.research = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

fn load_pair(dir: &std::path::Path, file: &str) -> crate::error::Result<Option<PromptPair>> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(Some(toml::from_str(&content)?))
}
