//! Multiple-choice quizzes.

use super::coerce::{as_text, field, item_array, str_field};
use crate::error::{Result, ScholarError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quiz {
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// 0-based index into `options`.
    pub answer_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    pub fn answer(&self) -> &str {
        &self.options[self.answer_index]
    }
}

fn option_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\(?([A-Za-z])[\).:]\s+").expect("valid label regex"))
}

/// Strip an "A) " / "b. " / "(C) " label from an option.
fn strip_label(option: &str) -> String {
    option_label_regex().replace(option.trim(), "").trim().to_string()
}

fn letter_index(text: &str) -> Option<usize> {
    let mut chars = text.trim().chars();
    let c = chars.next()?;
    let rest = chars.as_str().trim_matches(|c: char| c == ')' || c == '.' || c == ':');
    (c.is_ascii_alphabetic() && rest.is_empty())
        .then(|| (c.to_ascii_uppercase() as u8 - b'A') as usize)
}

fn parse_options(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => str_field(obj, &["text", "option", "label", "value"]),
                other => as_text(other),
            })
            .map(|o| strip_label(&o))
            .filter(|o| !o.is_empty())
            .collect(),
        // {"A": "...", "B": "..."}
        Value::Object(obj) => {
            let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries
                .into_iter()
                .filter_map(|(_, v)| as_text(v))
                .map(|o| strip_label(&o))
                .filter(|o| !o.is_empty())
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Resolve the answer as option text, then a letter, then a 0-based index.
///
/// Option text goes first: in numeric or single-letter quizzes the answer
/// "3" or "x" names an option, not a position.
fn resolve_answer(value: &Value, options: &[String]) -> Option<usize> {
    let index = match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => {
            let s = s.trim();
            let wanted = strip_label(s).to_lowercase();
            options
                .iter()
                .position(|o| o.to_lowercase() == wanted)
                .or_else(|| letter_index(s))
                .or_else(|| s.parse::<usize>().ok())
        }
        _ => None,
    }?;
    (index < options.len()).then_some(index)
}

/// "A".."Z", then 1-based numbers for very long option lists.
fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

fn parse_question(value: &Value) -> Option<QuizQuestion> {
    let obj = value.as_object()?;
    let question = str_field(obj, &["question", "prompt", "text", "q"])?;
    let options = field(obj, &["options", "choices", "answers"])
        .map(parse_options)
        .unwrap_or_default();
    if options.len() < 2 {
        return None;
    }
    let answer_index = field(
        obj,
        &["answer_index", "correct_index", "answer", "correct_answer", "correct", "correct_option"],
    )
    .and_then(|v| resolve_answer(v, &options))?;

    Some(QuizQuestion {
        question,
        options,
        answer_index,
        explanation: str_field(obj, &["explanation", "rationale", "reason"]).unwrap_or_default(),
    })
}

/// Coerce a model reply into a quiz. Malformed questions are dropped.
pub fn coerce_quiz(value: &Value, topic: &str) -> Result<Quiz> {
    let items = item_array(value, &["questions", "quiz", "items"])
        .ok_or_else(|| ScholarError::Parse("quiz reply has no question list".to_string()))?;

    let questions: Vec<QuizQuestion> = items.iter().filter_map(parse_question).collect();
    if questions.len() < items.len() {
        debug!("Dropped {} malformed quiz questions", items.len() - questions.len());
    }
    if questions.is_empty() {
        return Err(ScholarError::Parse("quiz reply has no usable questions".to_string()));
    }

    let title = value
        .as_object()
        .and_then(|obj| str_field(obj, &["title", "name"]))
        .unwrap_or_else(|| format!("Quiz: {}", topic));

    Ok(Quiz { title, questions })
}

impl Quiz {
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n", self.title);
        for (i, q) in self.questions.iter().enumerate() {
            out.push_str(&format!("\n## {}. {}\n\n", i + 1, q.question));
            for (j, option) in q.options.iter().enumerate() {
                out.push_str(&format!("- {}) {}\n", option_label(j), option));
            }
        }
        out.push_str("\n## Answer Key\n\n");
        for (i, q) in self.questions.iter().enumerate() {
            let letter = option_label(q.answer_index);
            if q.explanation.is_empty() {
                out.push_str(&format!("{}. {}\n", i + 1, letter));
            } else {
                out.push_str(&format!("{}. {} - {}\n", i + 1, letter, q.explanation));
            }
        }
        out
    }
}
