//! Vocabulary lists.

use super::coerce::{as_text, item_array, str_field};
use crate::error::{Result, ScholarError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VocabularyList {
    pub topic: String,
    pub terms: Vec<VocabularyTerm>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VocabularyTerm {
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub part_of_speech: Option<String>,
}

const TERM_KEYS: &[&str] = &["term", "word", "name", "vocabulary"];
const DEFINITION_KEYS: &[&str] = &["definition", "meaning", "description", "def"];

fn parse_term(value: &Value) -> Option<VocabularyTerm> {
    let obj = value.as_object()?;
    Some(VocabularyTerm {
        term: str_field(obj, TERM_KEYS)?,
        definition: str_field(obj, DEFINITION_KEYS)?,
        example: str_field(obj, &["example", "example_sentence", "usage", "sentence"]),
        part_of_speech: str_field(obj, &["part_of_speech", "pos", "type"]),
    })
}

/// `{"photosynthesis": "the process ..."}` or `{"photosynthesis": {"definition": ...}}`.
fn parse_term_map(obj: &Map<String, Value>) -> Vec<VocabularyTerm> {
    obj.iter()
        .filter_map(|(term, value)| {
            let term = term.trim();
            if term.is_empty() || term == "topic" || term == "title" {
                return None;
            }
            match value {
                Value::Object(inner) => Some(VocabularyTerm {
                    term: term.to_string(),
                    definition: str_field(inner, DEFINITION_KEYS)?,
                    example: str_field(inner, &["example", "usage", "sentence"]),
                    part_of_speech: str_field(inner, &["part_of_speech", "pos"]),
                }),
                other => as_text(other).map(|definition| VocabularyTerm {
                    term: term.to_string(),
                    definition,
                    example: None,
                    part_of_speech: None,
                }),
            }
        })
        .collect()
}

/// Coerce a model reply into a vocabulary list.
pub fn coerce_vocabulary(value: &Value, topic: &str) -> Result<VocabularyList> {
    let candidates: Vec<VocabularyTerm> =
        match item_array(value, &["terms", "vocabulary", "words", "glossary"]) {
            Some(items) => items.iter().filter_map(parse_term).collect(),
            None => match value {
                Value::Object(obj) => {
                    let nested = ["terms", "vocabulary", "words", "glossary"]
                        .iter()
                        .find_map(|key| obj.get(*key).and_then(Value::as_object));
                    parse_term_map(nested.unwrap_or(obj))
                }
                _ => Vec::new(),
            },
        };

    let mut seen = HashSet::new();
    let terms: Vec<VocabularyTerm> = candidates
        .into_iter()
        .filter(|t| seen.insert(t.term.to_lowercase()))
        .collect();

    if terms.is_empty() {
        return Err(ScholarError::Parse("vocabulary reply has no usable terms".to_string()));
    }

    let topic = value
        .as_object()
        .and_then(|obj| str_field(obj, &["topic"]))
        .unwrap_or_else(|| topic.to_string());

    Ok(VocabularyList { topic, terms })
}

impl VocabularyList {
    pub fn title(&self) -> String {
        format!("Vocabulary: {}", self.topic)
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n\n", self.title());
        for term in &self.terms {
            match &term.part_of_speech {
                Some(pos) => out.push_str(&format!("**{}** _({})_: {}\n", term.term, pos, term.definition)),
                None => out.push_str(&format!("**{}**: {}\n", term.term, term.definition)),
            }
            if let Some(example) = &term.example {
                out.push_str(&format!("> {}\n", example));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_with_aliases_and_dedupe() {
        let value = json!({"vocabulary": [
            {"word": "Osmosis", "meaning": "Diffusion of water", "pos": "noun"},
            {"term": "osmosis", "definition": "duplicate"},
            {"term": "Solute", "definition": "What gets dissolved", "example": "Salt is a solute."},
            {"term": "Missing definition"}
        ]});
        let list = coerce_vocabulary(&value, "cells").unwrap();
        assert_eq!(list.topic, "cells");
        assert_eq!(list.terms.len(), 2);
        assert_eq!(list.terms[0].definition, "Diffusion of water");
        assert_eq!(list.terms[0].part_of_speech.as_deref(), Some("noun"));
        assert_eq!(list.terms[1].example.as_deref(), Some("Salt is a solute."));
    }

    #[test]
    fn test_term_map() {
        let value = json!({"Mitosis": "Cell division", "Meiosis": {"definition": "Reduction division"}});
        let list = coerce_vocabulary(&value, "division").unwrap();
        let mut terms: Vec<&str> = list.terms.iter().map(|t| t.term.as_str()).collect();
        terms.sort();
        assert_eq!(terms, vec!["Meiosis", "Mitosis"]);
    }

    #[test]
    fn test_nested_term_map() {
        let value = json!({"topic": "Atoms", "terms": {"Atom": "Smallest unit of an element"}});
        let list = coerce_vocabulary(&value, "chemistry").unwrap();
        assert_eq!(list.topic, "Atoms");
        assert_eq!(list.terms.len(), 1);
        assert_eq!(list.terms[0].term, "Atom");
    }

    #[test]
    fn test_empty_is_parse_error() {
        assert!(matches!(coerce_vocabulary(&json!([]), "t"), Err(ScholarError::Parse(_))));
        assert!(matches!(coerce_vocabulary(&json!("text"), "t"), Err(ScholarError::Parse(_))));
    }

    #[test]
    fn test_markdown() {
        let list = coerce_vocabulary(&json!([{"term": "A", "definition": "B", "example": "C"}]), "t").unwrap();
        let md = list.to_markdown();
        assert!(md.starts_with("# Vocabulary: t"));
        assert!(md.contains("**A**: B"));
        assert!(md.contains("> C"));
    }
}
