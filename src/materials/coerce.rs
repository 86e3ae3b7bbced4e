//! Helpers for pulling loosely-shaped JSON out of model replies.
//!
//! Models wrap JSON in prose or code fences and drift on key names, so
//! every lookup takes a list of accepted aliases.

use crate::error::{Result, ScholarError};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the language tag line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

/// Body of the first fenced code block anywhere in the text, whatever its language tag.
pub fn first_fenced_block(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let len = text[start + 3..].find("```")?;
    Some(strip_code_fence(&text[start..start + 3 + len + 3]))
}

/// Extract the first JSON object or array embedded in a reply.
pub fn extract_json(reply: &str) -> Result<Value> {
    let unfenced = strip_code_fence(reply);
    if let Ok(value) = serde_json::from_str::<Value>(&unfenced) {
        if value.is_object() || value.is_array() {
            return Ok(value);
        }
    }

    if let Some(block) = first_fenced_block(reply) {
        if let Ok(value) = serde_json::from_str::<Value>(&block) {
            return Ok(value);
        }
    }

    let object = span(reply, '{', '}');
    let array = span(reply, '[', ']');
    let mut candidates: Vec<(usize, &str)> = [object, array].into_iter().flatten().collect();
    candidates.sort_by_key(|(start, _)| *start);

    for (_, candidate) in candidates {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return Ok(value);
        }
    }

    Err(ScholarError::Parse(format!(
        "no JSON found in model reply: {}",
        preview(reply, 200)
    )))
}

fn span(text: &str, open: char, close: char) -> Option<(usize, &str)> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| (start, &text[start..=end]))
}

/// First `max` characters of a reply, for error messages.
pub fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// First present value among `aliases`.
pub fn field<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
}

/// Trimmed non-empty string (numbers and booleans are stringified).
pub fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

pub fn str_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    field(obj, aliases).and_then(as_text)
}

fn leading_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number regex"))
}

/// A number, or the first number inside a string such as `"45 minutes"`.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number_regex()
            .find(s)
            .and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

pub fn num_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    field(obj, aliases).and_then(as_number)
}

/// A list of strings from an array (of strings or `{text|name|title}` objects)
/// or from a single newline/semicolon separated string.
pub fn as_text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => str_field(obj, &["text", "name", "title", "description"]),
                other => as_text(other),
            })
            .collect(),
        Value::String(s) => s
            .split(['\n', ';'])
            .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn list_field(obj: &Map<String, Value>, aliases: &[&str]) -> Vec<String> {
    field(obj, aliases).map(as_text_list).unwrap_or_default()
}

/// Find the item array in a reply: the value itself, or the first alias key holding an array.
pub fn item_array<'a>(value: &'a Value, aliases: &[&str]) -> Option<&'a Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(obj) => aliases
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_plain_and_fenced() {
        assert_eq!(extract_json(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(extract_json("```json\n[1, 2]\n```").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_extract_from_prose() {
        let reply = r#"Here is your quiz:

```json
{"title": "Cells", "questions": []}
```

Let me know if you need changes."#;
        assert_eq!(extract_json(reply).unwrap()["title"], "Cells");

        let reply = r#"Sure! {"title": "Inline"} hope that helps"#;
        assert_eq!(extract_json(reply).unwrap()["title"], "Inline");
    }

    #[test]
    fn test_extract_prefers_earliest_container() {
        let reply = r#"Result: [{"term": "atom"}] done"#;
        assert!(extract_json(reply).unwrap().is_array());
    }

    #[test]
    fn test_extract_failure_is_parse_error() {
        assert!(matches!(extract_json("no json here"), Err(ScholarError::Parse(_))));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(as_number(&json!("45 minutes")), Some(45.0));
        assert_eq!(as_number(&json!(12)), Some(12.0));
        assert_eq!(as_number(&json!("about ten")), None);
    }

    #[test]
    fn test_text_list_from_string_and_objects() {
        assert_eq!(
            as_text_list(&json!("- Define a cell\n- Name two organelles; Draw a cell")),
            vec!["Define a cell", "Name two organelles", "Draw a cell"]
        );
        assert_eq!(
            as_text_list(&json!([{"name": "Worksheet"}, "Microscope", ""])),
            vec!["Worksheet", "Microscope"]
        );
    }

    #[test]
    fn test_field_skips_null_aliases() {
        let value = json!({"answer": null, "correct": 2});
        let obj = value.as_object().unwrap();
        assert_eq!(field(obj, &["answer", "correct"]), Some(&json!(2)));
    }

    #[test]
    fn test_first_fenced_block() {
        let text = "Intro\n```json\n{\"a\": 1}\n```\nthen\n```\nsecond\n```";
        assert_eq!(first_fenced_block(text).as_deref(), Some("{\"a\": 1}"));
        assert_eq!(first_fenced_block("no fences here"), None);
        assert_eq!(first_fenced_block("```unclosed"), None);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```mermaid\ngraph TD\nA-->B\n```"), "graph TD\nA-->B");
        assert_eq!(strip_code_fence("plain"), "plain");
    }
}
