//! Mermaid diagrams.

use super::coerce::{extract_json, first_fenced_block, str_field, strip_code_fence};
use crate::error::{Result, ScholarError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    #[default]
    Flowchart,
    Mindmap,
    Timeline,
    Sequence,
}

impl DiagramKind {
    /// Mermaid header line for this kind.
    pub fn header(&self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "flowchart TD",
            DiagramKind::Mindmap => "mindmap",
            DiagramKind::Timeline => "timeline",
            DiagramKind::Sequence => "sequenceDiagram",
        }
    }

    /// Infer the kind from the first keyword of Mermaid code.
    fn from_code(code: &str) -> Option<Self> {
        let first = code.split_whitespace().next()?;
        match first {
            "flowchart" | "graph" => Some(DiagramKind::Flowchart),
            "mindmap" => Some(DiagramKind::Mindmap),
            "timeline" => Some(DiagramKind::Timeline),
            "sequenceDiagram" => Some(DiagramKind::Sequence),
            _ => None,
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Mindmap => "mindmap",
            DiagramKind::Timeline => "timeline",
            DiagramKind::Sequence => "sequence",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DiagramKind {
    type Err = ScholarError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flowchart" | "flow" | "graph" => Ok(DiagramKind::Flowchart),
            "mindmap" | "mind-map" | "mind_map" => Ok(DiagramKind::Mindmap),
            "timeline" => Ok(DiagramKind::Timeline),
            "sequence" | "sequencediagram" => Ok(DiagramKind::Sequence),
            other => Err(ScholarError::InvalidInput(format!(
                "Unknown diagram kind '{}'. Use flowchart, mindmap, timeline or sequence.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagram {
    pub title: String,
    /// Named apart from the `kind` tag that `Material` serializes.
    pub diagram_kind: DiagramKind,
    pub mermaid: String,
}

/// Coerce a reply that is either `{"title", "mermaid"}` JSON or raw Mermaid.
pub fn coerce_diagram(reply: &str, topic: &str, requested: DiagramKind) -> Result<Diagram> {
    let (title, code) = match extract_json(reply) {
        Ok(serde_json::Value::Object(obj)) => (
            str_field(&obj, &["title", "name"]),
            str_field(&obj, &["mermaid", "code", "diagram", "chart"]).unwrap_or_default(),
        ),
        _ => (None, first_fenced_block(reply).unwrap_or_else(|| reply.to_string())),
    };

    let code = strip_code_fence(&code);
    if code.is_empty() {
        return Err(ScholarError::Parse("diagram reply has no Mermaid code".to_string()));
    }

    let (diagram_kind, mermaid) = match DiagramKind::from_code(&code) {
        Some(kind) => (kind, code),
        None => (requested, format!("{}\n{}", requested.header(), code)),
    };

    Ok(Diagram {
        title: title.unwrap_or_else(|| format!("Diagram: {}", topic)),
        diagram_kind,
        mermaid,
    })
}

impl Diagram {
    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n```mermaid\n{}\n```\n", self.title, self.mermaid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_reply() {
        let reply = r#"{"title": "Water cycle", "mermaid": "flowchart LR\n  A[Evaporation] --> B[Condensation]"}"#;
        let diagram = coerce_diagram(reply, "water", DiagramKind::Flowchart).unwrap();
        assert_eq!(diagram.title, "Water cycle");
        assert!(diagram.mermaid.starts_with("flowchart LR"));
    }

    #[test]
    fn test_raw_fenced_mermaid_keeps_its_own_kind() {
        let reply = "```mermaid\nmindmap\n  root((Cells))\n```";
        let diagram = coerce_diagram(reply, "cells", DiagramKind::Flowchart).unwrap();
        assert_eq!(diagram.diagram_kind, DiagramKind::Mindmap);
        assert_eq!(diagram.mermaid, "mindmap\n  root((Cells))");
        assert_eq!(diagram.title, "Diagram: cells");
    }

    #[test]
    fn test_fenced_block_inside_prose() {
        let reply = "Here is your diagram:\n\n```mermaid\nflowchart LR\n  A[Sun] --> B[Leaf]\n```\n\nLet me know!";
        let diagram = coerce_diagram(reply, "light", DiagramKind::Mindmap).unwrap();
        assert_eq!(diagram.diagram_kind, DiagramKind::Flowchart);
        assert_eq!(diagram.mermaid, "flowchart LR\n  A[Sun] --> B[Leaf]");

        let reply = "Sure.\n```\nroot((Cells))\n```";
        let diagram = coerce_diagram(reply, "cells", DiagramKind::Mindmap).unwrap();
        assert_eq!(diagram.mermaid, "mindmap\nroot((Cells))");
    }

    #[test]
    fn test_header_prepended_when_missing() {
        let reply = r#"{"mermaid": "A[Start] --> B[End]"}"#;
        let diagram = coerce_diagram(reply, "t", DiagramKind::Flowchart).unwrap();
        assert_eq!(diagram.mermaid, "flowchart TD\nA[Start] --> B[End]");

        let diagram = coerce_diagram("  1776 : Declaration", "t", DiagramKind::Timeline).unwrap();
        assert_eq!(diagram.mermaid, "timeline\n1776 : Declaration");
    }

    #[test]
    fn test_empty_code_is_parse_error() {
        assert!(matches!(
            coerce_diagram(r#"{"title": "x"}"#, "t", DiagramKind::Mindmap),
            Err(ScholarError::Parse(_))
        ));
        assert!(matches!(
            coerce_diagram("   ", "t", DiagramKind::Mindmap),
            Err(ScholarError::Parse(_))
        ));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Mind-Map".parse::<DiagramKind>().unwrap(), DiagramKind::Mindmap);
        assert_eq!("sequence".parse::<DiagramKind>().unwrap(), DiagramKind::Sequence);
        assert!("pie".parse::<DiagramKind>().is_err());
    }
}
