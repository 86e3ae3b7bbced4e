//! Saved materials and research reports.
//!
//! Provides a trait-based interface so the server and CLI can run against
//! SQLite on disk or an in-memory store in tests.

mod memory;
mod sqlite;

pub use memory::MemoryLibrary;
pub use sqlite::SqliteLibrary;

use crate::error::Result;
use crate::materials::{Material, MaterialKind};
use crate::research::ResearchReport;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated material kept in the library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedMaterial {
    pub id: Uuid,
    pub kind: MaterialKind,
    pub title: String,
    pub topic: String,
    /// Where the material came from, e.g. a video URL.
    #[serde(default)]
    pub source: Option<String>,
    pub material: Material,
    pub created_at: DateTime<Utc>,
}

impl SavedMaterial {
    pub fn new(topic: impl Into<String>, material: Material) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: material.kind(),
            title: material.title(),
            topic: topic.into(),
            source: None,
            material,
            created_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Storage backend for the library.
#[async_trait]
pub trait Library: Send + Sync {
    async fn save_material(&self, material: &SavedMaterial) -> Result<()>;

    async fn get_material(&self, id: Uuid) -> Result<Option<SavedMaterial>>;

    /// Newest first, optionally restricted to one kind.
    async fn list_materials(&self, kind: Option<MaterialKind>) -> Result<Vec<SavedMaterial>>;

    /// Returns whether anything was deleted.
    async fn delete_material(&self, id: Uuid) -> Result<bool>;

    async fn save_report(&self, report: &ResearchReport) -> Result<()>;

    async fn get_report(&self, id: Uuid) -> Result<Option<ResearchReport>>;

    /// Newest first.
    async fn list_reports(&self) -> Result<Vec<ResearchReport>>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::materials::{Diagram, DiagramKind, Quiz, QuizQuestion};
    use crate::research::PersonaAnalysis;

    pub(crate) fn sample_quiz(title: &str) -> Material {
        Material::Quiz(Quiz {
            title: title.to_string(),
            questions: vec![QuizQuestion {
                question: "1 + 1?".to_string(),
                options: vec!["1".to_string(), "2".to_string()],
                answer_index: 1,
                explanation: String::new(),
            }],
        })
    }

    pub(crate) fn sample_report(topic: &str) -> ResearchReport {
        ResearchReport {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            analyses: vec![PersonaAnalysis {
                persona: "Master Teacher".to_string(),
                focus: "delivery".to_string(),
                content: "Start concrete.".to_string(),
                error: None,
            }],
            synthesis: "Brief".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Behaviour every backend must share.
    pub(crate) async fn exercise_library(library: &dyn Library) {
        let mut older = SavedMaterial::new("arithmetic", sample_quiz("Older"));
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        let newer = SavedMaterial::new(
            "cells",
            Material::Diagram(Diagram {
                title: "Cell".to_string(),
                diagram_kind: DiagramKind::Mindmap,
                mermaid: "mindmap\n  root((Cell))".to_string(),
            }),
        )
        .with_source("https://www.youtube.com/watch?v=abcdefghijk");

        library.save_material(&older).await.unwrap();
        library.save_material(&newer).await.unwrap();

        let all = library.list_materials(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].title, "Older");

        let quizzes = library.list_materials(Some(MaterialKind::Quiz)).await.unwrap();
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].material, older.material);

        let fetched = library.get_material(newer.id).await.unwrap().unwrap();
        assert_eq!(fetched.source, newer.source);
        assert_eq!(fetched.kind, MaterialKind::Diagram);
        assert!(library.get_material(Uuid::new_v4()).await.unwrap().is_none());

        assert!(library.delete_material(older.id).await.unwrap());
        assert!(!library.delete_material(older.id).await.unwrap());
        assert_eq!(library.list_materials(None).await.unwrap().len(), 1);

        let report = sample_report("fractions");
        library.save_report(&report).await.unwrap();
        assert_eq!(library.get_report(report.id).await.unwrap(), Some(report.clone()));
        assert_eq!(library.list_reports().await.unwrap().len(), 1);
        assert!(library.get_report(Uuid::new_v4()).await.unwrap().is_none());
    }
}
