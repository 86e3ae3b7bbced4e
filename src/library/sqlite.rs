//! SQLite-backed library.
//!
//! Materials and reports are stored as JSON payloads next to a few indexed
//! columns used for listing.

use super::{Library, SavedMaterial};
use crate::error::{Result, ScholarError};
use crate::materials::{Material, MaterialKind};
use crate::research::ResearchReport;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS materials (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    topic TEXT NOT NULL,
    source TEXT,
    material_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_materials_kind ON materials(kind);
CREATE INDEX IF NOT EXISTS idx_materials_created_at ON materials(created_at);

CREATE TABLE IF NOT EXISTS reports (
    id TEXT PRIMARY KEY,
    topic TEXT NOT NULL,
    report_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Raw `materials` row before JSON decoding.
struct MaterialRow {
    id: String,
    kind: String,
    title: String,
    topic: String,
    source: Option<String>,
    material_json: String,
    created_at: String,
}

impl MaterialRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            title: row.get(2)?,
            topic: row.get(3)?,
            source: row.get(4)?,
            material_json: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn decode(self) -> Result<SavedMaterial> {
        let material: Material = serde_json::from_str(&self.material_json).map_err(|e| {
            ScholarError::Library(format!("Corrupt material {}: {}", self.id, e))
        })?;
        Ok(SavedMaterial {
            id: parse_id(&self.id)?,
            kind: self.kind.parse()?,
            title: self.title,
            topic: self.topic,
            source: self.source,
            material,
            created_at: parse_time(&self.created_at),
        })
    }
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|e| ScholarError::Library(format!("Invalid id {}: {}", id, e)))
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub struct SqliteLibrary {
    conn: Mutex<Connection>,
}

impl SqliteLibrary {
    /// Open (or create) a library database.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened library at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ScholarError::Library(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl Library for SqliteLibrary {
    #[instrument(skip(self, material), fields(id = %material.id))]
    async fn save_material(&self, material: &SavedMaterial) -> Result<()> {
        let conn = self.lock()?;
        let material_json = serde_json::to_string(&material.material)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO materials
            (id, kind, title, topic, source, material_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                material.id.to_string(),
                material.kind.as_str(),
                material.title,
                material.topic,
                material.source,
                material_json,
                material.created_at.to_rfc3339(),
            ],
        )?;

        debug!("Saved {} {}", material.kind, material.id);
        Ok(())
    }

    async fn get_material(&self, id: Uuid) -> Result<Option<SavedMaterial>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                r#"
                SELECT id, kind, title, topic, source, material_json, created_at
                FROM materials WHERE id = ?1
                "#,
                params![id.to_string()],
                MaterialRow::from_row,
            )
            .optional()?;

        row.map(MaterialRow::decode).transpose()
    }

    async fn list_materials(&self, kind: Option<MaterialKind>) -> Result<Vec<SavedMaterial>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, kind, title, topic, source, material_json, created_at
            FROM materials
            WHERE ?1 IS NULL OR kind = ?1
            ORDER BY created_at DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![kind.map(|k| k.as_str())], MaterialRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(MaterialRow::decode).collect()
    }

    #[instrument(skip(self))]
    async fn delete_material(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM materials WHERE id = ?1", params![id.to_string()])?;
        if deleted > 0 {
            info!("Deleted material {}", id);
        }
        Ok(deleted > 0)
    }

    #[instrument(skip(self, report), fields(id = %report.id))]
    async fn save_report(&self, report: &ResearchReport) -> Result<()> {
        let conn = self.lock()?;
        let report_json = serde_json::to_string(report)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO reports (id, topic, report_json, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                report.id.to_string(),
                report.topic,
                report_json,
                report.created_at.to_rfc3339(),
            ],
        )?;

        debug!("Saved research report {}", report.id);
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<ResearchReport>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT report_json FROM reports WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|j| {
            serde_json::from_str(&j)
                .map_err(|e| ScholarError::Library(format!("Corrupt report {}: {}", id, e)))
        })
        .transpose()
    }

    async fn list_reports(&self) -> Result<Vec<ResearchReport>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT report_json FROM reports ORDER BY created_at DESC")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.iter()
            .map(|j| {
                serde_json::from_str(j)
                    .map_err(|e| ScholarError::Library(format!("Corrupt report: {}", e)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::{exercise_library, sample_quiz};

    #[tokio::test]
    async fn test_sqlite_library() {
        let library = SqliteLibrary::in_memory().unwrap();
        exercise_library(&library).await;
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("library.db");

        let saved = SavedMaterial::new("arithmetic", sample_quiz("Sums"));
        {
            let library = SqliteLibrary::new(&path).unwrap();
            library.save_material(&saved).await.unwrap();
        }

        let library = SqliteLibrary::new(&path).unwrap();
        let fetched = library.get_material(saved.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Sums");
        assert_eq!(fetched.material, saved.material);
        assert_eq!(fetched.created_at, saved.created_at);
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_library_error() {
        let library = SqliteLibrary::in_memory().unwrap();
        let id = Uuid::new_v4();
        library
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO materials VALUES (?1, 'quiz', 't', 't', NULL, 'not json', ?2)",
                params![id.to_string(), Utc::now().to_rfc3339()],
            )
            .unwrap();

        assert!(matches!(
            library.get_material(id).await,
            Err(ScholarError::Library(_))
        ));
    }
}
