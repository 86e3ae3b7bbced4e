//! In-memory library.
//!
//! Useful for testing and for running the server without a database.

use super::{Library, SavedMaterial};
use crate::error::Result;
use crate::materials::MaterialKind;
use crate::research::ResearchReport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

pub struct MemoryLibrary {
    materials: RwLock<HashMap<Uuid, SavedMaterial>>,
    reports: RwLock<HashMap<Uuid, ResearchReport>>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self {
            materials: RwLock::new(HashMap::new()),
            reports: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Library for MemoryLibrary {
    async fn save_material(&self, material: &SavedMaterial) -> Result<()> {
        let mut materials = self.materials.write().unwrap();
        materials.insert(material.id, material.clone());
        Ok(())
    }

    async fn get_material(&self, id: Uuid) -> Result<Option<SavedMaterial>> {
        let materials = self.materials.read().unwrap();
        Ok(materials.get(&id).cloned())
    }

    async fn list_materials(&self, kind: Option<MaterialKind>) -> Result<Vec<SavedMaterial>> {
        let materials = self.materials.read().unwrap();
        let mut list: Vec<SavedMaterial> = materials
            .values()
            .filter(|m| kind.map_or(true, |k| m.kind == k))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn delete_material(&self, id: Uuid) -> Result<bool> {
        let mut materials = self.materials.write().unwrap();
        Ok(materials.remove(&id).is_some())
    }

    async fn save_report(&self, report: &ResearchReport) -> Result<()> {
        let mut reports = self.reports.write().unwrap();
        reports.insert(report.id, report.clone());
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<ResearchReport>> {
        let reports = self.reports.read().unwrap();
        Ok(reports.get(&id).cloned())
    }

    async fn list_reports(&self) -> Result<Vec<ResearchReport>> {
        let reports = self.reports.read().unwrap();
        let mut list: Vec<ResearchReport> = reports.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}
