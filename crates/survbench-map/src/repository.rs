//! File-system repository for learned mappings and column templates.
//!
//! Tables and templates are stored as JSON, one file per mapping table
//! (`table_{kind}.json`) and one per template (`template_{source}.json`).
//! The repository is the persistence edge of the Mapping Store boundary;
//! live resolution reads go through [`crate::store::MemoryMappingStore`]
//! snapshots loaded from here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use survbench_model::{EntityKind, TaxonomyTable};

use crate::resolver::ColumnTemplate;
use crate::store::MemoryMappingStore;

/// Directory-backed repository of mapping tables and templates.
#[derive(Debug, Clone)]
pub struct MappingRepository {
    base_dir: PathBuf,
}

/// A mapping table with repository metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTable {
    #[serde(flatten)]
    pub table: TaxonomyTable,
    pub saved_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
}

/// A column template with repository metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTemplate {
    #[serde(flatten)]
    pub template: ColumnTemplate,
    pub saved_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl MappingRepository {
    /// Create a repository at the given directory, creating it if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).with_context(|| {
            format!(
                "Failed to create mapping repository: {}",
                base_dir.display()
            )
        })?;
        Ok(Self { base_dir })
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Save a mapping table, overwriting the previous file for its kind.
    pub fn save_table(&self, table: &TaxonomyTable) -> Result<PathBuf> {
        let stored = StoredTable {
            table: table.clone(),
            saved_at: Utc::now(),
            version: default_version(),
        };
        let path = self.table_path(table.kind);
        let json = serde_json::to_string_pretty(&stored)
            .with_context(|| format!("Failed to serialize {} table", table.kind))?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write table to {}", path.display()))?;
        Ok(path)
    }

    /// Load the mapping table for a kind; `None` when never saved.
    pub fn load_table(&self, kind: EntityKind) -> Result<Option<TaxonomyTable>> {
        let path = self.table_path(kind);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read table from {}", path.display()))?;
        let stored: StoredTable = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse table from {}", path.display()))?;
        Ok(Some(stored.table))
    }

    /// Save a column template keyed by its survey source.
    pub fn save_template(&self, template: &ColumnTemplate) -> Result<PathBuf> {
        let stored = StoredTemplate {
            template: template.clone(),
            saved_at: Utc::now(),
            version: default_version(),
        };
        let path = self.template_path(&template.survey_source);
        let json = serde_json::to_string_pretty(&stored).with_context(|| {
            format!(
                "Failed to serialize template for {}",
                template.survey_source
            )
        })?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write template to {}", path.display()))?;
        Ok(path)
    }

    /// Load the column template for a survey source; `None` when absent.
    pub fn load_template(&self, survey_source: &str) -> Result<Option<ColumnTemplate>> {
        let path = self.template_path(survey_source);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read template from {}", path.display()))?;
        let stored: StoredTemplate = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse template from {}", path.display()))?;
        Ok(Some(stored.template))
    }

    /// Survey sources that have a saved template, sorted.
    pub fn list_template_sources(&self) -> Result<Vec<String>> {
        let mut sources = Vec::new();
        for entry in fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read repository: {}", self.base_dir.display()))?
        {
            let path = entry?.path();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if !name.starts_with("template_") || !name.ends_with(".json") {
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            if let Ok(stored) = serde_json::from_str::<StoredTemplate>(&contents) {
                sources.push(stored.template.survey_source);
            }
        }
        sources.sort();
        Ok(sources)
    }

    /// Load every saved table into a fresh in-memory store.
    pub fn load_store(&self) -> Result<MemoryMappingStore> {
        let mut tables = Vec::new();
        for kind in EntityKind::all() {
            if let Some(table) = self.load_table(*kind)? {
                tables.push(table);
            }
        }
        Ok(MemoryMappingStore::with_tables(tables))
    }

    /// Persist every table and template of an in-memory store.
    pub fn save_store(&self, store: &MemoryMappingStore) -> Result<()> {
        for table in store.all_tables().context("read store tables")? {
            self.save_table(&table)?;
        }
        for template in store.all_templates().context("read store templates")? {
            self.save_template(&template)?;
        }
        Ok(())
    }

    fn table_path(&self, kind: EntityKind) -> PathBuf {
        self.base_dir.join(format!("table_{}.json", kind.name()))
    }

    fn template_path(&self, survey_source: &str) -> PathBuf {
        self.base_dir
            .join(format!("template_{}.json", normalize_id(survey_source)))
    }
}

/// Normalize an identifier for use in filenames.
fn normalize_id(id: &str) -> String {
    id.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
