//! Mapping Store boundary.
//!
//! The store is the only shared resource in the engine. Reads hand out
//! snapshots; learns are append-only and applied atomically per
//! `(survey_source, raw_value)` key, so concurrent learns on different keys
//! are independent and the second writer on the same key observes the
//! conflict instead of silently overwriting.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;

use survbench_model::{BenchError, EntityKind, Result, SourceEntry, TaxonomyTable};

use crate::resolver::ColumnTemplate;

/// Narrow interface the core uses to read and extend learned mappings.
pub trait MappingStore {
    /// Read-only snapshot of the mapping table for one kind.
    fn table(&self, kind: EntityKind) -> Result<TaxonomyTable>;

    /// Append a confirmed resolution.
    ///
    /// # Errors
    ///
    /// [`BenchError::Conflict`] when the `(survey_source, raw_value)` pair
    /// already resolves to a different canonical name.
    fn learn(&self, kind: EntityKind, standardized_name: &str, entry: SourceEntry) -> Result<()>;

    /// Previously saved column template for a survey source, if any.
    fn template(&self, survey_source: &str) -> Result<Option<ColumnTemplate>>;

    /// Persist a column template for reuse on the next upload.
    fn save_template(&self, template: &ColumnTemplate) -> Result<()>;
}

/// In-memory store; the default backing for interactive sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryMappingStore {
    tables: Mutex<BTreeMap<EntityKind, TaxonomyTable>>,
    templates: Mutex<BTreeMap<String, ColumnTemplate>>,
}

impl MemoryMappingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with previously loaded tables.
    #[must_use]
    pub fn with_tables(tables: impl IntoIterator<Item = TaxonomyTable>) -> Self {
        let tables: BTreeMap<EntityKind, TaxonomyTable> = tables
            .into_iter()
            .map(|table| (table.kind, table))
            .collect();
        Self {
            tables: Mutex::new(tables),
            templates: Mutex::new(BTreeMap::new()),
        }
    }

    /// Snapshot of every table, for persistence.
    pub fn all_tables(&self) -> Result<Vec<TaxonomyTable>> {
        let guard = self
            .tables
            .lock()
            .map_err(|_| BenchError::validation("mapping store lock poisoned"))?;
        Ok(guard.values().cloned().collect())
    }

    /// Snapshot of every saved template, for persistence.
    pub fn all_templates(&self) -> Result<Vec<ColumnTemplate>> {
        let guard = self
            .templates
            .lock()
            .map_err(|_| BenchError::validation("mapping store lock poisoned"))?;
        Ok(guard.values().cloned().collect())
    }
}

impl MappingStore for MemoryMappingStore {
    fn table(&self, kind: EntityKind) -> Result<TaxonomyTable> {
        let guard = self
            .tables
            .lock()
            .map_err(|_| BenchError::validation("mapping store lock poisoned"))?;
        Ok(guard
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| TaxonomyTable::new(kind)))
    }

    fn learn(&self, kind: EntityKind, standardized_name: &str, entry: SourceEntry) -> Result<()> {
        // The lock is held across lookup and append, which serializes
        // concurrent learns on the same key.
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| BenchError::validation("mapping store lock poisoned"))?;
        let table = guard
            .entry(kind)
            .or_insert_with(|| TaxonomyTable::new(kind));
        table.learn(standardized_name, entry, Utc::now())
    }

    fn template(&self, survey_source: &str) -> Result<Option<ColumnTemplate>> {
        let guard = self
            .templates
            .lock()
            .map_err(|_| BenchError::validation("mapping store lock poisoned"))?;
        Ok(guard.get(&template_key(survey_source)).cloned())
    }

    fn save_template(&self, template: &ColumnTemplate) -> Result<()> {
        let mut guard = self
            .templates
            .lock()
            .map_err(|_| BenchError::validation("mapping store lock poisoned"))?;
        guard.insert(template_key(&template.survey_source), template.clone());
        Ok(())
    }
}

fn template_key(survey_source: &str) -> String {
    survey_source.trim().to_lowercase()
}
