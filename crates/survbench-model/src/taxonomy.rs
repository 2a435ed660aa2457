//! Learned taxonomy mapping tables.
//!
//! A [`TaxonomyTable`] records confirmed resolutions of raw provider values
//! (specialty, provider type, region, variable) to canonical names. Two
//! invariants hold at all times:
//!
//! - a `(survey_source, raw_value)` pair resolves to exactly one
//!   standardized name, and
//! - standardized names are unique within one table.
//!
//! Learning appends; a pair that already resolves elsewhere yields
//! [`BenchError::Conflict`] and leaves the table unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// The taxonomy dimension a mapping table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Specialty,
    ProviderType,
    Region,
    Variable,
}

impl EntityKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Specialty => "specialty",
            Self::ProviderType => "provider_type",
            Self::Region => "region",
            Self::Variable => "variable",
        }
    }

    /// All kinds, in stable reporting order.
    #[must_use]
    pub fn all() -> &'static [EntityKind] {
        &[
            Self::Specialty,
            Self::ProviderType,
            Self::Region,
            Self::Variable,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One confirmed source-side spelling of a canonical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub survey_source: String,
    pub raw_value: String,
}

impl SourceEntry {
    pub fn new(survey_source: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            survey_source: survey_source.into(),
            raw_value: raw_value.into(),
        }
    }

    fn matches(&self, survey_source: &str, raw_value: &str) -> bool {
        key_eq(&self.survey_source, survey_source) && key_eq(&self.raw_value, raw_value)
    }
}

/// One canonical name and every source spelling confirmed to mean it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyMapping {
    pub standardized_name: String,
    pub source_entries: Vec<SourceEntry>,
    pub updated_at: DateTime<Utc>,
}

/// Mapping table for one [`EntityKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyTable {
    pub kind: EntityKind,
    mappings: Vec<TaxonomyMapping>,
}

impl TaxonomyTable {
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            mappings: Vec::new(),
        }
    }

    #[must_use]
    pub fn mappings(&self) -> &[TaxonomyMapping] {
        &self.mappings
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Exact learned lookup: trimmed, case-insensitive on both key parts.
    #[must_use]
    pub fn resolve(&self, survey_source: &str, raw_value: &str) -> Option<&str> {
        self.mappings.iter().find_map(|mapping| {
            mapping
                .source_entries
                .iter()
                .any(|entry| entry.matches(survey_source, raw_value))
                .then_some(mapping.standardized_name.as_str())
        })
    }

    /// Append a confirmed resolution of `(survey_source, raw_value)` to
    /// `standardized_name`, creating the mapping on first use.
    ///
    /// # Errors
    ///
    /// [`BenchError::Conflict`] when the pair already resolves to a
    /// different canonical name. Re-learning the same resolution is a no-op.
    pub fn learn(
        &mut self,
        standardized_name: &str,
        entry: SourceEntry,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let standardized_name = standardized_name.trim();
        if standardized_name.is_empty() {
            return Err(BenchError::validation("standardized name is empty"));
        }
        if let Some(existing) = self.resolve(&entry.survey_source, &entry.raw_value) {
            if key_eq(existing, standardized_name) {
                return Ok(());
            }
            return Err(BenchError::Conflict {
                kind: self.kind,
                survey_source: entry.survey_source,
                raw_value: entry.raw_value,
                existing: existing.to_string(),
                attempted: standardized_name.to_string(),
            });
        }
        match self
            .mappings
            .iter_mut()
            .find(|mapping| key_eq(&mapping.standardized_name, standardized_name))
        {
            Some(mapping) => {
                mapping.source_entries.push(entry);
                mapping.updated_at = now;
            }
            None => self.mappings.push(TaxonomyMapping {
                standardized_name: standardized_name.to_string(),
                source_entries: vec![entry],
                updated_at: now,
            }),
        }
        Ok(())
    }
}

fn key_eq(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learn_then_resolve_is_case_insensitive() {
        let mut table = TaxonomyTable::new(EntityKind::Specialty);
        table
            .learn(
                "Cardiology",
                SourceEntry::new("mgma", "CARDIOLOGY - GENERAL"),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(
            table.resolve("MGMA", " cardiology - general "),
            Some("Cardiology")
        );
    }

    #[test]
    fn conflicting_learn_leaves_table_unchanged() {
        let mut table = TaxonomyTable::new(EntityKind::ProviderType);
        table
            .learn("APP", SourceEntry::new("sourceX", "APP"), Utc::now())
            .unwrap();
        let err = table
            .learn("Physician", SourceEntry::new("sourceX", "APP"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, BenchError::Conflict { .. }));
        assert_eq!(table.resolve("sourceX", "APP"), Some("APP"));
    }

    #[test]
    fn relearning_same_resolution_is_noop() {
        let mut table = TaxonomyTable::new(EntityKind::Region);
        let t0 = Utc::now();
        table
            .learn("Western", SourceEntry::new("amga", "West"), t0)
            .unwrap();
        table
            .learn("western", SourceEntry::new("AMGA", "west"), Utc::now())
            .unwrap();
        assert_eq!(table.mappings().len(), 1);
        assert_eq!(table.mappings()[0].source_entries.len(), 1);
    }

    #[test]
    fn second_source_appends_to_existing_mapping() {
        let mut table = TaxonomyTable::new(EntityKind::Specialty);
        table
            .learn("Cardiology", SourceEntry::new("mgma", "Cardiology"), Utc::now())
            .unwrap();
        table
            .learn(
                "Cardiology",
                SourceEntry::new("sullivan", "Cardiology (Noninvasive)"),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(table.mappings().len(), 1);
        assert_eq!(table.mappings()[0].source_entries.len(), 2);
    }
}
