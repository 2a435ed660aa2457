//! Raw and normalized row types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One ingested record, keyed by raw header string.
///
/// Ephemeral: owned by the ingest pipeline until normalized. Kept on the
/// normalized row afterwards for traceability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub cells: BTreeMap<String, String>,
}

impl RawRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(header.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// A survey record after column resolution and taxonomy normalization.
///
/// Percentile fields use 0.0 as the absent-data value; a metric missing for
/// a row is a valid empty state, not a fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub specialty: String,
    pub provider_type: String,
    pub region: String,
    pub year: i32,
    pub survey_source: String,
    pub variable: String,
    /// Organization identifier when the source reports per-org rows.
    pub org_id: Option<String>,
    pub n_orgs: u32,
    pub n_incumbents: u32,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    /// Original raw row, for traceability.
    pub raw: RawRow,
}

impl NormalizedRow {
    /// True when all four percentiles are present, non-zero, and ordered
    /// `p25 <= p50 <= p75 <= p90`.
    #[must_use]
    pub fn percentiles_monotonic(&self) -> bool {
        let values = [self.p25, self.p50, self.p75, self.p90];
        if values.iter().any(|v| *v <= 0.0) {
            return false;
        }
        values.windows(2).all(|pair| pair[0] <= pair[1])
    }
}
