//! Well-formed CSV ingest feeding the normalization pipeline.
//!
//! Reads comma-delimited upload files into [`RawRow`]s, then applies a
//! completed column resolution and the taxonomy normalizer to produce
//! [`NormalizedRow`]s. Numeric parse failures in percentile and count
//! cells become the 0-valued absent-data state; a malformed year is a
//! validation error because it silently shifts benchmarks otherwise.

use std::path::Path;

use anyhow::Context;

use survbench_map::normalizer::normalize_value;
use survbench_map::resolver::ColumnResolution;
use survbench_map::store::MappingStore;
use survbench_model::{
    BenchError, CanonicalField, EntityKind, NormalizedRow, RawRow, Result, TaxonomyTable,
};

/// Headers and raw rows of one upload file.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Read a well-formed comma-delimited file into raw rows.
pub fn read_raw_table(path: impl AsRef<Path>) -> anyhow::Result<RawTable> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV: {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read headers: {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("Failed to read record: {}", path.display()))?;
        let row: RawRow = headers
            .iter()
            .cloned()
            .zip(record.iter().map(|cell| cell.trim().to_string()))
            .collect();
        rows.push(row);
    }
    tracing::debug!(path = %path.display(), rows = rows.len(), "raw table read");
    Ok(RawTable { headers, rows })
}

/// Defaults applied when an upload omits optional columns.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Survey source used when the upload has no source column.
    pub survey_source: String,
    /// Year used when the upload has no year column.
    pub default_year: i32,
}

/// Normalize raw rows through a completed column resolution.
///
/// # Errors
///
/// [`BenchError::Validation`] when the resolution left required fields
/// unresolved, or when a year cell is present but unparseable.
pub fn normalize_rows(
    table: &RawTable,
    resolution: &ColumnResolution,
    store: &dyn MappingStore,
    options: &NormalizeOptions,
) -> Result<Vec<NormalizedRow>> {
    resolution.require_complete()?;

    let specialty_table = store.table(EntityKind::Specialty)?;
    let provider_table = store.table(EntityKind::ProviderType)?;
    let region_table = store.table(EntityKind::Region)?;
    let variable_table = store.table(EntityKind::Variable)?;

    let mut rows = Vec::with_capacity(table.rows.len());
    for (index, raw) in table.rows.iter().enumerate() {
        let cell = |field: CanonicalField| -> Option<&str> {
            resolution
                .header_for(field)
                .and_then(|header| raw.get(header))
                .filter(|value| !value.is_empty())
        };

        let survey_source = cell(CanonicalField::SurveySource)
            .unwrap_or(options.survey_source.as_str())
            .to_string();
        let year = match cell(CanonicalField::Year) {
            Some(value) => value.parse::<i32>().map_err(|_| {
                BenchError::validation(format!("row {index}: unparseable year '{value}'"))
            })?,
            None => options.default_year,
        };

        let normalize = |field, kind, table: &TaxonomyTable| {
            cell(field)
                .map(|value| normalize_value(value, kind, &survey_source, table))
                .unwrap_or_default()
        };

        let specialty = normalize(CanonicalField::Specialty, EntityKind::Specialty, &specialty_table);
        let provider_type = normalize(
            CanonicalField::ProviderType,
            EntityKind::ProviderType,
            &provider_table,
        );
        let region = normalize(CanonicalField::Region, EntityKind::Region, &region_table);
        let variable = normalize(CanonicalField::Variable, EntityKind::Variable, &variable_table);

        rows.push(NormalizedRow {
            specialty,
            provider_type,
            region,
            year,
            survey_source,
            variable,
            org_id: cell(CanonicalField::OrgId).map(String::from),
            n_orgs: parse_count(cell(CanonicalField::NOrgs)),
            n_incumbents: parse_count(cell(CanonicalField::NIncumbents)),
            p25: parse_metric(cell(CanonicalField::P25)),
            p50: parse_metric(cell(CanonicalField::P50)),
            p75: parse_metric(cell(CanonicalField::P75)),
            p90: parse_metric(cell(CanonicalField::P90)),
            raw: raw.clone(),
        });
    }

    tracing::info!(rows = rows.len(), "normalized upload rows");
    Ok(rows)
}

/// Count cells: missing or unparseable means absent, never an error.
fn parse_count(cell: Option<&str>) -> u32 {
    cell.and_then(|value| strip_number(value).parse::<f64>().ok())
        .filter(|value| *value >= 0.0)
        .map(|value| value.round() as u32)
        .unwrap_or(0)
}

/// Metric cells: missing or unparseable is the 0-valued absent state.
fn parse_metric(cell: Option<&str>) -> f64 {
    cell.and_then(|value| strip_number(value).parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Drops currency symbols and thousands separators before parsing.
fn strip_number(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-'))
        .collect()
}
