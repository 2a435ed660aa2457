//! Mapping Coverage Analyzer.
//!
//! Summarizes, after auto-mapping, what fraction of the distinct raw
//! values observed in an upload resolve through confirmed mappings. A raw
//! value counts as mapped only when the normalizer's learned lookup
//! resolves it; heuristic and title-case fallbacks produced *some* string
//! but not a confirmed decision, so they count as unmapped. Pure function
//! of its inputs; never mutates the tables.

use std::collections::BTreeSet;

use survbench_model::{CoverageReport, CoverageResult, EntityKind, TaxonomyTable};

use crate::normalizer::{ResolutionRule, resolve_value};

/// Analyze resolution confidence for one entity kind.
///
/// `raw_values` may contain duplicates; distinct values are counted once.
#[must_use]
pub fn analyze_coverage(
    raw_values: &[String],
    kind: EntityKind,
    survey_source: &str,
    table: &TaxonomyTable,
) -> CoverageReport {
    let distinct: BTreeSet<&str> = raw_values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    let mut mapped = 0usize;
    let mut unmapped_values = Vec::new();
    for raw in distinct {
        let resolution = resolve_value(raw, kind, survey_source, table);
        if resolution.rule == ResolutionRule::Learned {
            mapped += 1;
        } else {
            unmapped_values.push(raw.to_string());
        }
    }

    tracing::debug!(
        kind = %kind,
        mapped,
        unmapped = unmapped_values.len(),
        "coverage analyzed"
    );

    CoverageReport {
        result: CoverageResult::new(kind, mapped, unmapped_values.len()),
        unmapped_values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use survbench_model::SourceEntry;

    #[test]
    fn heuristic_resolution_counts_as_unmapped() {
        // "West" resolves heuristically, but coverage is a confidence
        // metric: without a learned entry it stays unmapped.
        let table = TaxonomyTable::new(EntityKind::Region);
        let values = vec!["West".to_string(), "Gulf Coast".to_string()];
        let report = analyze_coverage(&values, EntityKind::Region, "mgma", &table);
        assert_eq!(report.result.mapped, 0);
        assert_eq!(report.result.unmapped, 2);
        assert_eq!(report.result.coverage, 0.0);
    }

    #[test]
    fn learned_values_count_as_mapped() {
        let mut table = TaxonomyTable::new(EntityKind::Specialty);
        table
            .learn(
                "Cardiology",
                SourceEntry::new("mgma", "Cardiology - General"),
                Utc::now(),
            )
            .unwrap();
        let values = vec![
            "Cardiology - General".to_string(),
            "cardiology - general".to_string(),
            "Dermatology".to_string(),
        ];
        let report = analyze_coverage(&values, EntityKind::Specialty, "mgma", &table);
        // Case-insensitive duplicates of the same learned value are two
        // distinct raw spellings, both resolved.
        assert_eq!(report.result.mapped, 2);
        assert_eq!(report.result.unmapped, 1);
        assert_eq!(report.unmapped_values, vec!["Dermatology".to_string()]);
    }

    #[test]
    fn empty_input_reports_zero_coverage() {
        let table = TaxonomyTable::new(EntityKind::Variable);
        let report = analyze_coverage(&[], EntityKind::Variable, "mgma", &table);
        assert_eq!(report.result.coverage, 0.0);
        assert!(report.unmapped_values.is_empty());
    }
}
