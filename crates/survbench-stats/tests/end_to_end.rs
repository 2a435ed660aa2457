//! Two-survey scenario: taxonomy normalization folds both surveys into one
//! canonical specialty, aggregation merges the subpopulations, and an
//! incumbent-weighted blend of the per-source distributions reproduces the
//! hand-computed composite.

use survbench_map::normalizer::normalize_value;
use survbench_map::store::{MappingStore, MemoryMappingStore};
use survbench_model::{BlendPolicy, EntityKind, NormalizedRow, RawRow, SourceEntry};
use survbench_stats::{GroupKeySpec, aggregate, blend};

fn row(specialty: &str, source: &str, n_incumbents: u32, p50: f64) -> NormalizedRow {
    NormalizedRow {
        specialty: specialty.to_string(),
        provider_type: "Physician".to_string(),
        region: "National".to_string(),
        year: 2025,
        survey_source: source.to_string(),
        variable: "TCC".to_string(),
        org_id: None,
        n_orgs: 0,
        n_incumbents,
        p25: p50 * 0.8,
        p50,
        p75: p50 * 1.2,
        p90: p50 * 1.4,
        raw: RawRow::new(),
    }
}

#[test]
fn two_surveys_blend_to_the_expected_median() {
    // Survey B reports a sub-specialty spelling; a confirmed mapping folds
    // it into the canonical specialty.
    let store = MemoryMappingStore::new();
    store
        .learn(
            EntityKind::Specialty,
            "Cardiology",
            SourceEntry::new("survey_b", "Cardiology - Interventional"),
        )
        .unwrap();
    let table = store.table(EntityKind::Specialty).unwrap();

    let specialty_a = normalize_value("Cardiology", EntityKind::Specialty, "survey_a", &table);
    let specialty_b = normalize_value(
        "Cardiology - Interventional",
        EntityKind::Specialty,
        "survey_b",
        &table,
    );
    assert_eq!(specialty_a, "Cardiology");
    assert_eq!(specialty_b, "Cardiology");

    let rows = vec![
        row(&specialty_a, "survey_a", 100, 300_000.0),
        row(&specialty_b, "survey_b", 50, 340_000.0),
    ];

    // Collapsed across sources: one canonical group, incumbents summed.
    let merged = aggregate(&rows, &GroupKeySpec::across_sources(), true);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].n_incumbents, 150);

    // Kept apart by source: two distributions feeding the blend.
    let per_source = aggregate(&rows, &GroupKeySpec::full(), true);
    assert_eq!(per_source.len(), 2);

    let result = blend(&per_source, BlendPolicy::IncumbentWeighted, None).unwrap();
    let expected = (100.0 * 300_000.0 + 50.0 * 340_000.0) / 150.0;
    assert!(
        (result.percentiles.p50 - expected).abs() < 1.0,
        "blended p50 {} != {expected}",
        result.percentiles.p50
    );
    assert_eq!(result.total_incumbents, 150);
    assert!(result.confidence > 0.0 && result.confidence <= 1.0);
}
