use std::collections::BTreeSet;

use survbench_ingest::{
    CancelToken, DiscoveryOptions, DiscoveryOutcome, MemoryRowStore, MemoryVariableCache,
    discover_variables,
};
use survbench_model::{BenchError, NormalizedRow, RawRow};

fn row(variable: &str, specialty: &str) -> NormalizedRow {
    NormalizedRow {
        specialty: specialty.to_string(),
        provider_type: "Physician".to_string(),
        region: "National".to_string(),
        year: 2025,
        survey_source: "mgma".to_string(),
        variable: variable.to_string(),
        org_id: None,
        n_orgs: 0,
        n_incumbents: 1,
        p25: 0.0,
        p50: 100.0,
        p75: 0.0,
        p90: 0.0,
        raw: RawRow::new(),
    }
}

fn names(outcome: &DiscoveryOutcome) -> Vec<&str> {
    outcome
        .variables()
        .map(|set| set.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

#[test]
fn discovers_distinct_variables_across_batches() {
    let store = MemoryRowStore::new();
    let rows: Vec<NormalizedRow> = (0..25)
        .map(|i| row(["TCC", "wRVU", "CF"][i % 3], "Cardiology"))
        .collect();
    store.put_rows("s1", rows);

    let cache = MemoryVariableCache::new();
    let options = DiscoveryOptions::default().with_batch_size(4);
    let outcome =
        discover_variables("s1", &store, &cache, &options, &CancelToken::new()).unwrap();
    assert_eq!(names(&outcome), vec!["CF", "TCC", "wRVU"]);
}

#[test]
fn second_call_is_served_from_cache_without_a_scan() {
    let store = MemoryRowStore::new();
    store.put_rows("s1", vec![row("TCC", "Cardiology"), row("wRVU", "Cardiology")]);
    let cache = MemoryVariableCache::new();
    let options = DiscoveryOptions::default();
    let cancel = CancelToken::new();

    let first = discover_variables("s1", &store, &cache, &options, &cancel).unwrap();
    assert_eq!(store.scan_count(), 1);
    let second = discover_variables("s1", &store, &cache, &options, &cancel).unwrap();
    assert_eq!(store.scan_count(), 1, "cache hit must not rescan");
    assert_eq!(first, second);
}

#[test]
fn mutated_content_invalidates_the_cache() {
    let store = MemoryRowStore::new();
    store.put_rows("s1", vec![row("TCC", "Cardiology")]);
    let cache = MemoryVariableCache::new();
    let options = DiscoveryOptions::default();
    let cancel = CancelToken::new();

    discover_variables("s1", &store, &cache, &options, &cancel).unwrap();
    store.put_rows("s1", vec![row("TCC", "Cardiology"), row("CF", "Cardiology")]);
    let outcome = discover_variables("s1", &store, &cache, &options, &cancel).unwrap();
    assert_eq!(store.scan_count(), 2, "new content hash must rescan");
    assert_eq!(names(&outcome), vec!["CF", "TCC"]);
}

#[test]
fn zero_row_survey_yields_empty_set() {
    let store = MemoryRowStore::new();
    store.put_rows("empty", Vec::new());
    let cache = MemoryVariableCache::new();
    let outcome = discover_variables(
        "empty",
        &store,
        &cache,
        &DiscoveryOptions::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(outcome, DiscoveryOutcome::Complete(BTreeSet::new()));
}

#[test]
fn unknown_survey_is_not_found() {
    let store = MemoryRowStore::new();
    let cache = MemoryVariableCache::new();
    let err = discover_variables(
        "missing",
        &store,
        &cache,
        &DiscoveryOptions::default(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, BenchError::NotFound(_)));
}

#[test]
fn cancellation_discards_partial_results_and_caches_nothing() {
    let store = MemoryRowStore::new();
    let rows: Vec<NormalizedRow> = (0..10).map(|_| row("TCC", "Cardiology")).collect();
    store.put_rows("s1", rows);
    let cache = MemoryVariableCache::new();
    let options = DiscoveryOptions::default().with_batch_size(2);

    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = discover_variables("s1", &store, &cache, &options, &cancel).unwrap();
    assert_eq!(outcome, DiscoveryOutcome::Cancelled);
    assert!(outcome.variables().is_none());

    // Nothing was cached, so a fresh call performs a full scan.
    let fresh = discover_variables("s1", &store, &cache, &options, &CancelToken::new()).unwrap();
    assert_eq!(names(&fresh), vec!["TCC"]);
}
