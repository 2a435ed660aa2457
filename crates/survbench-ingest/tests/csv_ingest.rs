use std::io::Write;

use tempfile::NamedTempFile;

use survbench_ingest::{NormalizeOptions, normalize_rows, read_raw_table};
use survbench_map::resolver::resolve_columns;
use survbench_map::store::MemoryMappingStore;
use survbench_model::SurveySchema;

#[test]
fn csv_file_flows_through_resolution_and_normalization() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Specialty,Provider Type,Region,Metric,Median,75th Percentile,Indv Count"
    )
    .unwrap();
    writeln!(
        file,
        "Cardiology - General,MD,west,TCC,\"$300,000\",\"$350,000\",100"
    )
    .unwrap();
    writeln!(file, "Family Medicine,np,southern,TCC,\"$240,000\",,45").unwrap();
    file.flush().unwrap();

    let table = read_raw_table(file.path()).unwrap();
    assert_eq!(table.headers.len(), 7);
    assert_eq!(table.rows.len(), 2);

    let resolution = resolve_columns(&table.headers, &SurveySchema::benchmark(), None);
    assert!(resolution.is_complete());

    let store = MemoryMappingStore::new();
    let options = NormalizeOptions {
        survey_source: "mgma".to_string(),
        default_year: 2024,
    };
    let rows = normalize_rows(&table, &resolution, &store, &options).unwrap();

    assert_eq!(rows[0].region, "Western");
    assert_eq!(rows[0].p50, 300_000.0);
    assert_eq!(rows[0].p75, 350_000.0);
    assert_eq!(rows[0].n_incumbents, 100);
    assert_eq!(rows[1].provider_type, "Nurse Practitioner");
    assert_eq!(rows[1].region, "Southern");
    // Missing 75th percentile cell is the absent-data state.
    assert_eq!(rows[1].p75, 0.0);
    assert_eq!(rows[1].year, 2024);
}
