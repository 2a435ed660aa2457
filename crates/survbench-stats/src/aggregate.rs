//! Percentile Aggregation Engine.
//!
//! Groups normalized rows by a caller-selected key tuple and computes
//! weighted percentile statistics plus organization/incumbent counts.
//! Groups live in a `BTreeMap` keyed by the tuple, so the same input set
//! always yields bit-identical output in the same order — no unordered map
//! iteration anywhere.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use survbench_ingest::CancelToken;
use survbench_model::{AggregatedGroup, GroupKey, NormalizedRow, Percentiles};

/// Rows processed between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Which of the six dimensions participate in the grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKeySpec {
    pub specialty: bool,
    pub provider_type: bool,
    pub region: bool,
    pub year: bool,
    pub survey_source: bool,
    pub variable: bool,
}

impl GroupKeySpec {
    /// Full six-dimension key.
    #[must_use]
    pub fn full() -> Self {
        Self {
            specialty: true,
            provider_type: true,
            region: true,
            year: true,
            survey_source: true,
            variable: true,
        }
    }

    /// Key collapsing sources together, for cross-source comparison.
    #[must_use]
    pub fn across_sources() -> Self {
        Self {
            survey_source: false,
            ..Self::full()
        }
    }

    fn key_of(&self, row: &NormalizedRow) -> GroupKey {
        GroupKey {
            specialty: self.specialty.then(|| row.specialty.clone()),
            provider_type: self.provider_type.then(|| row.provider_type.clone()),
            region: self.region.then(|| row.region.clone()),
            year: self.year.then_some(row.year),
            survey_source: self.survey_source.then(|| row.survey_source.clone()),
            variable: self.variable.then(|| row.variable.clone()),
        }
    }
}

/// Outcome of a cancellable aggregation. Cancellation discards partial
/// results.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationOutcome {
    Complete(Vec<AggregatedGroup>),
    Cancelled,
}

impl AggregationOutcome {
    /// The aggregated groups, unless the run was cancelled.
    #[must_use]
    pub fn groups(&self) -> Option<&[AggregatedGroup]> {
        match self {
            Self::Complete(groups) => Some(groups),
            Self::Cancelled => None,
        }
    }
}

/// Aggregate rows into one [`AggregatedGroup`] per distinct key.
///
/// With `compute_percentiles` false only the counts are produced, which
/// skips the per-metric sorts on large groups.
#[must_use]
pub fn aggregate(
    rows: &[NormalizedRow],
    key_spec: &GroupKeySpec,
    compute_percentiles: bool,
) -> Vec<AggregatedGroup> {
    // A fresh token never fires, so the run always completes.
    match aggregate_with_cancel(rows, key_spec, compute_percentiles, &CancelToken::new()) {
        AggregationOutcome::Complete(groups) => groups,
        AggregationOutcome::Cancelled => Vec::new(),
    }
}

/// Aggregate rows, observing the cancellation token at chunk and group
/// boundaries so a background job can abandon a long run cooperatively.
#[must_use]
pub fn aggregate_with_cancel(
    rows: &[NormalizedRow],
    key_spec: &GroupKeySpec,
    compute_percentiles: bool,
    cancel: &CancelToken,
) -> AggregationOutcome {
    struct Accumulator {
        orgs: BTreeSet<String>,
        declared_orgs: u32,
        incumbents: u32,
        p25: Vec<f64>,
        p50: Vec<f64>,
        p75: Vec<f64>,
        p90: Vec<f64>,
    }

    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for chunk in rows.chunks(CANCEL_CHECK_INTERVAL) {
        if cancel.is_cancelled() {
            tracing::info!(rows = rows.len(), "aggregation cancelled");
            return AggregationOutcome::Cancelled;
        }
        for row in chunk {
            let acc = groups.entry(key_spec.key_of(row)).or_insert(Accumulator {
                orgs: BTreeSet::new(),
                declared_orgs: 0,
                incumbents: 0,
                p25: Vec::new(),
                p50: Vec::new(),
                p75: Vec::new(),
                p90: Vec::new(),
            });
            if let Some(org_id) = &row.org_id {
                acc.orgs.insert(org_id.clone());
            }
            // Pre-aggregated sources declare an org count per row; the
            // same orgs back every row of a group, so the max is kept
            // rather than a double-counting sum.
            acc.declared_orgs = acc.declared_orgs.max(row.n_orgs);
            // A row with no incumbent count represents one incumbent.
            acc.incumbents += if row.n_incumbents > 0 {
                row.n_incumbents
            } else {
                1
            };
            if compute_percentiles {
                push_positive(&mut acc.p25, row.p25);
                push_positive(&mut acc.p50, row.p50);
                push_positive(&mut acc.p75, row.p75);
                push_positive(&mut acc.p90, row.p90);
            }
        }
    }

    let mut result = Vec::with_capacity(groups.len());
    for (key, mut acc) in groups {
        if cancel.is_cancelled() {
            tracing::info!(rows = rows.len(), "aggregation cancelled");
            return AggregationOutcome::Cancelled;
        }
        let n_orgs = if acc.orgs.is_empty() {
            acc.declared_orgs
        } else {
            acc.orgs.len() as u32
        };
        result.push(AggregatedGroup {
            key,
            percentiles: if compute_percentiles {
                Percentiles {
                    p25: percentile(&mut acc.p25, 25),
                    p50: percentile(&mut acc.p50, 50),
                    p75: percentile(&mut acc.p75, 75),
                    p90: percentile(&mut acc.p90, 90),
                }
            } else {
                Percentiles::default()
            },
            n_orgs,
            n_incumbents: acc.incumbents,
        });
    }

    tracing::debug!(
        rows = rows.len(),
        groups = result.len(),
        compute_percentiles,
        "aggregation finished"
    );
    AggregationOutcome::Complete(result)
}

/// Zero is the absent-data value for metric cells; it never enters a
/// distribution.
fn push_positive(values: &mut Vec<f64>, value: f64) {
    if value > 0.0 {
        values.push(value);
    }
}

/// Rank-based percentile: sort ascending, take `floor(p/100 * N)` clamped
/// to `[0, N-1]`. Empty input yields 0.0, the valid empty-data state.
#[must_use]
pub fn percentile(values: &mut [f64], p: u8) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let index = ((f64::from(p) / 100.0) * values.len() as f64).floor() as usize;
    values[index.min(values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use survbench_model::RawRow;

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
            p25: 0.0,
            p50,
            p75: 0.0,
            p90: 0.0,
            raw: RawRow::new(),
        }
    }

    #[test]
    fn percentile_index_is_floored_and_clamped() {
        let mut values = vec![10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&mut values, 25), 20.0);
        assert_eq!(percentile(&mut values, 50), 30.0);
        assert_eq!(percentile(&mut values, 90), 40.0);
        assert_eq!(percentile(&mut values, 100), 40.0);
        assert_eq!(percentile(&mut [], 50), 0.0);
    }

    #[test]
    fn groups_collapse_across_sources_and_sum_incumbents() {
        let rows = vec![
            row("Cardiology", "survey_a", 100, 300_000.0),
            row("Cardiology", "survey_b", 50, 340_000.0),
        ];
        let groups = aggregate(&rows, &GroupKeySpec::across_sources(), true);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].n_incumbents, 150);
        assert_eq!(groups[0].key.survey_source, None);
    }

    #[test]
    fn full_key_keeps_sources_apart() {
        let rows = vec![
            row("Cardiology", "survey_a", 100, 300_000.0),
            row("Cardiology", "survey_b", 50, 340_000.0),
        ];
        let groups = aggregate(&rows, &GroupKeySpec::full(), true);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn distinct_orgs_are_counted() {
        let mut a = row("Cardiology", "survey_a", 10, 300_000.0);
        a.org_id = Some("org-1".to_string());
        let mut b = a.clone();
        b.org_id = Some("org-2".to_string());
        let mut c = a.clone();
        c.org_id = Some("org-1".to_string());
        let groups = aggregate(&[a, b, c], &GroupKeySpec::full(), false);
        assert_eq!(groups[0].n_orgs, 2);
    }

    #[test]
    fn declared_org_counts_back_groups_without_org_ids() {
        // Pre-aggregated sources ship an org count column instead of
        // per-org rows; the largest declared count stands in for the
        // distinct-id tally.
        let mut a = row("Cardiology", "survey_a", 10, 300_000.0);
        a.n_orgs = 12;
        let mut b = row("Cardiology", "survey_a", 10, 310_000.0);
        b.n_orgs = 8;
        let groups = aggregate(&[a, b], &GroupKeySpec::full(), false);
        assert_eq!(groups[0].n_orgs, 12);
    }

    #[test]
    fn distinct_org_ids_win_over_declared_counts() {
        let mut a = row("Cardiology", "survey_a", 10, 300_000.0);
        a.org_id = Some("org-1".to_string());
        a.n_orgs = 12;
        let groups = aggregate(&[a], &GroupKeySpec::full(), false);
        assert_eq!(groups[0].n_orgs, 1);
    }

    #[test]
    fn cancelled_aggregation_discards_partial_results() {
        let rows: Vec<NormalizedRow> = (0..10u32)
            .map(|i| row("Cardiology", "survey_a", i + 1, 300_000.0))
            .collect();
        let spec = GroupKeySpec::full();

        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = aggregate_with_cancel(&rows, &spec, true, &cancel);
        assert_eq!(outcome, AggregationOutcome::Cancelled);
        assert!(outcome.groups().is_none());

        // A fresh token completes and matches the direct path.
        let fresh = aggregate_with_cancel(&rows, &spec, true, &CancelToken::new());
        assert_eq!(
            fresh.groups().unwrap(),
            aggregate(&rows, &spec, true).as_slice()
        );
    }

    #[test]
    fn rows_without_incumbent_counts_count_as_one() {
        let rows = vec![
            row("Cardiology", "survey_a", 0, 300_000.0),
            row("Cardiology", "survey_a", 0, 310_000.0),
        ];
        let groups = aggregate(&rows, &GroupKeySpec::full(), false);
        assert_eq!(groups[0].n_incumbents, 2);
    }

    #[test]
    fn reruns_are_bit_identical() {
        let rows: Vec<NormalizedRow> = (0..50)
            .map(|i| {
                row(
                    ["Cardiology", "Dermatology"][i % 2],
                    ["survey_a", "survey_b"][i % 2],
                    (i as u32) + 1,
                    250_000.0 + (i as f64) * 1_000.0,
                )
            })
            .collect();
        let spec = GroupKeySpec::across_sources();
        assert_eq!(aggregate(&rows, &spec, true), aggregate(&rows, &spec, true));
    }
}
