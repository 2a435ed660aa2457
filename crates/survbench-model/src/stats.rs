//! Aggregation and blending result types.

use serde::{Deserialize, Serialize};

/// Grouping key of one aggregated subpopulation.
///
/// Dimensions the caller excluded from grouping are `None`; the key derives
/// `Ord` so grouped output has a stable, deterministic order.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GroupKey {
    pub specialty: Option<String>,
    pub provider_type: Option<String>,
    pub region: Option<String>,
    pub year: Option<i32>,
    pub survey_source: Option<String>,
    pub variable: Option<String>,
}

/// The four rank-based summary statistics carried per metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl Percentiles {
    /// Interquartile range.
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.p75 - self.p25
    }

    /// True when all four values are non-zero and ordered ascending.
    #[must_use]
    pub fn monotonic(&self) -> bool {
        let values = [self.p25, self.p50, self.p75, self.p90];
        values.iter().all(|v| *v > 0.0) && values.windows(2).all(|pair| pair[0] <= pair[1])
    }
}

/// Derived value recomputed on demand; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedGroup {
    pub key: GroupKey,
    pub percentiles: Percentiles,
    /// Distinct organization identifiers in the group.
    pub n_orgs: u32,
    /// Incumbents represented by the group.
    pub n_incumbents: u32,
}

/// Weighting policy for blending subpopulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendPolicy {
    /// Every included group receives weight `1/N`.
    Simple,
    /// Weight proportional to the group's incumbent count.
    IncumbentWeighted,
    /// Caller-supplied weights summing to 100.
    Custom,
}

/// One caller-supplied weight for a custom blend, on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendWeight {
    pub specialty: String,
    pub weight: f64,
    pub records: u32,
}

/// Ratio of a compensation percentile to its productivity percentile.
///
/// A zero-valued denominator produces [`EffectiveRate::Undefined`], never a
/// silent `Infinity`/`NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectiveRate {
    Defined(f64),
    Undefined,
}

impl EffectiveRate {
    #[must_use]
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Self::Undefined
        } else {
            Self::Defined(numerator / denominator)
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(value) => Some(*value),
            Self::Undefined => None,
        }
    }
}

/// Weighted composite distribution across blended groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedResult {
    pub policy: BlendPolicy,
    pub percentiles: Percentiles,
    /// Normalized (0-1) weight actually applied per input group, in input
    /// order.
    pub applied_weights: Vec<f64>,
    pub total_incumbents: u32,
    pub group_count: usize,
    pub iqr: f64,
    /// Effective rate per percentile when a productivity distribution was
    /// supplied alongside the compensation metric.
    pub effective_rate: Option<EffectiveRatePercentiles>,
    /// Confidence in the blend, monotone in incumbents and group count,
    /// bounded to `[0, 1]`.
    pub confidence: f64,
}

/// Effective conversion rate at each reported percentile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveRatePercentiles {
    pub p25: EffectiveRate,
    pub p50: EffectiveRate,
    pub p75: EffectiveRate,
    pub p90: EffectiveRate,
}
