//! Blending Engine.
//!
//! Combines percentile statistics from multiple specialties/sources into
//! one weighted composite distribution under three weighting policies, and
//! derives IQR, effective rate-per-unit, and a bounded confidence score.

use survbench_model::{
    AggregatedGroup, BenchError, BlendPolicy, BlendWeight, BlendedResult, EffectiveRate,
    EffectiveRatePercentiles, Percentiles, Result,
};

/// Custom weights must sum to 100 within this epsilon.
pub const WEIGHT_SUM_EPSILON: f64 = 0.5;

/// Blend aggregated groups under the given policy.
///
/// `weights` is required for [`BlendPolicy::Custom`] and ignored otherwise;
/// custom weights are matched to groups positionally and are on a 0-100
/// scale.
///
/// # Errors
///
/// [`BenchError::Validation`] when no groups are supplied, when custom
/// weights are missing or mismatched in length, or when they do not sum to
/// 100 within [`WEIGHT_SUM_EPSILON`].
pub fn blend(
    groups: &[AggregatedGroup],
    policy: BlendPolicy,
    weights: Option<&[BlendWeight]>,
) -> Result<BlendedResult> {
    if groups.is_empty() {
        return Err(BenchError::validation("no groups to blend"));
    }

    let applied_weights = match policy {
        BlendPolicy::Simple => simple_weights(groups.len()),
        BlendPolicy::IncumbentWeighted => incumbent_weights(groups),
        BlendPolicy::Custom => custom_weights(groups, weights)?,
    };

    let mut percentiles = Percentiles::default();
    for (group, weight) in groups.iter().zip(&applied_weights) {
        percentiles.p25 += weight * group.percentiles.p25;
        percentiles.p50 += weight * group.percentiles.p50;
        percentiles.p75 += weight * group.percentiles.p75;
        percentiles.p90 += weight * group.percentiles.p90;
    }

    let total_incumbents: u32 = groups.iter().map(|group| group.n_incumbents).sum();
    let confidence = confidence_score(total_incumbents, groups.len());

    tracing::debug!(
        groups = groups.len(),
        total_incumbents,
        ?policy,
        "blend computed"
    );

    Ok(BlendedResult {
        policy,
        iqr: percentiles.iqr(),
        percentiles,
        applied_weights,
        total_incumbents,
        group_count: groups.len(),
        effective_rate: None,
        confidence,
    })
}

/// Blend a compensation distribution and attach the effective
/// rate-per-unit against the matching productivity distribution.
///
/// Zero-valued productivity percentiles produce
/// [`EffectiveRate::Undefined`], never an infinity.
pub fn blend_with_rate(
    compensation: &[AggregatedGroup],
    productivity: &[AggregatedGroup],
    policy: BlendPolicy,
    weights: Option<&[BlendWeight]>,
) -> Result<BlendedResult> {
    let mut result = blend(compensation, policy, weights)?;
    let productivity = blend(productivity, policy, weights)?;
    result.effective_rate = Some(EffectiveRatePercentiles {
        p25: EffectiveRate::ratio(result.percentiles.p25, productivity.percentiles.p25),
        p50: EffectiveRate::ratio(result.percentiles.p50, productivity.percentiles.p50),
        p75: EffectiveRate::ratio(result.percentiles.p75, productivity.percentiles.p75),
        p90: EffectiveRate::ratio(result.percentiles.p90, productivity.percentiles.p90),
    });
    Ok(result)
}

fn simple_weights(count: usize) -> Vec<f64> {
    vec![1.0 / count as f64; count]
}

fn incumbent_weights(groups: &[AggregatedGroup]) -> Vec<f64> {
    let total: u64 = groups.iter().map(|group| u64::from(group.n_incumbents)).sum();
    if total == 0 {
        // No incumbent information anywhere; fall back to equal weights.
        return simple_weights(groups.len());
    }
    groups
        .iter()
        .map(|group| f64::from(group.n_incumbents) / total as f64)
        .collect()
}

fn custom_weights(
    groups: &[AggregatedGroup],
    weights: Option<&[BlendWeight]>,
) -> Result<Vec<f64>> {
    let weights =
        weights.ok_or_else(|| BenchError::validation("custom policy requires weights"))?;
    if weights.len() != groups.len() {
        return Err(BenchError::validation(format!(
            "{} weights supplied for {} groups",
            weights.len(),
            groups.len()
        )));
    }
    let sum: f64 = weights.iter().map(|weight| weight.weight).sum();
    if (sum - 100.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(BenchError::validation(format!(
            "custom weights sum to {sum:.2}, expected 100"
        )));
    }
    Ok(weights.iter().map(|weight| weight.weight / 100.0).collect())
}

/// Confidence in a blend: `(n / (n + 100)) * (s / (s + 1))` for total
/// incumbents `n` and group count `s`. Monotone non-decreasing in both
/// inputs and bounded to `[0, 1]`.
#[must_use]
pub fn confidence_score(total_incumbents: u32, group_count: usize) -> f64 {
    let n = f64::from(total_incumbents);
    let s = group_count as f64;
    (n / (n + 100.0)) * (s / (s + 1.0))
}
