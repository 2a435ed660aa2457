//! Mapping coverage reporting types.

use serde::{Deserialize, Serialize};

use crate::taxonomy::EntityKind;

/// Resolution quality summary for one taxonomy dimension.
///
/// Coverage is a confidence metric: a raw value counts as mapped only when
/// a confirmed (learned) mapping resolved it, never when a heuristic or
/// title-case fallback produced some string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub kind: EntityKind,
    pub mapped: usize,
    pub unmapped: usize,
    /// `mapped / (mapped + unmapped)`, 0.0 when both are zero.
    pub coverage: f64,
}

impl CoverageResult {
    #[must_use]
    pub fn new(kind: EntityKind, mapped: usize, unmapped: usize) -> Self {
        let total = mapped + unmapped;
        let coverage = if total == 0 {
            0.0
        } else {
            mapped as f64 / total as f64
        };
        Self {
            kind,
            mapped,
            unmapped,
            coverage,
        }
    }
}

/// Coverage summary plus the specific raw values needing manual review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub result: CoverageResult,
    /// Unmapped raw values, sorted for stable review output.
    pub unmapped_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_is_zero_when_empty() {
        let result = CoverageResult::new(EntityKind::Region, 0, 0);
        assert_eq!(result.coverage, 0.0);
    }

    #[test]
    fn coverage_is_bounded_ratio() {
        let result = CoverageResult::new(EntityKind::Specialty, 3, 1);
        assert!((result.coverage - 0.75).abs() < f64::EPSILON);
        assert!(result.coverage >= 0.0 && result.coverage <= 1.0);
    }
}
