//! Statistical aggregation and blending for survey benchmarks.

pub mod aggregate;
pub mod blend;
pub mod worker;

pub use aggregate::{
    AggregationOutcome, GroupKeySpec, aggregate, aggregate_with_cancel, percentile,
};
pub use blend::{WEIGHT_SUM_EPSILON, blend, blend_with_rate, confidence_score};
pub use worker::{JobHandle, JobOutcome, StatsWorker};
