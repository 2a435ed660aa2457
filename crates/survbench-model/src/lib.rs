//! Data model for the survey benchmarking engine.
//!
//! Defines the canonical schema, raw/normalized row types, learned taxonomy
//! tables, aggregation/blending result types, and the shared error taxonomy.
//! Storage and presentation live elsewhere; everything here is plain data.

pub mod coverage;
pub mod error;
pub mod row;
pub mod schema;
pub mod stats;
pub mod taxonomy;

pub use coverage::{CoverageReport, CoverageResult};
pub use error::{BenchError, Result};
pub use row::{NormalizedRow, RawRow};
pub use schema::{CanonicalField, FieldSpec, SurveySchema};
pub use stats::{
    AggregatedGroup, BlendPolicy, BlendWeight, BlendedResult, EffectiveRate,
    EffectiveRatePercentiles, GroupKey, Percentiles,
};
pub use taxonomy::{EntityKind, SourceEntry, TaxonomyMapping, TaxonomyTable};
