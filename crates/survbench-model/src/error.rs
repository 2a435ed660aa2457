//! Error taxonomy shared across the benchmarking engine.
//!
//! Heuristic fallbacks (unmatched header ignored, unmatched taxonomy value
//! title-cased) are valid low-confidence outcomes, not errors; they surface
//! through coverage reporting instead. Cancellation is likewise not an error
//! and is signaled through outcome enums on the long-running operations.

use thiserror::Error;

use crate::taxonomy::EntityKind;

/// Errors surfaced by the benchmarking core.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Caller-supplied input failed validation (missing required column
    /// mapping, malformed weight set). Never silently defaulted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A mapping key already resolves to a different canonical value.
    /// The original mapping is left unchanged; the caller must decide.
    #[error(
        "mapping conflict for {kind} ({survey_source}, {raw_value}): \
         already resolves to '{existing}', attempted '{attempted}'"
    )]
    Conflict {
        kind: EntityKind,
        survey_source: String,
        raw_value: String,
        existing: String,
        attempted: String,
    },

    /// Survey or mapping table absent.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    /// Convenience constructor for validation failures.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
