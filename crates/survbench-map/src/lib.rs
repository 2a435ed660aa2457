//! Column resolution and taxonomy normalization.
//!
//! Maps raw survey headers onto the canonical schema, resolves raw
//! specialty / provider-type / region / variable strings to canonical
//! values, and reports coverage of confirmed mappings. The Mapping Store
//! trait is the collaborator boundary to persistence.

pub mod coverage;
pub mod normalizer;
pub mod repository;
pub mod resolver;
pub mod store;
pub mod synonyms;
pub mod utils;

pub use coverage::analyze_coverage;
pub use normalizer::{ResolutionRule, TaxonomyResolution, normalize_value, resolve_value};
pub use repository::{MappingRepository, StoredTable, StoredTemplate};
pub use resolver::{ColumnMapping, ColumnResolution, ColumnTemplate, resolve_columns};
pub use store::{MappingStore, MemoryMappingStore};
