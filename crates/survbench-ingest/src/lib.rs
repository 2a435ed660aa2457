//! Survey data ingestion: CSV loading, row-store cursors, and variable
//! discovery.

pub mod cancel;
pub mod csv_ingest;
pub mod cursor;
pub mod discovery;
pub mod hash;

pub use cancel::CancelToken;
pub use csv_ingest::{NormalizeOptions, RawTable, normalize_rows, read_raw_table};
pub use cursor::{MemoryRowStore, RowCursor, RowStore};
pub use discovery::{
    DEFAULT_BATCH_SIZE, DiscoveryOptions, DiscoveryOutcome, MemoryVariableCache, VariableCache,
    VariableIndexEntry, discover_variables,
};
pub use hash::sha256_hex;
