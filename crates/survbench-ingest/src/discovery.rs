//! Variable Discovery Service.
//!
//! Returns the distinct set of `variable` values present for a survey
//! without materializing its rows. A cache keyed by `(survey_id,
//! content_hash)` answers repeat calls without a second scan; a miss walks
//! the store's cursor in bounded batches, checking the cancellation token
//! once per batch boundary.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use survbench_model::Result;

use crate::cancel::CancelToken;
use crate::cursor::RowStore;

/// Default number of rows held in memory per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Options for a discovery scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryOptions {
    /// Rows per cursor batch; at most one batch is in memory at a time.
    pub batch_size: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl DiscoveryOptions {
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Outcome of a discovery scan. Cancellation discards partial results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Complete(BTreeSet<String>),
    Cancelled,
}

impl DiscoveryOutcome {
    /// The discovered set, unless the scan was cancelled.
    #[must_use]
    pub fn variables(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Complete(variables) => Some(variables),
            Self::Cancelled => None,
        }
    }
}

/// Cached variable set for one survey at one content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableIndexEntry {
    pub survey_id: String,
    pub variables: BTreeSet<String>,
    pub last_scan_hash: String,
}

/// Cache of discovered variable sets, invalidated by content hash.
pub trait VariableCache {
    /// Cached set for the survey, only when the hash still matches.
    fn get(&self, survey_id: &str, content_hash: &str) -> Option<BTreeSet<String>>;

    /// Record the scan result, replacing any stale entry for the survey.
    fn put(&self, entry: VariableIndexEntry);
}

/// In-memory variable cache; one entry per survey.
#[derive(Debug, Default)]
pub struct MemoryVariableCache {
    entries: Mutex<BTreeMap<String, VariableIndexEntry>>,
}

impl MemoryVariableCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VariableCache for MemoryVariableCache {
    fn get(&self, survey_id: &str, content_hash: &str) -> Option<BTreeSet<String>> {
        let guard = self.entries.lock().ok()?;
        guard
            .get(survey_id)
            .filter(|entry| entry.last_scan_hash == content_hash)
            .map(|entry| entry.variables.clone())
    }

    fn put(&self, entry: VariableIndexEntry) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(entry.survey_id.clone(), entry);
        }
    }
}

/// Discover the distinct variable names present for a survey.
///
/// A survey with zero rows yields an empty set, not an error.
///
/// # Errors
///
/// Propagates store failures, including `NotFound` for unknown surveys.
pub fn discover_variables(
    survey_id: &str,
    store: &dyn RowStore,
    cache: &dyn VariableCache,
    options: &DiscoveryOptions,
    cancel: &CancelToken,
) -> Result<DiscoveryOutcome> {
    let content_hash = store.content_hash(survey_id)?;
    if let Some(variables) = cache.get(survey_id, &content_hash) {
        tracing::debug!(survey_id, "variable discovery served from cache");
        return Ok(DiscoveryOutcome::Complete(variables));
    }

    let mut cursor = store.open_cursor(survey_id)?;
    let mut variables = BTreeSet::new();
    let mut scanned = 0usize;
    while let Some(batch) = cursor.next_batch(options.batch_size)? {
        if cancel.is_cancelled() {
            tracing::info!(survey_id, scanned, "variable discovery cancelled");
            return Ok(DiscoveryOutcome::Cancelled);
        }
        scanned += batch.len();
        for row in &batch {
            let variable = row.variable.trim();
            if !variable.is_empty() {
                variables.insert(variable.to_string());
            }
        }
    }

    tracing::debug!(
        survey_id,
        scanned,
        distinct = variables.len(),
        "variable discovery scan finished"
    );
    cache.put(VariableIndexEntry {
        survey_id: survey_id.to_string(),
        variables: variables.clone(),
        last_scan_hash: content_hash,
    });
    Ok(DiscoveryOutcome::Complete(variables))
}
