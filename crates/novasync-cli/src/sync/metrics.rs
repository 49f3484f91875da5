//! Per-run metrics serialized into the ledger's details blob.

use serde::Serialize;

/// Wall-clock milliseconds spent in each phase of the run.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct PhaseTimings {
    pub auth_ms: u64,
    pub fetch_ms: u64,
    pub merge_ms: u64,
    pub reconcile_ms: u64,
    pub invalidate_ms: u64,
}

/// Free-form performance/detail blob recorded on the ledger row.
#[derive(Debug, Default, Serialize)]
pub struct RunDetails {
    pub phases: PhaseTimings,
    pub item_records: usize,
    pub price_records: usize,
    pub canonical_records: usize,
    pub catalog_pages: usize,
    pub catalog_rows: usize,
    /// Rows excluded from reconciliation for lack of a usable SKU.
    pub skipped_rows: usize,
    pub directives: usize,
    pub chunks: usize,
}
