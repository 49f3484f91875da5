//! Run orchestrator: sequences authentication, feed fetching, merge,
//! reconciliation, and cache invalidation, and reports the outcome to the
//! execution-history ledger.

mod metrics;
mod runner;

pub use runner::run;
