// src/reconcile/mod.rs
// =============================================================================
// This module finds tracked URLs that have gone dead.
//
// Submodules:
// - paginate: walks the store one page at a time
// - checkpoint: the on-disk list of URLs already known to be invalid
// - runner: runs many checks with a cap on how many are in flight
// - driver: ties the above together into one resumable pass
//
// Data flow:
//   checkpoint -> resume cursor -> paginate -> runner -> checker -> checkpoint
// =============================================================================

mod checkpoint;
mod driver;
mod paginate;
mod runner;

pub use checkpoint::{resume_cursor_from, CheckpointStore};
pub use driver::{ReconcileReport, Reconciler};
pub use paginate::{paginate, Paginator};
pub use runner::{run_all, TaskError, TaskOutcome};
