//! link-reconciler - re-validates tracked URLs and records the dead ones.
//!
//! ## Layout
//!
//! - `store`: the document store holding tracked URLs (trait + implementations)
//! - `checker`: the single-URL liveness check
//! - `reconcile`: pagination, checkpointing, bounded concurrency and the driver
//! - `config`: settings for a pass
//!
//! A pass never removes a URL on an inconclusive result: timeouts and 405s
//! count as alive.

pub mod checker;
pub mod config;
pub mod models;
pub mod reconcile;
pub mod store;

#[cfg(test)]
mod test_support;

pub use checker::{UrlValidator, Verdict};
pub use config::ReconcileConfig;
pub use models::{RunSummary, TrackedUrl, ValidationOutcome};
pub use reconcile::{CheckpointStore, ReconcileReport, Reconciler};
pub use store::{JsonFileStore, MemoryStore, StoreError, UrlStore};
