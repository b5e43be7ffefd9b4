// src/store/mod.rs
// =============================================================================
// The document store holding every tracked URL.
//
// The reconciler only needs three things from it:
// - an ordered range query (orderBy(id).startAfter(cursor).limit(n))
// - "touch" updates keyed by id (last verified, last viewed)
// - a way to persist anything buffered
//
// Submodules:
// - memory: a BTreeMap-backed store, handy for tests and embedding
// - json_file: a single JSON document on disk, used by the CLI
// =============================================================================

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

pub use crate::models::StoredUrl;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a store. Any of these aborts a pagination sweep.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("IO error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt store file {path}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The document-store collaborator.
#[async_trait]
pub trait UrlStore: Send + Sync {
    /// Returns up to `limit` documents with id strictly greater than
    /// `start_after`, ordered by id ascending.
    async fn fetch_after(
        &self,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredUrl>, StoreError>;

    /// Stamps the document's last-verified time with "now".
    async fn touch_verified(&self, id: &str) -> Result<(), StoreError>;

    /// Records that `url` was viewed now, creating the document if needed.
    /// Returns the document id.
    async fn touch_viewed(&self, url: &str) -> Result<String, StoreError>;

    /// Persists buffered writes.
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
