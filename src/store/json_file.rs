// src/store/json_file.rs
// =============================================================================
// A UrlStore kept in one JSON file: { "<id>": { "url": ..., "lastViewed": ... } }
//
// The whole document is read at open and served from memory. Writes
// (touches) stay in memory until flush(), which writes a temp file next to
// the real one and renames it over, so a crash never leaves half a file.
// =============================================================================

use super::{MemoryStore, StoreError, StoredUrl, UrlStore};
use crate::models::TrackedUrl;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Opens the store, treating a missing file as an empty collection.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let docs: BTreeMap<String, TrackedUrl> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        debug!(path = %path.display(), documents = docs.len(), "opened store");

        Ok(Self {
            path,
            inner: MemoryStore::from_docs(docs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl UrlStore for JsonFileStore {
    async fn fetch_after(
        &self,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredUrl>, StoreError> {
        self.inner.fetch_after(start_after, limit).await
    }

    async fn touch_verified(&self, id: &str) -> Result<(), StoreError> {
        self.inner.touch_verified(id).await
    }

    async fn touch_viewed(&self, url: &str) -> Result<String, StoreError> {
        self.inner.touch_viewed(url).await
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let docs = self.inner.snapshot();
        let json = serde_json::to_vec_pretty(&docs).map_err(|source| StoreError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await.map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), documents = docs.len(), "flushed store");
        Ok(())
    }
}
