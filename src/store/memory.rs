// src/store/memory.rs
// =============================================================================
// An in-memory UrlStore backed by a BTreeMap.
//
// BTreeMap keeps keys sorted, so "orderBy(id).startAfter(cursor).limit(n)"
// is just a range scan. The JSON file store reuses the same scan.
// =============================================================================

use super::{StoreError, StoredUrl, UrlStore};
use crate::models::{url_to_id, TrackedUrl};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, TrackedUrl>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from URLs, all viewed "now".
    pub fn with_urls<I, S>(urls: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let store = Self::new();
        for url in urls {
            store.insert(TrackedUrl::new(url.as_ref(), Utc::now()))?;
        }
        Ok(store)
    }

    /// Inserts a tracked URL under its normalized id.
    pub fn insert(&self, tracked: TrackedUrl) -> Result<String, StoreError> {
        let id = url_to_id(&tracked.url).map_err(|e| StoreError::InvalidUrl {
            url: tracked.url.clone(),
            reason: e.to_string(),
        })?;
        self.insert_raw(id.clone(), tracked);
        Ok(id)
    }

    /// Inserts a document under an arbitrary id, URL-shaped or not.
    pub fn insert_raw(&self, id: impl Into<String>, tracked: TrackedUrl) {
        self.lock().insert(id.into(), tracked);
    }

    pub fn get(&self, id: &str) -> Option<TrackedUrl> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(super) fn from_docs(docs: BTreeMap<String, TrackedUrl>) -> Self {
        Self {
            docs: Mutex::new(docs),
        }
    }

    pub(super) fn snapshot(&self) -> BTreeMap<String, TrackedUrl> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, TrackedUrl>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still usable.
        self.docs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UrlStore for MemoryStore {
    async fn fetch_after(
        &self,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredUrl>, StoreError> {
        let docs = self.lock();
        let lower = match start_after {
            Some(cursor) => Bound::Excluded(cursor),
            None => Bound::Unbounded,
        };

        Ok(docs
            .range::<str, _>((lower, Bound::Unbounded))
            .take(limit)
            .map(|(id, data)| StoredUrl {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn touch_verified(&self, id: &str) -> Result<(), StoreError> {
        let mut docs = self.lock();
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        doc.last_verified = Some(Utc::now());
        Ok(())
    }

    async fn touch_viewed(&self, url: &str) -> Result<String, StoreError> {
        let id = url_to_id(url).map_err(|e| StoreError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let now = Utc::now();

        self.lock()
            .entry(id.clone())
            .and_modify(|doc| doc.last_viewed = now)
            .or_insert_with(|| TrackedUrl::new(url.trim(), now));
        Ok(id)
    }
}
