// src/reconcile/paginate.rs
// =============================================================================
// Walks the URL collection one page at a time.
//
// How it works:
// 1. Ask the store for `page_size` documents after the cursor
// 2. Move the cursor to the last id the store actually returned
// 3. Drop documents whose id is not URL-shaped (other docs share the space)
// 4. Hand back the page with its store ids and the cursor; an empty fetch
//    means we're done
//
// A page counter guards against collections that never end: once more than
// `max_pages` pages have been asked for, the next page is an empty,
// complete one.
//
// Errors from the store are returned as-is. Nothing is retried or skipped;
// the caller decides what to do with a broken sweep.
// =============================================================================

use crate::models::{looks_like_url_id, Page};
use crate::store::{StoreError, UrlStore};
use tracing::debug;

pub struct Paginator<'a> {
    store: &'a dyn UrlStore,
    page_size: usize,
    max_pages: usize,
    cursor: Option<String>,
    pages_requested: usize,
    done: bool,
}

impl<'a> Paginator<'a> {
    /// `page_size` and `max_pages` are clamped to at least 1.
    pub fn new(
        store: &'a dyn UrlStore,
        page_size: usize,
        max_pages: usize,
        start_after: Option<String>,
    ) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
            cursor: start_after,
            pages_requested: 0,
            done: false,
        }
    }

    /// Fetches the next page.
    ///
    /// After a complete page has been returned, every later call returns
    /// another empty complete page without touching the store. Complete pages
    /// carry the last cursor reached, or `start_after` if nothing was read.
    pub async fn next_page(&mut self) -> Result<Page, StoreError> {
        if self.done {
            return Ok(Page::finished(self.cursor.clone()));
        }

        self.pages_requested += 1;
        if self.pages_requested > self.max_pages {
            debug!(max_pages = self.max_pages, "page ceiling reached");
            self.done = true;
            return Ok(Page::finished(self.cursor.clone()));
        }

        let docs = self
            .store
            .fetch_after(self.cursor.as_deref(), self.page_size)
            .await?;

        let Some(last) = docs.last() else {
            self.done = true;
            return Ok(Page::finished(self.cursor.clone()));
        };
        self.cursor = Some(last.id.clone());

        let fetched = docs.len();
        let urls: Vec<_> = docs
            .into_iter()
            .filter(|doc| looks_like_url_id(&doc.id))
            .collect();

        debug!(
            page = self.pages_requested,
            fetched,
            kept = urls.len(),
            cursor = self.cursor.as_deref().unwrap_or(""),
            "fetched page"
        );

        Ok(Page {
            urls,
            cursor: self.cursor.clone(),
            complete: false,
        })
    }
}

/// Drives a full sweep, calling `on_page` once per page including the final
/// empty complete one. Pages are strictly sequential.
pub async fn paginate<F>(
    store: &dyn UrlStore,
    page_size: usize,
    max_pages: usize,
    start_after: Option<String>,
    mut on_page: F,
) -> Result<(), StoreError>
where
    F: FnMut(Page),
{
    let mut paginator = Paginator::new(store, page_size, max_pages, start_after);
    loop {
        let page = paginator.next_page().await?;
        let complete = page.complete;
        on_page(page);
        if complete {
            return Ok(());
        }
    }
}
