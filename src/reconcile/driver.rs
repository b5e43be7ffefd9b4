// src/reconcile/driver.rs
// =============================================================================
// One full reconciliation pass over the tracked URLs.
//
//   INIT            load + sort-rewrite the checkpoint
//   RESUME_COMPUTED turn its last entry into a start-after cursor
//   PAGINATING      pull every page into memory, one page at a time
//   VALIDATING      check every URL, at most `concurrency` at once
//   CHECKPOINTING   (happens during VALIDATING) invalid URLs are appended as
//                   soon as they're found
//   DONE            return the RunSummary
//
// Failures:
// - a store error while paginating aborts the run
// - a task that errors is logged and left out of the removal count
// - a checkpoint write error aborts the run once validation drains
//
// Only the driver writes the checkpoint. Tasks send invalid URLs over a
// channel and a single writer future appends them.
// =============================================================================

use super::checkpoint::{resume_cursor_from, CheckpointStore};
use super::paginate::paginate;
use super::runner::{run_all, TaskError};
use crate::checker::UrlValidator;
use crate::config::ReconcileConfig;
use crate::models::{RunSummary, StoredUrl, ValidationOutcome};
use crate::store::UrlStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Everything a pass produced, for callers that want more than the summary.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub summary: RunSummary,
    /// Start-after cursor the pass resumed from, if any
    pub resumed_after: Option<String>,
    /// Verdicts in the same order as `summary.all_urls` (failed tasks omitted)
    pub outcomes: Vec<ValidationOutcome>,
    /// Tasks that errored instead of producing a verdict
    pub failed_tasks: usize,
}

pub struct Reconciler {
    store: Arc<dyn UrlStore>,
    validator: UrlValidator,
    checkpoint: CheckpointStore,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn UrlStore>,
        validator: UrlValidator,
        checkpoint: CheckpointStore,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            store,
            validator,
            checkpoint,
            config,
        }
    }

    /// Runs a pass and returns `{ numRemoved, allUrls }`.
    pub async fn run(&self) -> Result<RunSummary> {
        Ok(self.run_report().await?.summary)
    }

    /// Runs a pass and returns the full report.
    pub async fn run_report(&self) -> Result<ReconcileReport> {
        self.config.validate()?;
        let method = self.config.http_method()?;

        // INIT + RESUME_COMPUTED
        let known_invalid = self.checkpoint.load().await?;
        let resumed_after = resume_cursor_from(&known_invalid);
        info!(
            checkpoint = %self.checkpoint.path().display(),
            known_invalid = known_invalid.len(),
            resume = resumed_after.as_deref().unwrap_or("<start>"),
            "starting reconciliation"
        );

        // PAGINATING
        let all_docs = self.collect_urls(resumed_after.clone()).await?;
        info!(urls = all_docs.len(), "pagination complete");

        // VALIDATING (+ CHECKPOINTING)
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let tasks: Vec<_> = all_docs
            .iter()
            .map(|doc| {
                // Touch by the key the store returned; it may not be the
                // canonical id for the url.
                let id = doc.id.clone();
                let url = doc.data.url.clone();
                let store = Arc::clone(&self.store);
                let validator = self.validator.clone();
                let method = method.clone();
                let timeout = self.config.timeout();
                let tx = tx.clone();

                move || async move {
                    let ok = validator.validate(method, &url, timeout).await;

                    store
                        .touch_verified(&id)
                        .await
                        .with_context(|| format!("Failed to mark {} verified", url))?;

                    if !ok {
                        tx.send(url.clone())
                            .map_err(|_| anyhow::anyhow!("checkpoint writer stopped"))?;
                    }
                    Ok::<_, anyhow::Error>(ValidationOutcome { url, ok })
                }
            })
            .collect();
        // Tasks hold the only senders now; the writer stops once they're done.
        drop(tx);

        let checkpoint = &self.checkpoint;
        let writer = async move {
            let mut appended = 0usize;
            while let Some(url) = rx.recv().await {
                checkpoint.append(std::slice::from_ref(&url)).await?;
                debug!(url = %url, "recorded invalid url");
                appended += 1;
            }
            Ok::<usize, anyhow::Error>(appended)
        };

        let (results, appended) = tokio::join!(run_all(tasks, self.config.concurrency), writer);
        let appended = appended.context("Checkpoint write failed")?;

        let mut report = ReconcileReport {
            resumed_after,
            ..Default::default()
        };

        for (doc, result) in all_docs.iter().zip(results) {
            match result {
                Ok(outcome) => {
                    if !outcome.ok {
                        info!(url = %outcome.url, "invalid url");
                        report.summary.num_removed += 1;
                    }
                    report.outcomes.push(outcome);
                }
                Err(TaskError::Failed(e)) => {
                    let error = format!("{:#}", e);
                    warn!(url = %doc.data.url, error = %error, "validation task failed");
                    report.failed_tasks += 1;
                }
                Err(e @ TaskError::Panicked(_)) => {
                    warn!(url = %doc.data.url, error = %e, "validation task panicked");
                    report.failed_tasks += 1;
                }
            }
        }

        self.store
            .flush()
            .await
            .context("Failed to persist verification timestamps")?;

        info!(
            checked = report.outcomes.len(),
            removed = report.summary.num_removed,
            failed = report.failed_tasks,
            appended,
            "reconciliation complete"
        );

        report.summary.all_urls = all_docs.into_iter().map(|doc| doc.data).collect();
        Ok(report)
    }

    /// Drains the paginator into memory.
    async fn collect_urls(&self, start_after: Option<String>) -> Result<Vec<StoredUrl>> {
        let mut all_docs = Vec::new();
        paginate(
            self.store.as_ref(),
            self.config.page_size,
            self.config.max_pages,
            start_after,
            |page| all_docs.extend(page.urls),
        )
        .await
        .context("Pagination failed")?;
        Ok(all_docs)
    }
}
