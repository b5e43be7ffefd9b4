// src/reconcile/checkpoint.rs
// =============================================================================
// The on-disk list of URLs already found to be invalid.
//
// File format: UTF-8, one URL per line, nothing else.
//
// - load() reads it, drops blank lines and duplicates, sorts it, and writes
//   it back sorted (with a trailing newline) before returning
// - append() only ever appends; sorting waits for the next load()
// - resume_cursor() turns the last sorted line into a document id so a rerun
//   can start after it
//
// The resume point is approximate. Within a page URLs are validated
// concurrently, so the greatest invalid URL on disk is not exactly where the
// last run stopped. A rerun may revisit or skip a few entries near it.
// =============================================================================

use crate::models::url_to_id;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads, sorts, deduplicates and rewrites the file.
    ///
    /// A missing file is an empty checkpoint and is left missing.
    pub async fn load(&self) -> Result<Vec<String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read checkpoint {}", self.path.display())
                })
            }
        };

        let entries: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let sorted = render(&entries);
        if sorted != content {
            tokio::fs::write(&self.path, sorted)
                .await
                .with_context(|| format!("Failed to rewrite checkpoint {}", self.path.display()))?;
        }

        debug!(path = %self.path.display(), entries = entries.len(), "loaded checkpoint");
        Ok(entries)
    }

    /// Loads the checkpoint and derives where a rerun should start.
    pub async fn resume_cursor(&self) -> Result<Option<String>> {
        let entries = self.load().await?;
        Ok(resume_cursor_from(&entries))
    }

    /// Appends URLs, one per line. Creates the file if needed.
    pub async fn append(&self, urls: &[String]) -> Result<()> {
        if urls.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open checkpoint {}", self.path.display()))?;

        let mut buf = String::new();
        for url in urls {
            buf.push_str(url);
            buf.push('\n');
        }

        file.write_all(buf.as_bytes())
            .await
            .with_context(|| format!("Failed to append to checkpoint {}", self.path.display()))?;
        file.flush().await?;
        Ok(())
    }
}

/// Resume cursor for already-sorted entries: the id of the last entry, if
/// that entry is a well-formed web URL.
pub fn resume_cursor_from(entries: &[String]) -> Option<String> {
    entries.last().and_then(|last| url_to_id(last).ok())
}

fn render(entries: &[String]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(entry);
        out.push('\n');
    }
    out
}
