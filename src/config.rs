// src/config.rs
// =============================================================================
// Settings for one reconciliation pass.
//
// The defaults are the production policy:
//   page size 1000, at most 20 pages, 20 checks in flight, 30s per check, GET
//
// The CLI can override each of them (see cli.rs).
// =============================================================================

use anyhow::{anyhow, bail, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_MAX_PAGES: usize = 20;
pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_METHOD: &str = "GET";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Documents requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Hard ceiling on pages per sweep
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Validation requests in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// HTTP method used for validation
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            method: default_method(),
        }
    }
}

impl ReconcileConfig {
    /// Rejects zero sizes and unknown methods.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be at least 1");
        }
        self.http_method()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn http_method(&self) -> Result<Method> {
        parse_method(&self.method)
    }
}

/// Parses an HTTP method name, case-insensitively.
pub fn parse_method(name: &str) -> Result<Method> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("Invalid HTTP method: {}", name))
}
