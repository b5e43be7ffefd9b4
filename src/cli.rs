// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - reconcile: one full pass over the store, recording dead URLs
// - check:     run the liveness check on a single URL
// - track:     record that URLs were viewed (adds them to the store)
//
// Every reconcile knob defaults to the production policy in config.rs.
// =============================================================================

use clap::{Parser, Subcommand};
use link_reconciler::config::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_PAGES, DEFAULT_METHOD, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_MS,
};
use link_reconciler::ReconcileConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "link-reconciler",
    version,
    about = "Re-validates tracked URLs and records the ones that have gone dead",
    long_about = "link-reconciler walks a store of tracked URLs page by page, checks each one \
                  over HTTP, and appends dead ones to a checkpoint file. Reruns resume after \
                  the last dead URL recorded."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every tracked URL and record the invalid ones
    ///
    /// Example: link-reconciler reconcile --store urls.json --checkpoint invalid-urls.txt
    Reconcile {
        /// JSON document store holding the tracked URLs
        #[arg(long, default_value = "urls.json")]
        store: PathBuf,

        /// Checkpoint file of URLs already found invalid
        #[arg(long, default_value = "invalid-urls.txt")]
        checkpoint: PathBuf,

        /// Documents per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,

        /// Maximum pages per pass
        #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: usize,

        /// Checks in flight at once
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Per-check timeout in milliseconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout_ms: u64,

        /// HTTP method used for checks
        #[arg(long, default_value = DEFAULT_METHOD)]
        method: String,

        /// Output the summary as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check a single URL and print the verdict
    ///
    /// Example: link-reconciler check https://example.com --method HEAD
    Check {
        /// URL to check
        url: String,

        /// HTTP method
        #[arg(long, default_value = DEFAULT_METHOD)]
        method: String,

        /// Timeout in milliseconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout_ms: u64,

        /// Output the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record that one or more URLs were just viewed
    ///
    /// Example: link-reconciler track https://example.com https://example.org
    Track {
        /// URLs to record
        #[arg(required = true)]
        urls: Vec<String>,

        /// JSON document store to update
        #[arg(long, default_value = "urls.json")]
        store: PathBuf,
    },
}

impl Commands {
    /// Builds the pass settings for `reconcile`; None for other commands.
    pub fn reconcile_config(&self) -> Option<ReconcileConfig> {
        match self {
            Commands::Reconcile {
                page_size,
                max_pages,
                concurrency,
                timeout_ms,
                method,
                ..
            } => Some(ReconcileConfig {
                page_size: *page_size,
                max_pages: *max_pages,
                concurrency: *concurrency,
                timeout_ms: *timeout_ms,
                method: method.clone(),
            }),
            _ => None,
        }
    }
}
