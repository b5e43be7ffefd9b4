// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing) - diagnostics go to stderr, results to stdout
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = nothing invalid, 1 = invalid URLs found, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use link_reconciler::config::parse_method;
use link_reconciler::{
    CheckpointStore, JsonFileStore, ReconcileConfig, ReconcileReport, Reconciler, UrlStore,
    UrlValidator,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: logging was already initialised");
    }
}

// Returns:
//   Ok(0) = nothing invalid
//   Ok(1) = invalid URL(s) found
//   Err   = unexpected error
async fn run(cli: Cli) -> Result<i32> {
    let config = cli.command.reconcile_config();

    match cli.command {
        Commands::Reconcile {
            store,
            checkpoint,
            json,
            ..
        } => {
            let config = config.unwrap_or_default();
            handle_reconcile(&store, &checkpoint, config, json).await
        }
        Commands::Check {
            url,
            method,
            timeout_ms,
            json,
        } => handle_check(&url, &method, timeout_ms, json).await,
        Commands::Track { urls, store } => handle_track(&urls, &store).await,
    }
}

// Handles the 'reconcile' subcommand
async fn handle_reconcile(
    store_path: &Path,
    checkpoint_path: &Path,
    config: ReconcileConfig,
    json: bool,
) -> Result<i32> {
    config.validate()?;

    let store = JsonFileStore::open(store_path)
        .await
        .with_context(|| format!("Failed to open store {}", store_path.display()))?;

    if !json {
        println!("🔍 Reconciling {} tracked URL(s)", store.len());
        println!("📄 Checkpoint: {}", checkpoint_path.display());
    }

    let reconciler = Reconciler::new(
        Arc::new(store),
        UrlValidator::new()?,
        CheckpointStore::new(checkpoint_path),
        config,
    );
    let report = reconciler.run_report().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        print_report(&report);
    }

    Ok(if report.summary.num_removed > 0 { 1 } else { 0 })
}

// Handles the 'check' subcommand
async fn handle_check(url: &str, method: &str, timeout_ms: u64, json: bool) -> Result<i32> {
    let method = parse_method(method)?;
    let validator = UrlValidator::new()?;
    let verdict = validator
        .check(method, url, Duration::from_millis(timeout_ms))
        .await;

    if json {
        let output = serde_json::json!({
            "url": url,
            "ok": verdict.is_valid(),
            "detail": verdict,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{:<60} {}", url, verdict.label());
    }

    Ok(if verdict.is_valid() { 0 } else { 1 })
}

// Handles the 'track' subcommand
async fn handle_track(urls: &[String], store_path: &Path) -> Result<i32> {
    let store = JsonFileStore::open(store_path)
        .await
        .with_context(|| format!("Failed to open store {}", store_path.display()))?;

    for url in urls {
        let id = store.touch_viewed(url).await?;
        println!("📌 {} -> {}", url, id);
    }
    store.flush().await?;

    println!("📋 Store now tracks {} URL(s)", store.len());
    Ok(0)
}

// Prints a human-readable report: the invalid URLs, then counts
fn print_report(report: &ReconcileReport) {
    if let Some(cursor) = &report.resumed_after {
        println!(
            "⏩ Resumed after {}",
            link_reconciler::models::id_to_url(cursor)
        );
    }

    let invalid: Vec<_> = report.outcomes.iter().filter(|o| !o.ok).collect();
    if !invalid.is_empty() {
        println!();
        println!("{:<80} {:<10}", "URL", "STATUS");
        println!("{}", "=".repeat(90));
        for outcome in &invalid {
            let url_display = if outcome.url.chars().count() > 77 {
                format!("{}...", outcome.url.chars().take(77).collect::<String>())
            } else {
                outcome.url.clone()
            };
            println!("{:<80} {:<10}", url_display, "❌ INVALID");
        }
    }

    println!();
    println!("📊 Summary:");
    println!("   📋 Checked: {}", report.summary.all_urls.len());
    println!("   ✅ Valid: {}", report.outcomes.len() - invalid.len());
    println!("   ❌ Invalid: {}", report.summary.num_removed);
    if report.failed_tasks > 0 {
        println!("   ⚠️  Not checked (errors): {}", report.failed_tasks);
    }
}
