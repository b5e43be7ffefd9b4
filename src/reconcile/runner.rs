// src/reconcile/runner.rs
// =============================================================================
// Runs many independent async tasks with a cap on how many are in flight.
//
// - Every task runs exactly once
// - At most `max_concurrent` are unresolved at any moment; when one finishes
//   the next queued one starts
// - A task that fails (returns Err or panics) becomes a TaskError in its
//   slot. It never stops or skips the others.
// - The returned Vec has one entry per task, in submission order, even though
//   tasks finish in any order
//
// Same building block as link-guardian's checker: a stream of futures run
// through buffer_unordered. Each future carries its index so the results can
// be put back in order at the end.
// =============================================================================

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use thiserror::Error;

/// Why a task produced no value.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task failed: {0:#}")]
    Failed(#[from] anyhow::Error),

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Result slot for one task.
pub type TaskOutcome<T> = Result<T, TaskError>;

/// Runs every task, at most `max_concurrent` at a time, and returns one
/// outcome per task in the order the tasks were given.
///
/// `max_concurrent` is clamped to at least 1.
pub async fn run_all<I, F, Fut, T>(tasks: I, max_concurrent: usize) -> Vec<TaskOutcome<T>>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    // Tasks are only called when buffer_unordered pulls them, so nothing
    // starts before it has a slot.
    let futures = tasks.into_iter().enumerate().map(|(index, task)| async move {
        let outcome = match AssertUnwindSafe(async move { task().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(TaskError::Failed(e)),
            Err(panic) => Err(TaskError::Panicked(panic_message(panic.as_ref()))),
        };
        (index, outcome)
    });

    let mut indexed: Vec<(usize, TaskOutcome<T>)> = stream::iter(futures)
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, outcome)| outcome).collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
