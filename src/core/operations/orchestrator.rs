//! Bulk job orchestrator
//!
//! Ties the registry, executor, and reporter together. `start` creates
//! the operation record and returns its id immediately; a detached
//! task drives the batch and finalizes the record exactly once. All
//! failure modes are converted into record state — nothing escapes the
//! spawned task, and per-item side effects are not transactional
//! across the batch.

use super::executor::BoundedExecutor;
use super::registry::OperationRegistry;
use super::reporter::ProgressReporter;
use super::types::{BulkItem, generate_operation_id};
use crate::utils::error::ServiceError;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info};

/// Per-item verdict from a worker
#[derive(Debug)]
pub enum WorkOutcome {
    /// The item was processed successfully
    Done,
    /// The item was deliberately not processed; recorded as an
    /// item-level error with the given reason
    Skipped(String),
}

/// What a per-item worker returns
///
/// `Err` is an item-level failure: it is recorded against the item and
/// does not stop the batch. Systemic failures are panics or a failed
/// finalizer, which terminate the whole operation.
pub type ItemResult = std::result::Result<WorkOutcome, ServiceError>;

/// Tally of a finished batch
#[derive(Debug, Clone, Copy)]
pub struct BatchSummary {
    pub total: u32,
    pub succeeded: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl BatchSummary {
    fn message(&self) -> String {
        format!(
            "Completed: {} succeeded, {} skipped, {} failed",
            self.succeeded, self.skipped, self.failed
        )
    }
}

/// Hook run after all items finish, before the record completes
///
/// Used for batch-level bookkeeping such as bumping a user's received
/// counter after an assignment run. An error here is systemic.
pub type Finalizer =
    Box<dyn FnOnce(BatchSummary) -> BoxFuture<'static, std::result::Result<(), ServiceError>> + Send>;

/// Launches bulk jobs against a shared registry
#[derive(Clone)]
pub struct BulkJob {
    registry: Arc<OperationRegistry>,
}

impl BulkJob {
    /// Create an orchestrator bound to a registry
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this orchestrator writes to
    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    /// Start a bulk job and return its operation id immediately
    ///
    /// `kind` becomes the operation-id prefix; `verb` is used in
    /// per-item progress messages ("Imported", "Checked", ...).
    pub fn start<T, F, Fut>(
        &self,
        kind: &str,
        verb: &str,
        items: Vec<T>,
        worker: F,
        limit: usize,
    ) -> String
    where
        T: BulkItem,
        F: Fn(T) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ItemResult> + Send + 'static,
    {
        self.start_with_finalizer(kind, verb, items, worker, limit, None)
    }

    /// Start a bulk job with a batch-level finalizer
    pub fn start_with_finalizer<T, F, Fut>(
        &self,
        kind: &str,
        verb: &str,
        items: Vec<T>,
        worker: F,
        limit: usize,
        finalizer: Option<Finalizer>,
    ) -> String
    where
        T: BulkItem,
        F: Fn(T) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ItemResult> + Send + 'static,
    {
        let operation_id = generate_operation_id(kind);
        let total = items.len() as u32;
        self.registry.create(&operation_id, total);

        info!(%operation_id, total, limit, "bulk job launched");

        let registry = Arc::clone(&self.registry);
        let id = operation_id.clone();
        let verb = verb.to_string();

        // Fire-and-forget: the caller must never await this task.
        tokio::spawn(async move {
            let batch = AssertUnwindSafe(run_batch(
                Arc::clone(&registry),
                id.clone(),
                verb,
                items,
                worker,
                limit,
            ))
            .catch_unwind()
            .await;

            match batch {
                Ok(summary) => {
                    if let Some(finish) = finalizer {
                        if let Err(e) = finish(summary).await {
                            error!(operation_id = %id, error = %e, "batch finalizer failed");
                            registry.fail(&id, format!("Finalization failed: {}", e));
                            return;
                        }
                    }
                    registry.complete(&id, summary.message());
                }
                Err(_) => {
                    error!(operation_id = %id, "bulk task panicked");
                    registry.fail(&id, "Systemic failure: bulk task aborted unexpectedly");
                }
            }
        });

        operation_id
    }
}

/// Drive the executor over all items and tally the results
///
/// The tally is computed only after every result is in, never
/// incrementally, so the last in-flight workers cannot race it.
async fn run_batch<T, F, Fut>(
    registry: Arc<OperationRegistry>,
    operation_id: String,
    verb: String,
    items: Vec<T>,
    worker: F,
    limit: usize,
) -> BatchSummary
where
    T: BulkItem,
    F: Fn(T) -> Fut + Send + Sync + Clone + 'static,
    Fut: std::future::Future<Output = ItemResult> + Send + 'static,
{
    let total = items.len() as u32;
    let reporter = Arc::new(ProgressReporter::new(
        Arc::clone(&registry),
        operation_id.clone(),
        total,
    ));
    let executor = BoundedExecutor::new(limit);

    let wrapped = {
        let registry = Arc::clone(&registry);
        let reporter = Arc::clone(&reporter);
        let operation_id = operation_id.clone();
        move |_index: usize, item: T| {
            let registry = Arc::clone(&registry);
            let reporter = Arc::clone(&reporter);
            let operation_id = operation_id.clone();
            let verb = verb.clone();
            let worker = worker.clone();
            async move {
                let label = item.label();
                let result = worker(item).await;

                let tally = match &result {
                    Ok(WorkOutcome::Done) => ItemTally::Succeeded,
                    Ok(WorkOutcome::Skipped(reason)) => {
                        registry.add_error(&operation_id, label.as_str(), reason.as_str());
                        ItemTally::Skipped
                    }
                    Err(e) => {
                        registry.add_error(&operation_id, label.as_str(), e.to_string());
                        ItemTally::Failed
                    }
                };

                // Progress advances after every item, success or not.
                reporter.advance(format!("{} {}", verb, label));
                tally
            }
        }
    };

    let results = executor.run(items, wrapped).await;

    let mut summary = BatchSummary {
        total,
        succeeded: 0,
        skipped: 0,
        failed: 0,
    };
    for tally in &results {
        match tally {
            ItemTally::Succeeded => summary.succeeded += 1,
            ItemTally::Skipped => summary.skipped += 1,
            ItemTally::Failed => summary.failed += 1,
        }
    }
    summary
}

enum ItemTally {
    Succeeded,
    Skipped,
    Failed,
}
