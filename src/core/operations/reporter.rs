//! Progress reporter
//!
//! Small stateful helper bound to one operation id. Workers of the
//! same operation share one instance; `advance` atomically claims the
//! next item number and writes it through the registry, so concurrent
//! callers can never regress the counter or push it past the total.

use super::registry::OperationRegistry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Write-through progress counter for one operation
pub struct ProgressReporter {
    registry: Arc<OperationRegistry>,
    operation_id: String,
    total_items: u32,
    counter: AtomicU32,
}

impl ProgressReporter {
    /// Bind a reporter to an operation
    pub fn new(registry: Arc<OperationRegistry>, operation_id: String, total_items: u32) -> Self {
        Self {
            registry,
            operation_id,
            total_items,
            counter: AtomicU32::new(0),
        }
    }

    /// Claim the next item number and publish it with a message
    ///
    /// Returns the claimed count, clamped to `total_items`.
    pub fn advance(&self, message: impl Into<String>) -> u32 {
        let claimed = self
            .counter
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1)
            .min(self.total_items);
        self.registry.update(&self.operation_id, claimed, message);
        claimed
    }

    /// Items reported so far (clamped to the total)
    pub fn current(&self) -> u32 {
        self.counter.load(Ordering::SeqCst).min(self.total_items)
    }

    /// The operation this reporter feeds
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }
}
