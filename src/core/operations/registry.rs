//! Process-wide operation registry
//!
//! Single source of truth for all operation records. Mutations for one
//! id are serialized through the map's per-entry locks, which is what
//! makes `update` safe when many in-flight workers of the same
//! operation advance the shared counter. Terminal records are evicted
//! by a detached timer after a retention grace window.

use super::types::{OperationErrorEntry, OperationRecord, OperationStatus};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long terminal records are kept for slow pollers
///
/// Failed operations are retained at least as long as completed ones;
/// failure diagnostics take longer to consume.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Grace window for completed operations
    pub completed: Duration,
    /// Grace window for failed operations
    pub failed: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            completed: Duration::from_secs(15 * 60),
            failed: Duration::from_secs(20 * 60),
        }
    }
}

/// Keyed store of operation records with timed eviction
pub struct OperationRegistry {
    operations: DashMap<String, OperationRecord>,
    retention: RetentionConfig,
}

impl OperationRegistry {
    /// Create a registry with the given retention windows
    pub fn new(retention: RetentionConfig) -> Self {
        Self {
            operations: DashMap::new(),
            retention,
        }
    }

    /// Register a new pending operation
    pub fn create(&self, operation_id: &str, total_items: u32) -> OperationRecord {
        let record = OperationRecord::new(operation_id.to_string(), total_items);
        self.operations
            .insert(operation_id.to_string(), record.clone());
        debug!(operation_id, total_items, "operation created");
        record
    }

    /// Advance an operation's counter and overwrite its message
    ///
    /// The first update moves the record from `pending` to
    /// `processing`. The counter never regresses and never exceeds
    /// `total_items`, so progress is monotonically non-decreasing even
    /// when concurrent workers' updates arrive out of order. Updates
    /// against a terminal record are ignored.
    pub fn update(
        &self,
        operation_id: &str,
        current_item: u32,
        message: impl Into<String>,
    ) -> Option<OperationRecord> {
        let mut entry = self.operations.get_mut(operation_id)?;
        if entry.status.is_terminal() {
            return Some(entry.clone());
        }

        let capped = current_item.min(entry.total_items);
        if capped > entry.current_item {
            entry.current_item = capped;
            entry.progress = entry.percentage(capped);
        }
        entry.message = Some(message.into());
        entry.status = OperationStatus::Processing;
        Some(entry.clone())
    }

    /// Transition an operation to `completed` and schedule its eviction
    pub fn complete(
        self: &Arc<Self>,
        operation_id: &str,
        message: impl Into<String>,
    ) -> Option<OperationRecord> {
        let record = {
            let mut entry = self.operations.get_mut(operation_id)?;
            if entry.status.is_terminal() {
                return Some(entry.clone());
            }
            entry.status = OperationStatus::Completed;
            entry.progress = 100;
            entry.message = Some(message.into());
            entry.completed_at = Some(chrono::Utc::now());
            entry.clone()
        };

        info!(operation_id, "operation completed");
        self.schedule_eviction(operation_id, self.retention.completed);
        Some(record)
    }

    /// Transition an operation to `failed` and schedule its eviction
    ///
    /// Valid from both `processing` and `pending` (a batch can fail
    /// before any item starts).
    pub fn fail(
        self: &Arc<Self>,
        operation_id: &str,
        message: impl Into<String>,
    ) -> Option<OperationRecord> {
        let record = {
            let mut entry = self.operations.get_mut(operation_id)?;
            if entry.status.is_terminal() {
                return Some(entry.clone());
            }
            entry.status = OperationStatus::Failed;
            entry.message = Some(message.into());
            entry.completed_at = Some(chrono::Utc::now());
            entry.clone()
        };

        warn!(operation_id, message = ?record.message, "operation failed");
        self.schedule_eviction(operation_id, self.retention.failed);
        Some(record)
    }

    /// Append an item-level failure to an operation's error list
    ///
    /// The list is capped at `total_items`; an operation can never
    /// report more failures than it has inputs.
    pub fn add_error(
        &self,
        operation_id: &str,
        item: impl Into<String>,
        error: impl Into<String>,
    ) -> Option<OperationRecord> {
        let mut entry = self.operations.get_mut(operation_id)?;
        if entry.status.is_terminal() {
            return Some(entry.clone());
        }

        if entry.errors.len() < entry.total_items as usize {
            entry.errors.push(OperationErrorEntry {
                item: item.into(),
                error: error.into(),
            });
        } else {
            warn!(operation_id, "error list already at total_items, dropping entry");
        }
        Some(entry.clone())
    }

    /// Snapshot of one operation, if it is still tracked
    pub fn get(&self, operation_id: &str) -> Option<OperationRecord> {
        self.operations.get(operation_id).map(|r| r.clone())
    }

    /// Snapshot of every tracked operation
    pub fn list_all(&self) -> Vec<OperationRecord> {
        self.operations.iter().map(|r| r.clone()).collect()
    }

    /// Ids of every tracked operation
    pub fn tracked_ids(&self) -> Vec<String> {
        self.operations.iter().map(|r| r.key().clone()).collect()
    }

    fn schedule_eviction(self: &Arc<Self>, operation_id: &str, after: Duration) {
        let registry = Arc::clone(self);
        let operation_id = operation_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if registry.operations.remove(&operation_id).is_some() {
                debug!(%operation_id, "terminal operation evicted");
            }
        });
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new(RetentionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<OperationRegistry> {
        Arc::new(OperationRegistry::default())
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let reg = registry();
        let record = reg.create("op_1", 5);
        assert_eq!(record.status, OperationStatus::Pending);
        assert_eq!(record.current_item, 0);
        assert_eq!(record.total_items, 5);
        assert_eq!(record.progress, 0);
        assert!(record.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_first_update_moves_to_processing() {
        let reg = registry();
        reg.create("op_1", 4);
        let record = reg.update("op_1", 1, "working").unwrap();
        assert_eq!(record.status, OperationStatus::Processing);
        assert_eq!(record.current_item, 1);
        assert_eq!(record.progress, 25);
        assert_eq!(record.message.as_deref(), Some("working"));
    }

    #[tokio::test]
    async fn test_update_absent_id_returns_none() {
        let reg = registry();
        assert!(reg.update("nonexistent", 1, "x").is_none());
        assert!(reg.get("nonexistent").is_none());
    }

    #[tokio::test]
    async fn test_counter_never_regresses() {
        let reg = registry();
        reg.create("op_1", 10);
        reg.update("op_1", 7, "late");
        let record = reg.update("op_1", 3, "stale").unwrap();
        assert_eq!(record.current_item, 7);
        assert_eq!(record.progress, 70);
        // message still follows the latest call
        assert_eq!(record.message.as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_counter_capped_at_total() {
        let reg = registry();
        reg.create("op_1", 3);
        let record = reg.update("op_1", 99, "overshoot").unwrap();
        assert_eq!(record.current_item, 3);
        assert_eq!(record.progress, 100);
    }

    #[tokio::test]
    async fn test_complete_is_terminal() {
        let reg = registry();
        reg.create("op_1", 2);
        reg.update("op_1", 2, "done");
        let record = reg.complete("op_1", "all done").unwrap();
        assert_eq!(record.status, OperationStatus::Completed);
        assert_eq!(record.progress, 100);
        assert!(record.completed_at.is_some());

        // later updates are no-ops
        let after = reg.update("op_1", 1, "zombie").unwrap();
        assert_eq!(after.status, OperationStatus::Completed);
        assert_eq!(after.message.as_deref(), Some("all done"));
    }

    #[tokio::test]
    async fn test_fail_from_pending() {
        let reg = registry();
        reg.create("op_1", 2);
        let record = reg.fail("op_1", "pool unavailable").unwrap();
        assert_eq!(record.status, OperationStatus::Failed);
        assert!(record.completed_at.is_some());

        // a late complete cannot override the failure
        let after = reg.complete("op_1", "too late").unwrap();
        assert_eq!(after.status, OperationStatus::Failed);
    }

    #[tokio::test]
    async fn test_add_error_appends_in_order() {
        let reg = registry();
        reg.create("op_1", 3);
        reg.add_error("op_1", "key-a", "duplicate");
        let record = reg.add_error("op_1", "key-b", "rejected").unwrap();
        assert_eq!(record.errors.len(), 2);
        assert_eq!(record.errors[0].item, "key-a");
        assert_eq!(record.errors[1].item, "key-b");
    }

    #[tokio::test]
    async fn test_error_list_capped_at_total_items() {
        let reg = registry();
        reg.create("op_1", 2);
        for i in 0..5 {
            reg.add_error("op_1", format!("item-{}", i), "boom");
        }
        let record = reg.get("op_1").unwrap();
        assert_eq!(record.errors.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_record_evicted_after_grace_window() {
        let reg = Arc::new(OperationRegistry::new(RetentionConfig {
            completed: Duration::from_secs(60),
            failed: Duration::from_secs(120),
        }));
        reg.create("op_1", 1);
        reg.complete("op_1", "done");

        assert!(reg.get("op_1").is_some());

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(reg.get("op_1").is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(reg.get("op_1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_record_retained_longer() {
        let reg = Arc::new(OperationRegistry::new(RetentionConfig {
            completed: Duration::from_secs(60),
            failed: Duration::from_secs(120),
        }));
        reg.create("ok", 1);
        reg.create("bad", 1);
        reg.complete("ok", "done");
        reg.fail("bad", "boom");

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(reg.get("ok").is_none());
        assert!(reg.get("bad").is_some());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(reg.get("bad").is_none());
    }

    #[tokio::test]
    async fn test_list_all_and_tracked_ids() {
        let reg = registry();
        reg.create("op_1", 1);
        reg.create("op_2", 1);
        assert_eq!(reg.list_all().len(), 2);
        let mut ids = reg.tracked_ids();
        ids.sort();
        assert_eq!(ids, vec!["op_1", "op_2"]);
    }

    #[tokio::test]
    async fn test_concurrent_updates_stay_consistent() {
        let reg = registry();
        reg.create("op_1", 100);

        let mut handles = Vec::new();
        for i in 1..=100u32 {
            let reg = Arc::clone(&reg);
            handles.push(tokio::spawn(async move {
                reg.update("op_1", i, format!("item {}", i));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = reg.get("op_1").unwrap();
        assert_eq!(record.current_item, 100);
        assert_eq!(record.progress, 100);
    }
}
