//! Operation record types and id generation

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a bulk operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// Created, no item processed yet
    Pending,
    /// At least one progress update received
    Processing,
    /// Finished normally; item-level failures may still be present
    Completed,
    /// Aborted by a systemic failure
    Failed,
}

impl OperationStatus {
    /// Whether this state admits no further progress mutation
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed)
    }
}

/// A single failed input within an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationErrorEntry {
    /// Human-readable label of the input that failed
    pub item: String,
    /// Why it failed
    pub error: String,
}

/// Tracking state for one bulk operation
///
/// Owned exclusively by the [`super::OperationRegistry`]; all mutation
/// goes through registry operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Opaque unique identifier, `{prefix}_{millis}_{suffix}`
    pub operation_id: String,
    /// Current lifecycle state
    pub status: OperationStatus,
    /// Completion percentage, 0-100
    pub progress: u8,
    /// Items processed so far
    pub current_item: u32,
    /// Total items in the batch, fixed at creation
    pub total_items: u32,
    /// Latest status message, overwritten on each update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Inputs that failed, in the order the failures were recorded
    pub errors: Vec<OperationErrorEntry>,
    /// When the operation was created
    pub started_at: DateTime<Utc>,
    /// When the operation reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl OperationRecord {
    /// Create a fresh pending record
    pub fn new(operation_id: String, total_items: u32) -> Self {
        Self {
            operation_id,
            status: OperationStatus::Pending,
            progress: 0,
            current_item: 0,
            total_items,
            message: None,
            errors: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Percentage for a given item count against this record's total
    pub fn percentage(&self, current_item: u32) -> u8 {
        if self.total_items == 0 {
            return 0;
        }
        let pct = (current_item as f64 / self.total_items as f64 * 100.0).round();
        pct.min(100.0) as u8
    }
}

/// An input to a bulk job, labelled for progress and error reporting
pub trait BulkItem: Send + 'static {
    /// Short human-readable label used in messages and error entries
    fn label(&self) -> String;
}

/// Generate a unique operation id: `{prefix}_{unix-millis}_{suffix}`
pub fn generate_operation_id(prefix: &str) -> String {
    const SUFFIX_LEN: usize = 9;
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), suffix)
}

/// Truncate an API key for display, keeping the first 10 characters
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(10).collect();
    if key.chars().count() > 10 {
        format!("{}...", prefix)
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_id_shape() {
        let id = generate_operation_id("bulk_import");
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts[0], "bulk");
        assert_eq!(parts[1], "import");
        assert_eq!(parts.len(), 4);
        assert!(parts[2].parse::<i64>().is_ok());
        assert_eq!(parts[3].len(), 9);
    }

    #[test]
    fn test_operation_ids_are_unique() {
        let a = generate_operation_id("check_all");
        let b = generate_operation_id("check_all");
        assert_ne!(a, b);
    }

    #[test]
    fn test_percentage_rounding() {
        let record = OperationRecord::new("op".into(), 3);
        assert_eq!(record.percentage(0), 0);
        assert_eq!(record.percentage(1), 33);
        assert_eq!(record.percentage(2), 67);
        assert_eq!(record.percentage(3), 100);
    }

    #[test]
    fn test_percentage_zero_total() {
        let record = OperationRecord::new("op".into(), 0);
        assert_eq!(record.percentage(0), 0);
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk_1234567890abcdef"), "sk_1234567...");
        assert_eq!(mask_key("short"), "short");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&OperationStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn test_terminal_states() {
        assert!(OperationStatus::Completed.is_terminal());
        assert!(OperationStatus::Failed.is_terminal());
        assert!(!OperationStatus::Pending.is_terminal());
        assert!(!OperationStatus::Processing.is_terminal());
    }
}
