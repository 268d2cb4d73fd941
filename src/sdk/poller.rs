//! Operation status polling client
//!
//! Polls the status endpoint on a fixed interval until the operation
//! reaches a terminal state. A not-found response is surfaced as the
//! distinct `Unknown` outcome: the id may never have existed, the
//! record may already have been evicted, or the server may have
//! restarted — none of which is a success.

use crate::core::operations::{OperationRecord, OperationStatus};
use crate::utils::error::{Result, ServiceError};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default polling interval
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One response from the status endpoint
#[derive(Debug)]
pub enum StatusSnapshot {
    /// The registry still holds the record
    Found(OperationRecord),
    /// The registry does not know the id
    Unknown {
        /// Ids the server is currently tracking, for diagnostics
        tracked_operations: Vec<String>,
    },
}

/// Terminal result of a polling loop
#[derive(Debug)]
pub enum PollOutcome {
    /// The operation finished normally
    Completed(OperationRecord),
    /// The operation was aborted by a systemic failure
    Failed(OperationRecord),
    /// The id is not tracked; progress cannot be confirmed
    Unknown,
}

/// Response envelope as the server serializes it
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
    meta: Option<serde_json::Value>,
}

/// HTTP client for the operations endpoints
pub struct OperationsClient {
    http: reqwest::Client,
    base_url: String,
    interval: Duration,
}

impl OperationsClient {
    /// Create a client for a service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            interval: POLL_INTERVAL,
        }
    }

    /// Override the polling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Fetch the current snapshot of one operation
    pub async fn status(&self, operation_id: &str) -> Result<StatusSnapshot> {
        let url = format!("{}/operations/{}/status", self.base_url, operation_id);
        let response = self.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            let envelope: Envelope<()> = response.json().await?;
            let tracked_operations = envelope
                .meta
                .as_ref()
                .and_then(|meta| meta.get("tracked_operations"))
                .and_then(|ids| serde_json::from_value(ids.clone()).ok())
                .unwrap_or_default();
            debug!(operation_id, "operation not tracked by server");
            return Ok(StatusSnapshot::Unknown { tracked_operations });
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::provider(format!(
                "status endpoint returned HTTP {}",
                status
            )));
        }

        let envelope: Envelope<OperationRecord> = response.json().await?;
        let record = envelope.data.ok_or_else(|| {
            ServiceError::provider(
                envelope
                    .error
                    .unwrap_or_else(|| "status response had no data".to_string()),
            )
        })?;
        Ok(StatusSnapshot::Found(record))
    }

    /// Poll until the operation reaches a terminal state
    pub async fn poll_to_completion(&self, operation_id: &str) -> Result<PollOutcome> {
        loop {
            match self.status(operation_id).await? {
                StatusSnapshot::Unknown { tracked_operations } => {
                    debug!(
                        operation_id,
                        tracked = tracked_operations.len(),
                        "stopping poll: operation unknown"
                    );
                    return Ok(PollOutcome::Unknown);
                }
                StatusSnapshot::Found(record) => match record.status {
                    OperationStatus::Completed => return Ok(PollOutcome::Completed(record)),
                    OperationStatus::Failed => return Ok(PollOutcome::Failed(record)),
                    _ => {
                        debug!(
                            operation_id,
                            progress = record.progress,
                            "operation in progress"
                        );
                        tokio::time::sleep(self.interval).await;
                    }
                },
            }
        }
    }
}
