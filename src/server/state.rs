//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::core::operations::{BulkJob, OperationRegistry};
use crate::core::providers::CredentialChecker;
use crate::storage::{PersistenceService, SessionService};
use crate::utils::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

/// HTTP server state shared across handlers
///
/// All fields are behind `Arc` so cloning the state per worker thread
/// is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration (shared read-only)
    pub config: Arc<Config>,
    /// Operation registry
    pub registry: Arc<OperationRegistry>,
    /// Bulk job orchestrator bound to the registry
    pub jobs: BulkJob,
    /// Persistence collaborator
    pub store: Arc<dyn PersistenceService>,
    /// Identity collaborator
    pub sessions: Arc<dyn SessionService>,
    /// Outbound credential checker
    pub checker: Arc<dyn CredentialChecker>,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(
        config: Config,
        registry: Arc<OperationRegistry>,
        store: Arc<dyn PersistenceService>,
        sessions: Arc<dyn SessionService>,
        checker: Arc<dyn CredentialChecker>,
    ) -> Self {
        let jobs = BulkJob::new(Arc::clone(&registry));
        Self {
            config: Arc::new(config),
            registry,
            jobs,
            store,
            sessions,
            checker,
        }
    }

    /// Retry policy for outbound check calls, from configuration
    pub fn check_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_attempts(
            self.config.operations.check_retry_attempts,
            Duration::from_millis(self.config.operations.check_retry_base_delay_ms),
        )
    }
}
