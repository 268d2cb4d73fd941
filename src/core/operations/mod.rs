//! Background bulk-operation subsystem
//!
//! A bulk operation is started by a single request, executed
//! asynchronously with bounded concurrency, and observed by clients
//! polling its operation record. The registry is the single owner of
//! all records; workers feed progress back through the reporter, and
//! the orchestrator drives the whole lifecycle in a detached task.

pub mod executor;
pub mod orchestrator;
pub mod registry;
pub mod reporter;
pub mod types;


pub use executor::BoundedExecutor;
pub use orchestrator::{BatchSummary, BulkJob, Finalizer, ItemResult, WorkOutcome};
pub use registry::{OperationRegistry, RetentionConfig};
pub use reporter::ProgressReporter;
pub use types::{BulkItem, OperationErrorEntry, OperationRecord, OperationStatus, mask_key};
