//! # credhub
//!
//! Administrative service for provisioning and monitoring third-party
//! API credentials (voice-synthesis, generative-image, language-model,
//! and network-proxy keys) across a user base.
//!
//! The heart of the crate is the background bulk-operation subsystem:
//! a long-running, many-item task (importing hundreds of keys,
//! re-validating every key against its provider, mass-assigning keys
//! to users) is started by a single request, executed with bounded
//! concurrency in a detached task, and observed by polling a progress
//! record until it reaches a terminal state.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use credhub::{Config, server::HttpServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/service.yaml").await?;
//!     let server = HttpServer::new(&config).await?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Polling an operation
//!
//! ```rust,no_run
//! use credhub::sdk::{OperationsClient, PollOutcome};
//!
//! # async fn poll() -> credhub::Result<()> {
//! let client = OperationsClient::new("http://localhost:8080");
//! match client.poll_to_completion("bulk_import_1732_x9k2m4p1q").await? {
//!     PollOutcome::Completed(record) => println!("done: {:?}", record.message),
//!     PollOutcome::Failed(record) => eprintln!("failed: {:?}", record.message),
//!     PollOutcome::Unknown => eprintln!("progress cannot be confirmed"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod sdk;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use core::operations::{
    BulkJob, OperationRecord, OperationRegistry, OperationStatus, RetentionConfig,
};
pub use utils::error::{Result, ServiceError};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
