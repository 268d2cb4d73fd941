//! Client-side SDK
//!
//! A small reqwest-based client for driving and observing bulk
//! operations from dashboards and scripts.

pub mod poller;

pub use poller::{OperationsClient, PollOutcome, StatusSnapshot};
