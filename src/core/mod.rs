//! Core service functionality
//!
//! The bulk-operation subsystem lives in `operations`; the credential
//! domain (records and per-item workers) in `credentials`; outbound
//! provider validation in `providers`.

pub mod credentials;
pub mod operations;
pub mod providers;
