//! Credential domain types and bulk-job workers

pub mod types;
pub mod workers;

pub use types::{
    ASSIGNMENT_MIN_CREDIT, CredentialFilter, CredentialRecord, CredentialStatus, NewCredential,
    ProviderKind, UserRecord,
};
pub use workers::{AssignItem, CheckItem, ImportItem, assign_worker, check_worker, import_worker};
