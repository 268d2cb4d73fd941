//! External collaborators: persistence and identity
//!
//! The relational store and the login system are not part of this
//! service; they are reached through the traits here. `InMemoryStore`
//! and `StaticTokenSessions` are the process-local implementations
//! used in development and tests.

pub mod memory;
pub mod session;

pub use memory::InMemoryStore;
pub use session::{AdminContext, SessionService, StaticTokenSessions};

use crate::core::credentials::{CredentialFilter, CredentialRecord, NewCredential, UserRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Typed record store backing the admin surface
///
/// Per-item bulk workers call these operations concurrently; an
/// implementation must be safe under that load. Effects are not
/// transactional across a batch.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Fetch a credential by id
    async fn get_credential(&self, id: Uuid) -> Result<Option<CredentialRecord>>;

    /// Fetch a credential by its raw API key
    async fn find_credential_by_key(&self, api_key: &str) -> Result<Option<CredentialRecord>>;

    /// Insert a new credential record
    async fn create_credential(&self, new: NewCredential) -> Result<CredentialRecord>;

    /// Overwrite an existing credential record
    async fn update_credential(&self, record: &CredentialRecord) -> Result<()>;

    /// Delete a credential; returns whether it existed
    async fn delete_credential(&self, id: Uuid) -> Result<bool>;

    /// List credentials matching a filter
    async fn list_credentials(&self, filter: CredentialFilter) -> Result<Vec<CredentialRecord>>;

    /// Fetch a user by id
    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>>;

    /// Insert a new user
    async fn create_user(&self, username: &str) -> Result<UserRecord>;

    /// Add to a user's running count of received keys
    async fn add_keys_received(&self, user_id: Uuid, count: u32) -> Result<()>;
}
