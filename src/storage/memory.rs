//! In-memory persistence implementation

use super::PersistenceService;
use crate::core::credentials::{CredentialFilter, CredentialRecord, CredentialStatus, NewCredential, UserRecord};
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Process-local store for development and tests
#[derive(Default)]
pub struct InMemoryStore {
    credentials: RwLock<HashMap<Uuid, CredentialRecord>>,
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials
    pub fn credential_count(&self) -> usize {
        self.credentials.read().len()
    }
}

#[async_trait]
impl PersistenceService for InMemoryStore {
    async fn get_credential(&self, id: Uuid) -> Result<Option<CredentialRecord>> {
        Ok(self.credentials.read().get(&id).cloned())
    }

    async fn find_credential_by_key(&self, api_key: &str) -> Result<Option<CredentialRecord>> {
        Ok(self
            .credentials
            .read()
            .values()
            .find(|c| c.api_key == api_key)
            .cloned())
    }

    async fn create_credential(&self, new: NewCredential) -> Result<CredentialRecord> {
        let now = Utc::now();
        let record = CredentialRecord {
            id: Uuid::new_v4(),
            provider: new.provider,
            api_key: new.api_key,
            label: new.label,
            status: CredentialStatus::Active,
            credit_balance: None,
            assigned_user_id: new.assigned_user_id,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        self.credentials.write().insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_credential(&self, record: &CredentialRecord) -> Result<()> {
        let mut credentials = self.credentials.write();
        match credentials.get_mut(&record.id) {
            Some(existing) => {
                let mut updated = record.clone();
                updated.updated_at = Utc::now();
                *existing = updated;
                Ok(())
            }
            None => Err(ServiceError::not_found(format!(
                "credential {} does not exist",
                record.id
            ))),
        }
    }

    async fn delete_credential(&self, id: Uuid) -> Result<bool> {
        Ok(self.credentials.write().remove(&id).is_some())
    }

    async fn list_credentials(&self, filter: CredentialFilter) -> Result<Vec<CredentialRecord>> {
        let credentials = self.credentials.read();
        let mut matching: Vec<CredentialRecord> = credentials
            .values()
            .filter(|c| filter.provider.is_none_or(|p| c.provider == p))
            .filter(|c| filter.include_dead || c.status != CredentialStatus::Dead)
            .filter(|c| !filter.only_unassigned || c.assigned_user_id.is_none())
            .cloned()
            .collect();
        matching.sort_by_key(|c| c.created_at);
        Ok(matching)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn create_user(&self, username: &str) -> Result<UserRecord> {
        let mut users = self.users.write();
        if users.values().any(|u| u.username == username) {
            return Err(ServiceError::Conflict(format!(
                "username {} already exists",
                username
            )));
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            total_keys_received: 0,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn add_keys_received(&self, user_id: Uuid, count: u32) -> Result<()> {
        let mut users = self.users.write();
        match users.get_mut(&user_id) {
            Some(user) => {
                user.total_keys_received += count;
                Ok(())
            }
            None => Err(ServiceError::not_found(format!(
                "user {} does not exist",
                user_id
            ))),
        }
    }
}
