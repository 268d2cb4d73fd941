//! Per-item workers for the bulk job kinds
//!
//! Each factory closes over the collaborators a worker needs and
//! returns the closure the orchestrator drives. Workers report their
//! own failures through their return value; only a panic or a failed
//! finalizer aborts a batch.

use super::types::{CredentialRecord, CredentialStatus, NewCredential, ProviderKind};
use crate::core::operations::{BulkItem, ItemResult, WorkOutcome, mask_key};
use crate::core::providers::{CheckOutcome, CredentialChecker};
use crate::storage::PersistenceService;
use crate::utils::retry::RetryPolicy;
use futures::future::BoxFuture;
use std::sync::Arc;
use uuid::Uuid;

/// One raw key from a bulk-import request
pub struct ImportItem {
    pub api_key: String,
}

impl BulkItem for ImportItem {
    fn label(&self) -> String {
        mask_key(&self.api_key)
    }
}

/// One credential id from a bulk-assign request
pub struct AssignItem {
    pub credential_id: Uuid,
}

impl BulkItem for AssignItem {
    fn label(&self) -> String {
        format!("key {}", &self.credential_id.as_simple().to_string()[..8])
    }
}

/// One stored credential to re-validate
pub struct CheckItem {
    pub credential: CredentialRecord,
}

impl BulkItem for CheckItem {
    fn label(&self) -> String {
        self.credential.display_label()
    }
}

/// Worker that inserts one imported key, skipping duplicates
pub fn import_worker(
    store: Arc<dyn PersistenceService>,
    provider: ProviderKind,
    assigned_user_id: Option<Uuid>,
) -> impl Fn(ImportItem) -> BoxFuture<'static, ItemResult> + Send + Sync + Clone + 'static {
    move |item: ImportItem| {
        let store = Arc::clone(&store);
        Box::pin(async move {
            if store.find_credential_by_key(&item.api_key).await?.is_some() {
                return Ok(WorkOutcome::Skipped("key already exists".to_string()));
            }

            store
                .create_credential(NewCredential {
                    provider,
                    api_key: item.api_key,
                    label: None,
                    assigned_user_id,
                })
                .await?;
            Ok(WorkOutcome::Done)
        })
    }
}

/// Worker that assigns one key to a user, skipping ineligible keys
pub fn assign_worker(
    store: Arc<dyn PersistenceService>,
    user_id: Uuid,
) -> impl Fn(AssignItem) -> BoxFuture<'static, ItemResult> + Send + Sync + Clone + 'static {
    move |item: AssignItem| {
        let store = Arc::clone(&store);
        Box::pin(async move {
            let Some(mut credential) = store.get_credential(item.credential_id).await? else {
                return Ok(WorkOutcome::Skipped("key does not exist".to_string()));
            };

            if credential.assigned_user_id.is_some() {
                return Ok(WorkOutcome::Skipped("already assigned".to_string()));
            }
            if credential.status != CredentialStatus::Active {
                return Ok(WorkOutcome::Skipped(format!(
                    "key is {}",
                    match credential.status {
                        CredentialStatus::OutOfCredit => "out of credit",
                        _ => "dead",
                    }
                )));
            }
            if !credential.is_assignable() {
                return Ok(WorkOutcome::Skipped(format!(
                    "insufficient credit ({})",
                    credential.credit_balance.unwrap_or(0)
                )));
            }

            credential.assigned_user_id = Some(user_id);
            store.update_credential(&credential).await?;
            Ok(WorkOutcome::Done)
        })
    }
}

/// Worker that re-validates one key against its provider
///
/// The outbound call goes through the retry policy; a key the provider
/// rejects is marked dead, a transient transport failure is recorded
/// on the credential and surfaces as an item-level failure.
pub fn check_worker(
    store: Arc<dyn PersistenceService>,
    checker: Arc<dyn CredentialChecker>,
    retry: RetryPolicy,
) -> impl Fn(CheckItem) -> BoxFuture<'static, ItemResult> + Send + Sync + Clone + 'static {
    move |item: CheckItem| {
        let store = Arc::clone(&store);
        let checker = Arc::clone(&checker);
        let retry = retry.clone();
        Box::pin(async move {
            let mut credential = item.credential;
            let provider = credential.provider;
            let api_key = credential.api_key.clone();

            let outcome = retry
                .call(|| {
                    let checker = Arc::clone(&checker);
                    let api_key = api_key.clone();
                    async move { checker.check(provider, &api_key).await }
                })
                .await;

            match outcome {
                Ok(CheckOutcome::Valid { credit_balance }) => {
                    credential.credit_balance = Some(credit_balance);
                    credential.status = if credit_balance > 0 {
                        CredentialStatus::Active
                    } else {
                        CredentialStatus::OutOfCredit
                    };
                    credential.last_error = None;
                    store.update_credential(&credential).await?;
                    Ok(WorkOutcome::Done)
                }
                Ok(CheckOutcome::Invalid { reason }) => {
                    credential.status = CredentialStatus::Dead;
                    credential.last_error = Some(reason.clone());
                    store.update_credential(&credential).await?;
                    Ok(WorkOutcome::Skipped(format!("key rejected: {}", reason)))
                }
                Err(e) => {
                    credential.last_error = Some(e.to_string());
                    // Best effort: the check itself already failed.
                    let _ = store.update_credential(&credential).await;
                    Err(e)
                }
            }
        })
    }
}
