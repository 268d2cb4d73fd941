//! Bulk job start endpoints
//!
//! Each handler validates its input, creates the operation, and
//! returns the operation id immediately; the batch itself runs in a
//! detached task and is observed through the operations endpoints.

use crate::core::credentials::{
    ASSIGNMENT_MIN_CREDIT, AssignItem, CheckItem, CredentialFilter, ImportItem, ProviderKind,
    assign_worker, check_worker, import_worker,
};
use crate::server::routes::{ApiResponse, require_admin};
use crate::server::state::AppState;
use crate::utils::error::{Result, ServiceError};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Configure bulk operation routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/credentials")
            .route("/bulk-import", web::post().to(bulk_import))
            .route("/bulk-assign", web::post().to(bulk_assign))
            .route("/check-all", web::post().to(check_all)),
    );
}

/// Bulk import request
#[derive(Debug, Deserialize)]
struct BulkImportRequest {
    /// Newline-delimited raw API keys
    keys_text: String,
    /// Which provider the keys belong to
    provider: ProviderKind,
    /// Assign every imported key to this user
    assigned_user_id: Option<Uuid>,
}

/// Bulk assign request
///
/// Either an explicit list of key ids, or a quantity of eligible
/// unassigned keys picked by the server.
#[derive(Debug, Deserialize)]
struct BulkAssignRequest {
    user_id: Uuid,
    key_ids: Option<Vec<Uuid>>,
    quantity: Option<u32>,
}

/// Response for every start endpoint
#[derive(Debug, Serialize)]
struct StartOperationResponse {
    operation_id: String,
    message: String,
    total_items: u32,
}

/// POST /credentials/bulk-import
///
/// Import a batch of keys. Duplicates are item-level errors, not
/// batch failures.
async fn bulk_import(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<BulkImportRequest>,
) -> Result<HttpResponse> {
    require_admin(&req, &state).await?;
    let body = body.into_inner();

    let keys: Vec<String> = body
        .keys_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if keys.is_empty() {
        return Err(ServiceError::validation("No keys found in keys_text"));
    }

    if let Some(user_id) = body.assigned_user_id {
        state
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User {} does not exist", user_id)))?;
    }

    let total = keys.len() as u32;
    let items: Vec<ImportItem> = keys.into_iter().map(|api_key| ImportItem { api_key }).collect();
    let worker = import_worker(
        Arc::clone(&state.store),
        body.provider,
        body.assigned_user_id,
    );

    let operation_id = state.jobs.start(
        "bulk_import",
        "Imported key",
        items,
        worker,
        state.config.operations.import_concurrency,
    );

    info!(%operation_id, total, provider = %body.provider, "bulk import started");
    Ok(HttpResponse::Ok().json(ApiResponse::success(StartOperationResponse {
        message: format!("Importing {} {} keys", total, body.provider),
        operation_id,
        total_items: total,
    })))
}

/// POST /credentials/bulk-assign
async fn bulk_assign(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<BulkAssignRequest>,
) -> Result<HttpResponse> {
    require_admin(&req, &state).await?;
    let body = body.into_inner();

    let user = state
        .store
        .get_user(body.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("User {} does not exist", body.user_id)))?;

    let key_ids = match (&body.key_ids, body.quantity) {
        (Some(ids), _) if !ids.is_empty() => ids.clone(),
        (_, Some(quantity)) if quantity > 0 => {
            select_assignable_keys(&state, quantity as usize).await?
        }
        _ => {
            return Err(ServiceError::validation(
                "Either key_ids or a positive quantity is required",
            ));
        }
    };

    let total = key_ids.len() as u32;
    let items: Vec<AssignItem> = key_ids
        .into_iter()
        .map(|credential_id| AssignItem { credential_id })
        .collect();
    let worker = assign_worker(Arc::clone(&state.store), user.id);

    // Bump the user's received counter once, after the whole batch.
    let store = Arc::clone(&state.store);
    let user_id = user.id;
    let finalizer: crate::core::operations::Finalizer = Box::new(move |summary| {
        Box::pin(async move {
            if summary.succeeded > 0 {
                store.add_keys_received(user_id, summary.succeeded).await?;
            }
            Ok(())
        })
    });

    let operation_id = state.jobs.start_with_finalizer(
        "bulk_assign",
        "Assigned key",
        items,
        worker,
        state.config.operations.import_concurrency,
        Some(finalizer),
    );

    info!(%operation_id, total, username = %user.username, "bulk assign started");
    Ok(HttpResponse::Ok().json(ApiResponse::success(StartOperationResponse {
        message: format!("Assigning {} keys to {}", total, user.username),
        operation_id,
        total_items: total,
    })))
}

/// Pick the N best unassigned keys: highest balance first, unknown
/// balance last, oldest first on ties.
async fn select_assignable_keys(state: &AppState, quantity: usize) -> Result<Vec<Uuid>> {
    let mut eligible: Vec<_> = state
        .store
        .list_credentials(CredentialFilter {
            only_unassigned: true,
            ..Default::default()
        })
        .await?
        .into_iter()
        .filter(|c| c.is_assignable())
        .collect();

    if eligible.is_empty() {
        return Err(ServiceError::validation(format!(
            "No unassigned keys with credit above {}",
            ASSIGNMENT_MIN_CREDIT
        )));
    }
    if eligible.len() < quantity {
        return Err(ServiceError::validation(format!(
            "Only {} keys available (requested {})",
            eligible.len(),
            quantity
        )));
    }

    eligible.sort_by(|a, b| {
        b.credit_balance
            .unwrap_or(i64::MIN)
            .cmp(&a.credit_balance.unwrap_or(i64::MIN))
            .then(a.created_at.cmp(&b.created_at))
    });
    Ok(eligible.into_iter().take(quantity).map(|c| c.id).collect())
}

/// POST /credentials/check-all
///
/// Re-validate every non-dead credential against its provider. With
/// nothing to check the operation still starts and completes
/// immediately, so clients always get a pollable id.
async fn check_all(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    require_admin(&req, &state).await?;

    let credentials = state
        .store
        .list_credentials(CredentialFilter::default())
        .await?;

    let total = credentials.len() as u32;
    let items: Vec<CheckItem> = credentials
        .into_iter()
        .map(|credential| CheckItem { credential })
        .collect();
    let worker = check_worker(
        Arc::clone(&state.store),
        Arc::clone(&state.checker),
        state.check_retry_policy(),
    );

    let operation_id = state.jobs.start(
        "check_all",
        "Checked key",
        items,
        worker,
        state.config.operations.check_concurrency,
    );

    info!(%operation_id, total, "credential check started");
    Ok(HttpResponse::Ok().json(ApiResponse::success(StartOperationResponse {
        message: format!("Checking {} keys", total),
        operation_id,
        total_items: total,
    })))
}
