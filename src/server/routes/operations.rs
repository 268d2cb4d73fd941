//! Operation status and enumeration endpoints
//!
//! Clients poll the status endpoint until the operation reaches a
//! terminal state. A not-found response is distinct from "still
//! pending": the id never existed, was already evicted, or the
//! process restarted.

use crate::server::routes::{ApiResponse, require_admin};
use crate::server::state::AppState;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, warn};

use crate::utils::error::Result;

/// Configure operation routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/operations")
            .route("", web::get().to(list_operations))
            .route("/{id}/status", web::get().to(operation_status)),
    );
}

/// Current snapshot of one operation
///
/// Unauthenticated by design: the id itself is an unguessable
/// capability handed out by a start endpoint.
async fn operation_status(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let operation_id = path.into_inner();
    debug!(%operation_id, "operation status requested");

    match state.registry.get(&operation_id) {
        Some(record) => HttpResponse::Ok().json(ApiResponse::success(record)),
        None => {
            let tracked = state.registry.tracked_ids();
            warn!(%operation_id, tracked = tracked.len(), "operation not found");
            HttpResponse::NotFound().json(ApiResponse::<()>::error_with_meta(
                "Operation not found: it may have finished and been evicted, or the server restarted"
                    .to_string(),
                serde_json::json!({
                    "operation_id": operation_id,
                    "tracked_operations": tracked,
                }),
            ))
        }
    }
}

/// Enumerate every tracked operation (admin only)
async fn list_operations(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    require_admin(&req, &state).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(state.registry.list_all())))
}
