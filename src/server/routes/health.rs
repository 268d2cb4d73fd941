//! Health check endpoint

use crate::server::routes::ApiResponse;
use actix_web::{HttpResponse, web};
use std::borrow::Cow;
use tracing::debug;

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

/// Basic health check endpoint
///
/// Used by load balancers and monitoring; always succeeds while the
/// process is serving requests.
pub async fn health_check() -> HttpResponse {
    debug!("Health check requested");

    let health_status = HealthStatus {
        status: Cow::Borrowed("healthy"),
        timestamp: chrono::Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
    };

    HttpResponse::Ok().json(ApiResponse::success(health_status))
}

/// Basic health status
#[derive(Debug, Clone, serde::Serialize)]
struct HealthStatus {
    status: Cow<'static, str>,
    timestamp: chrono::DateTime<chrono::Utc>,
    version: Cow<'static, str>,
}
