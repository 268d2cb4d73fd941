//! HTTP server core implementation

use crate::config::{Config, ServerConfig};
use crate::core::operations::OperationRegistry;
use crate::core::providers::HttpCredentialChecker;
use crate::server::routes;
use crate::server::state::AppState;
use crate::storage::{InMemoryStore, StaticTokenSessions};
use crate::utils::error::{Result, ServiceError};
use actix_cors::Cors;
use actix_web::{App, HttpServer as ActixHttpServer, middleware::DefaultHeaders, web};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with default collaborators
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let registry = Arc::new(OperationRegistry::new(config.operations.retention()));
        let store = Arc::new(InMemoryStore::new());
        let sessions = Arc::new(StaticTokenSessions::new(config.auth.admin_token.clone()));
        let checker = Arc::new(HttpCredentialChecker::new(config.providers.endpoints()));

        let state = AppState::new(config.clone(), registry, store, sessions, checker);

        Ok(Self {
            config: config.server.clone(),
            state,
        })
    }

    /// Create a server around an existing state (used by tests)
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.server.clone(),
            state,
        }
    }

    /// Create the Actix-web application
    pub fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let cors_config = &state.config.server.cors;
        let mut cors = Cors::default();

        if cors_config.enabled {
            if cors_config.allowed_origins.is_empty() {
                cors = cors.allow_any_origin();
            } else {
                for origin in &cors_config.allowed_origins {
                    cors = cors.allowed_origin(origin);
                }
            }
            cors = cors
                .allowed_methods(vec!["GET", "POST"])
                .allow_any_header()
                .max_age(3600);
        }

        App::new()
            .app_data(state)
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(DefaultHeaders::new().add(("Server", "credhub")))
            .configure(routes::health::configure_routes)
            .configure(routes::bulk::configure_routes)
            .configure(routes::operations::configure_routes)
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);

        let server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .bind(&bind_addr)
            .map_err(|e| {
                ServiceError::Config(format!("Failed to bind {}: {}", bind_addr, e))
            })?
            .run();

        info!("HTTP server listening on {}", bind_addr);

        server
            .await
            .map_err(|e| ServiceError::internal(format!("Server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
