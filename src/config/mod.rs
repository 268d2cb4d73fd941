//! Configuration management
//!
//! Configuration is loaded from a YAML file, overlaid with environment
//! variables, and validated before the server starts.

use crate::core::operations::RetentionConfig;
use crate::core::providers::ProviderEndpoints;
use crate::utils::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main configuration struct for the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Admin authentication configuration
    pub auth: AuthConfig,
    /// Bulk-operation tuning
    pub operations: OperationsConfig,
    /// Outbound provider endpoints
    pub providers: ProvidersConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Whether CORS headers are emitted at all
    pub enabled: bool,
    /// Allowed origins; empty means any origin
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: Vec::new(),
        }
    }
}

/// Admin authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token granting admin access; empty rejects everything
    pub admin_token: String,
}

/// Bulk-operation tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationsConfig {
    /// Concurrency ceiling for database-bound work (import, assign)
    pub import_concurrency: usize,
    /// Concurrency ceiling for outbound provider calls; lower because
    /// the remote services impose their own rate limits
    pub check_concurrency: usize,
    /// Seconds a completed operation record is retained
    pub completed_retention_secs: u64,
    /// Seconds a failed operation record is retained
    pub failed_retention_secs: u64,
    /// Attempts per outbound check call
    pub check_retry_attempts: u32,
    /// Base backoff delay per outbound check call, in milliseconds
    pub check_retry_base_delay_ms: u64,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            import_concurrency: 10,
            check_concurrency: 5,
            completed_retention_secs: 15 * 60,
            failed_retention_secs: 20 * 60,
            check_retry_attempts: 3,
            check_retry_base_delay_ms: 500,
        }
    }
}

impl OperationsConfig {
    /// Retention windows as the registry expects them
    pub fn retention(&self) -> RetentionConfig {
        RetentionConfig {
            completed: Duration::from_secs(self.completed_retention_secs),
            failed: Duration::from_secs(self.failed_retention_secs),
        }
    }
}

/// Outbound provider endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub voice_api_base: String,
    pub image_api_base: String,
    pub language_api_base: String,
    pub proxy_api_base: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        let endpoints = ProviderEndpoints::default();
        Self {
            voice_api_base: endpoints.voice_api_base,
            image_api_base: endpoints.image_api_base,
            language_api_base: endpoints.language_api_base,
            proxy_api_base: endpoints.proxy_api_base,
        }
    }
}

impl ProvidersConfig {
    /// Endpoints as the checker expects them
    pub fn endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints {
            voice_api_base: self.voice_api_base.clone(),
            image_api_base: self.image_api_base.clone(),
            language_api_base: self.language_api_base.clone(),
            proxy_api_base: self.proxy_api_base.clone(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServiceError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ServiceError::Config(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Build configuration from defaults plus environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables onto the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = env::var("CREDHUB_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("CREDHUB_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| ServiceError::Config(format!("Invalid port: {}", e)))?;
        }
        if let Ok(token) = env::var("CREDHUB_ADMIN_TOKEN") {
            self.auth.admin_token = token;
        }
        if let Ok(limit) = env::var("CREDHUB_IMPORT_CONCURRENCY") {
            self.operations.import_concurrency = limit
                .parse()
                .map_err(|e| ServiceError::Config(format!("Invalid import concurrency: {}", e)))?;
        }
        if let Ok(limit) = env::var("CREDHUB_CHECK_CONCURRENCY") {
            self.operations.check_concurrency = limit
                .parse()
                .map_err(|e| ServiceError::Config(format!("Invalid check concurrency: {}", e)))?;
        }
        Ok(())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ServiceError::Config("Server port must not be 0".to_string()));
        }
        if self.operations.import_concurrency == 0 || self.operations.check_concurrency == 0 {
            return Err(ServiceError::Config(
                "Concurrency limits must be at least 1".to_string(),
            ));
        }
        if self.operations.failed_retention_secs < self.operations.completed_retention_secs {
            return Err(ServiceError::Config(
                "Failed operations must be retained at least as long as completed ones".to_string(),
            ));
        }
        if self.auth.admin_token.is_empty() {
            warn!("Admin token is not set; all admin endpoints will reject requests");
        } else if self.auth.admin_token.len() < 16 {
            warn!("Admin token is shorter than 16 characters");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_from_file() {
        let config_content = r#"
server:
  host: "0.0.0.0"
  port: 9090

auth:
  admin_token: "test-admin-token-32-characters!!"

operations:
  import_concurrency: 4
  check_concurrency: 2

providers:
  voice_api_base: "http://localhost:4010"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.operations.import_concurrency, 4);
        assert_eq!(config.operations.check_concurrency, 2);
        assert_eq!(config.providers.voice_api_base, "http://localhost:4010");
        // unspecified sections keep their defaults
        assert_eq!(config.operations.completed_retention_secs, 900);
        assert_eq!(config.providers.language_api_base, "https://api.openai.com");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.operations.check_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retention_ordering_enforced() {
        let mut config = Config::default();
        config.operations.failed_retention_secs = 60;
        config.operations.completed_retention_secs = 600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retention_conversion() {
        let retention = OperationsConfig::default().retention();
        assert_eq!(retention.completed, Duration::from_secs(900));
        assert_eq!(retention.failed, Duration::from_secs(1200));
    }
}
