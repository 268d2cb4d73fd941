//! Outbound credential validation
//!
//! The specific validity rules are the provider's business; this
//! module only distinguishes "the provider accepted the key and
//! reported a balance" from "the provider rejected it" from "the
//! provider could not be reached".

use crate::core::credentials::ProviderKind;
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Result of checking one credential against its provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The provider accepted the key
    Valid {
        /// Remaining credit as reported by the provider
        credit_balance: i64,
    },
    /// The provider rejected the key
    Invalid {
        /// What the provider said
        reason: String,
    },
}

/// Validates credentials against their provider
#[async_trait]
pub trait CredentialChecker: Send + Sync {
    /// Check one key; `Err` means the provider could not be reached
    /// (transient, retryable), not that the key is bad.
    async fn check(&self, provider: ProviderKind, api_key: &str) -> Result<CheckOutcome>;
}

/// Per-provider API base URLs
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub voice_api_base: String,
    pub image_api_base: String,
    pub language_api_base: String,
    pub proxy_api_base: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            voice_api_base: "https://api.elevenlabs.io".to_string(),
            image_api_base: "https://api.imagegen.example.com".to_string(),
            language_api_base: "https://api.openai.com".to_string(),
            proxy_api_base: "https://proxy.example.com".to_string(),
        }
    }
}

/// HTTP implementation of [`CredentialChecker`]
pub struct HttpCredentialChecker {
    client: reqwest::Client,
    endpoints: ProviderEndpoints,
}

impl HttpCredentialChecker {
    /// Create a checker with a fresh client and a 30 s request timeout
    pub fn new(endpoints: ProviderEndpoints) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client, endpoints }
    }

    /// Create a checker with an existing client
    pub fn with_client(client: reqwest::Client, endpoints: ProviderEndpoints) -> Self {
        Self { client, endpoints }
    }

    fn request(&self, provider: ProviderKind, api_key: &str) -> reqwest::RequestBuilder {
        match provider {
            ProviderKind::Voice => self
                .client
                .get(format!("{}/v1/user/subscription", self.endpoints.voice_api_base))
                .header("xi-api-key", api_key),
            ProviderKind::Image => self
                .client
                .get(format!("{}/v1/account", self.endpoints.image_api_base))
                .bearer_auth(api_key),
            ProviderKind::Language => self
                .client
                .get(format!("{}/v1/models", self.endpoints.language_api_base))
                .bearer_auth(api_key),
            ProviderKind::Proxy => self
                .client
                .get(format!("{}/status", self.endpoints.proxy_api_base))
                .header("x-api-key", api_key),
        }
    }

    /// Extract the remaining balance from a provider response body
    ///
    /// Missing fields read as zero, matching how the dashboards treat
    /// providers that do not report a balance.
    fn balance_from_body(provider: ProviderKind, body: &Value) -> i64 {
        let field = match provider {
            ProviderKind::Voice => "character_count",
            ProviderKind::Image | ProviderKind::Language => "credits",
            ProviderKind::Proxy => "bandwidth_left",
        };
        body.get(field).and_then(Value::as_i64).unwrap_or(0)
    }
}

#[async_trait]
impl CredentialChecker for HttpCredentialChecker {
    async fn check(&self, provider: ProviderKind, api_key: &str) -> Result<CheckOutcome> {
        let response = self
            .request(provider, api_key)
            .send()
            .await
            .map_err(|e| ServiceError::provider(format!("{} provider unreachable: {}", provider, e)))?;

        let status = response.status();
        debug!(%provider, %status, "credential check response");

        if status.is_success() {
            let body: Value = response.json().await.map_err(|e| {
                ServiceError::provider(format!("{} provider returned invalid body: {}", provider, e))
            })?;
            return Ok(CheckOutcome::Valid {
                credit_balance: Self::balance_from_body(provider, &body),
            });
        }

        // Overload and server-side errors are transient; let the
        // caller's retry policy decide. Anything else means the
        // provider looked at the key and said no.
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::provider(format!(
                "{} provider error: HTTP {}",
                provider, status
            )));
        }

        Ok(CheckOutcome::Invalid {
            reason: format!("HTTP {}", status.as_u16()),
        })
    }
}
