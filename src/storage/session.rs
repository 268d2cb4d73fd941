//! Session/identity collaborator

use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;
use uuid::Uuid;

/// Authenticated administrator context
#[derive(Debug, Clone)]
pub struct AdminContext {
    /// Identity of the authenticated operator
    pub user_id: Uuid,
    /// Login name
    pub username: String,
}

/// Verifies bearer tokens against the identity system
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Verify a token, returning the admin it belongs to
    async fn verify_token(&self, token: &str) -> Result<AdminContext>;
}

/// Single shared-token implementation
///
/// Stands in for the real identity service: one configured token
/// grants the one admin identity. An empty configured token rejects
/// everything.
pub struct StaticTokenSessions {
    token: String,
    admin: AdminContext,
}

impl StaticTokenSessions {
    /// Create a session service accepting exactly `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            admin: AdminContext {
                user_id: Uuid::new_v4(),
                username: "admin".to_string(),
            },
        }
    }
}

#[async_trait]
impl SessionService for StaticTokenSessions {
    async fn verify_token(&self, token: &str) -> Result<AdminContext> {
        if !self.token.is_empty() && token == self.token {
            Ok(self.admin.clone())
        } else {
            Err(ServiceError::unauthorized("invalid or expired token"))
        }
    }
}
