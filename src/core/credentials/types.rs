//! Credential and user record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum credit balance a key must have to be assignable
///
/// Keys with an unknown balance are considered assignable; the next
/// check run will correct the record if the balance turns out low.
pub const ASSIGNMENT_MIN_CREDIT: i64 = 800;

/// Which third-party service a credential belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Voice-synthesis provider
    Voice,
    /// Generative-image provider
    Image,
    /// Language-model provider
    Language,
    /// Network-proxy provider
    Proxy,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderKind::Voice => "voice",
            ProviderKind::Image => "image",
            ProviderKind::Language => "language",
            ProviderKind::Proxy => "proxy",
        };
        f.write_str(name)
    }
}

/// Validity state of a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    /// Usable, last check succeeded
    Active,
    /// Valid but exhausted
    OutOfCredit,
    /// Rejected by the provider
    Dead,
}

/// A provisioned third-party API credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique record identifier
    pub id: Uuid,
    /// Which provider this key belongs to
    pub provider: ProviderKind,
    /// The raw API key
    pub api_key: String,
    /// Optional operator-facing name
    pub label: Option<String>,
    /// Validity state
    pub status: CredentialStatus,
    /// Remaining credit as reported by the provider, if known
    pub credit_balance: Option<i64>,
    /// User this key is assigned to, if any
    pub assigned_user_id: Option<Uuid>,
    /// Last check failure, if any
    pub last_error: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Display label: the operator-facing name or the masked key
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| crate::core::operations::mask_key(&self.api_key))
    }

    /// Whether this key can currently be handed to a user
    pub fn is_assignable(&self) -> bool {
        self.assigned_user_id.is_none()
            && self.status == CredentialStatus::Active
            && self
                .credit_balance
                .is_none_or(|balance| balance > ASSIGNMENT_MIN_CREDIT)
    }
}

/// Fields needed to create a credential
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub provider: ProviderKind,
    pub api_key: String,
    pub label: Option<String>,
    pub assigned_user_id: Option<Uuid>,
}

/// A user keys can be assigned to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique user identifier
    pub id: Uuid,
    /// Login name
    pub username: String,
    /// Running count of keys ever assigned to this user
    pub total_keys_received: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Filter for credential listings
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialFilter {
    /// Restrict to one provider
    pub provider: Option<ProviderKind>,
    /// Include keys already marked dead
    pub include_dead: bool,
    /// Only keys not assigned to any user
    pub only_unassigned: bool,
}
