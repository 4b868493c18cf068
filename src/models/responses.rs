//! # API Response Models
//!
//! Structures for outgoing API response bodies.
//! All responses are wrapped in a standard format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Approval, KeyHolder, Recipient, ShiftRecord, UnlockProposal, Vault};

/// Standard API response wrapper.
///
/// All API responses follow this format:
///
/// ## Success Response
///
/// ```json
/// {
///     "success": true,
///     "data": { ... },
///     "error": null
/// }
/// ```
///
/// ## Error Response
///
/// ```json
/// {
///     "success": false,
///     "data": null,
///     "error": {
///         "code": "VAULT_NOT_FOUND",
///         "message": "Vault not found: 550e8400-..."
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,

    /// Response data (null on error).
    pub data: Option<T>,

    /// Error information (null on success).
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// API error information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Error code (e.g., "VAULT_NOT_FOUND").
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

/// Vault representation returned by the API.
///
/// ## Example Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "id": "550e8400-...",
///         "name": "family savings",
///         "status": "funding",
///         "depositAddress": "bc1q...",
///         "sourceAsset": "BTC",
///         "targetAsset": "ETH",
///         "totalDeposits": 0.75,
///         "threshold": 2,
///         "approvedHolders": 1,
///         "keyHolders": [ ... ],
///         "proposalId": null
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultResponse {
    /// Vault id.
    pub id: Uuid,

    /// Vault name.
    pub name: String,

    /// Lifecycle state as a lowercase string.
    pub status: String,

    /// Mock deposit address for the source asset.
    pub deposit_address: String,

    /// Asset deposited into the vault.
    pub source_asset: String,

    /// Default payout asset.
    pub target_asset: String,

    /// Sum of recorded deposits.
    pub total_deposits: f64,

    /// Approvals required to activate/unlock.
    pub threshold: usize,

    /// Holders that have approved so far.
    pub approved_holders: usize,

    /// The key holders and their approval state.
    pub key_holders: Vec<KeyHolder>,

    /// Live unlock proposal, if any.
    pub proposal_id: Option<Uuid>,

    /// When the vault was created.
    pub created_at: DateTime<Utc>,

    /// When the vault self-destructs.
    pub expires_at: DateTime<Utc>,
}

impl From<Vault> for VaultResponse {
    fn from(vault: Vault) -> Self {
        let approved_holders = vault.approved_count();
        Self {
            id: vault.id,
            name: vault.name,
            status: vault.status.as_str().to_string(),
            deposit_address: vault.deposit_address,
            source_asset: vault.source_asset,
            target_asset: vault.target_asset,
            total_deposits: vault.total_deposits,
            threshold: vault.threshold,
            approved_holders,
            key_holders: vault.key_holders,
            proposal_id: vault.proposal_id,
            created_at: vault.created_at,
            expires_at: vault.expires_at,
        }
    }
}

/// Unlock proposal representation returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalResponse {
    /// Proposal id.
    pub id: Uuid,

    /// The vault being unlocked.
    pub vault_id: Uuid,

    /// Lifecycle state as a lowercase string.
    pub status: String,

    /// Whether the shift fan-out has happened.
    pub executed: bool,

    /// Payout targets.
    pub recipients: Vec<Recipient>,

    /// Holder approvals collected so far.
    pub approvals: Vec<Approval>,

    /// Per-recipient swap tracking (empty until execution).
    pub shifts: Vec<ShiftRecord>,

    /// When the proposal was created.
    pub created_at: DateTime<Utc>,

    /// When a still-pending proposal is swept.
    pub expires_at: DateTime<Utc>,
}

impl From<UnlockProposal> for ProposalResponse {
    fn from(proposal: UnlockProposal) -> Self {
        Self {
            id: proposal.id,
            vault_id: proposal.vault_id,
            status: proposal.status.as_str().to_string(),
            executed: proposal.executed,
            recipients: proposal.recipients,
            approvals: proposal.approvals,
            shifts: proposal.shifts,
            created_at: proposal.created_at,
            expires_at: proposal.expires_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status; always "healthy" while the process is up.
    pub status: String,

    /// Number of vaults currently in memory.
    pub vaults: usize,

    /// Number of proposals currently in memory.
    pub proposals: usize,

    /// "mock" or "live" depending on swap provider configuration.
    pub swap_provider: String,

    /// Service version.
    pub version: String,

    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
}
