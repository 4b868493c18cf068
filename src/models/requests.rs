//! # API Request Models
//!
//! Structures for incoming API request bodies.
//! Each struct represents the expected JSON body for an endpoint.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a new vault.
///
/// ## Example JSON
///
/// ```json
/// {
///     "name": "family savings",
///     "keyHolders": ["alice", "bob", "carol"],
///     "threshold": 2,
///     "sourceAsset": "BTC",
///     "targetAsset": "ETH",
///     "ttlHours": 48
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVaultRequest {
    /// Human-readable vault name.
    pub name: String,

    /// Labels for the key holders; holder ids are generated server-side.
    pub key_holders: Vec<String>,

    /// Approvals required to activate the vault and execute proposals.
    /// Must be between 1 and the number of key holders.
    pub threshold: usize,

    /// Asset deposited into the vault (e.g. "BTC").
    pub source_asset: String,

    /// Default payout asset (e.g. "ETH").
    pub target_asset: String,

    /// Optional vault lifetime in hours; server default when omitted.
    pub ttl_hours: Option<i64>,
}

/// Request to record a deposit against a vault.
///
/// ## Example JSON
///
/// ```json
/// {
///     "amount": 0.5
/// }
/// ```
///
/// Amounts are decimal units of the vault's source asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    /// Amount deposited, in units of the vault's source asset.
    pub amount: f64,
}

/// Request to record a key holder's approval (vault or proposal).
///
/// ## Example JSON
///
/// ```json
/// {
///     "holderId": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    /// The approving key holder's id.
    pub holder_id: Uuid,
}

/// One payout target on a proposal request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientRequest {
    /// Destination address for the swapped funds.
    pub address: String,

    /// Amount to pay out, in units of the vault's source asset.
    pub amount: f64,

    /// Asset to pay this recipient in; vault default when omitted.
    pub target_asset: Option<String>,
}

/// Request to create an unlock proposal.
///
/// ## Example JSON
///
/// ```json
/// {
///     "recipients": [
///         { "address": "0xaaa...", "amount": 1.0 },
///         { "address": "0xbbb...", "amount": 0.5, "targetAsset": "USDT" }
///     ],
///     "ttlHours": 12
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalRequest {
    /// Payout targets; one shift is placed per recipient on execution.
    pub recipients: Vec<RecipientRequest>,

    /// Optional proposal lifetime in hours; server default when omitted.
    pub ttl_hours: Option<i64>,
}

/// Swap status callback body.
///
/// ## Example JSON
///
/// ```json
/// {
///     "shiftId": "cv-9f3a1b2c4d5e",
///     "status": "settled"
/// }
/// ```
///
/// ## Notes
///
/// Callbacks are trusted as received; there is no signature verification
/// in this demo system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftWebhookRequest {
    /// Provider order id.
    pub shift_id: String,

    /// Raw provider status string (e.g. "processing", "settled").
    pub status: String,
}
