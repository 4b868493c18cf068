//! # Domain Records
//!
//! This module defines the records held in the in-memory stores.
//!
//! ## Record Overview
//!
//! | Record | Description |
//! |--------|-------------|
//! | `Vault` | A multi-party vault with key holders and a threshold |
//! | `UnlockProposal` | A proposed payout, with approvals and swap tracking |
//! | `ShiftRecord` | One outbound swap order per proposal recipient |
//!
//! ## Lifecycle
//!
//! ```text
//! Vault:    created ──► funding ──► ready ──► unlocking ──► destroyed
//!                          │          ▲            │
//!                          └──────────┘            └── (proposal settled,
//!                     (threshold approvals)             expired, or manual)
//!
//! Proposal: pending ──► executing ──► settled
//!              │            └──────► failed
//!              └──► cancelled
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vault lifecycle states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VaultStatus {
    /// Vault exists but has received no deposits yet
    Created,
    /// At least one deposit has been recorded
    Funding,
    /// Enough key holders have approved; the vault can be unlocked
    Ready,
    /// A live unlock proposal is attached
    Unlocking,
    /// The vault has been torn down
    Destroyed,
}

impl VaultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VaultStatus::Created => "created",
            VaultStatus::Funding => "funding",
            VaultStatus::Ready => "ready",
            VaultStatus::Unlocking => "unlocking",
            VaultStatus::Destroyed => "destroyed",
        }
    }
}

/// A key holder on a vault.
///
/// Plain records only: no key material is involved, the approved flag is
/// the whole simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyHolder {
    /// Holder id, referenced by approval requests.
    pub id: Uuid,

    /// Display label (e.g. "alice").
    pub label: String,

    /// Whether this holder has approved activating the vault.
    pub approved: bool,

    /// When the approval was recorded.
    pub approved_at: Option<DateTime<Utc>>,
}

/// A multi-party vault record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    /// Unique vault id.
    pub id: Uuid,

    /// Human-readable vault name.
    pub name: String,

    /// Current lifecycle state.
    pub status: VaultStatus,

    /// The parties that jointly control this vault.
    pub key_holders: Vec<KeyHolder>,

    /// How many holder approvals are required, both to activate the vault
    /// and to execute an unlock proposal. Always `1..=key_holders.len()`.
    pub threshold: usize,

    /// Sum of recorded deposits, in units of `source_asset`.
    pub total_deposits: f64,

    /// Asset deposited into the vault (e.g. "BTC").
    pub source_asset: String,

    /// Default asset recipients are paid out in (e.g. "ETH").
    pub target_asset: String,

    /// Mock deposit address shown to depositors.
    pub deposit_address: String,

    /// When the vault was created.
    pub created_at: DateTime<Utc>,

    /// When the vault self-destructs if still around.
    pub expires_at: DateTime<Utc>,

    /// The live unlock proposal, if one is attached.
    pub proposal_id: Option<Uuid>,
}

impl Vault {
    /// Number of key holders that have approved.
    pub fn approved_count(&self) -> usize {
        self.key_holders.iter().filter(|h| h.approved).count()
    }

    /// Look up a key holder by id.
    pub fn holder(&self, holder_id: Uuid) -> Option<&KeyHolder> {
        self.key_holders.iter().find(|h| h.id == holder_id)
    }

    /// Whether the vault lifetime has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Proposal lifecycle states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Collecting holder approvals
    Pending,
    /// Threshold met; shifts have been placed and are in flight
    Executing,
    /// Every shift settled; the vault has been destroyed
    Settled,
    /// At least one shift failed and none remain in flight
    Failed,
    /// Withdrawn or expired before execution
    Cancelled,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Executing => "executing",
            ProposalStatus::Settled => "settled",
            ProposalStatus::Failed => "failed",
            ProposalStatus::Cancelled => "cancelled",
        }
    }
}

/// A payout target on an unlock proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// Destination address for the swapped funds.
    pub address: String,

    /// Amount to pay out, in units of the vault's source asset.
    pub amount: f64,

    /// Asset this recipient is paid in.
    pub target_asset: String,
}

/// A holder's approval of an unlock proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    /// The approving key holder.
    pub holder_id: Uuid,

    /// When the approval was recorded.
    pub approved_at: DateTime<Utc>,
}

/// Per-shift states, normalized from provider status strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    /// Order placed, waiting for a deposit on the provider side
    Waiting,
    /// Provider is converting funds
    Processing,
    /// Funds delivered to the recipient
    Settled,
    /// Order failed, refunded, or expired
    Failed,
}

impl ShiftStatus {
    /// Map a raw provider status string onto our states.
    ///
    /// Unknown strings map to `Processing`: the order exists and is not
    /// terminal, which is all the aggregation logic needs.
    pub fn from_provider(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "waiting" => ShiftStatus::Waiting,
            "settled" => ShiftStatus::Settled,
            "failed" | "refund" | "refunded" | "expired" => ShiftStatus::Failed,
            _ => ShiftStatus::Processing,
        }
    }

    /// Whether this state is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShiftStatus::Settled | ShiftStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Waiting => "waiting",
            ShiftStatus::Processing => "processing",
            ShiftStatus::Settled => "settled",
            ShiftStatus::Failed => "failed",
        }
    }
}

/// Tracking record for one outbound swap order.
///
/// One record exists per proposal recipient once the proposal executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecord {
    /// Provider order id (webhooks key on this).
    pub shift_id: String,

    /// Recipient address this shift pays.
    pub recipient_address: String,

    /// Amount converted, in the vault's source asset.
    pub amount: f64,

    /// Asset delivered to the recipient.
    pub target_asset: String,

    /// Conversion rate quoted when the order was placed.
    pub rate: f64,

    /// Current shift state.
    pub status: ShiftStatus,

    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

/// An unlock proposal for a vault.
///
/// Created against a `ready` vault; once approvals reach the vault
/// threshold the backend places one shift per recipient and tracks them in
/// `shifts` until all settle (or fail).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockProposal {
    /// Unique proposal id.
    pub id: Uuid,

    /// The vault being unlocked.
    pub vault_id: Uuid,

    /// Payout targets.
    pub recipients: Vec<Recipient>,

    /// Holder approvals collected so far (unique per holder).
    pub approvals: Vec<Approval>,

    /// Set exactly once, when the threshold is met and shifts are placed.
    pub executed: bool,

    /// Current lifecycle state.
    pub status: ProposalStatus,

    /// Per-recipient swap tracking; empty until execution.
    pub shifts: Vec<ShiftRecord>,

    /// When the proposal was created.
    pub created_at: DateTime<Utc>,

    /// When a still-pending proposal is swept.
    pub expires_at: DateTime<Utc>,
}

impl UnlockProposal {
    /// Whether the given holder has already approved.
    pub fn has_approved(&self, holder_id: Uuid) -> bool {
        self.approvals.iter().any(|a| a.holder_id == holder_id)
    }

    /// Whether the proposal lifetime has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
