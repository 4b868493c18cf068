//! # Proposal Service
//!
//! The ProposalService drives the unlock side of the system: it creates
//! unlock proposals against ready vaults, tracks per-holder approvals, and
//! on threshold-met execution fans out one outbound shift per recipient
//! through the swap provider. Webhook callbacks land here and update the
//! per-recipient shift records until the proposal settles or fails.
//!
//! ## Flow Example: Unlock
//!
//! ```text
//! 1. POST /vaults/{id}/proposals          (vault: ready -> unlocking)
//!               ↓
//! 2. Holders approve one by one           (proposal: pending)
//!               ↓
//! 3. approvals >= threshold  =>  execute: one shift per recipient
//!               ↓
//! 4. Webhook callbacks update shift status
//!               ↓
//! 5. All settled  =>  proposal settled, vault destroyed
//! ```

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::CreateProposalRequest;
use crate::store::{
    Approval, MemoryStore, ProposalStatus, Recipient, ShiftRecord, ShiftStatus, UnlockProposal,
    VaultStatus,
};
use crate::utils;

use super::sideshift::ShiftClient;

/// Errors that can occur in proposal operations.
#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    /// Proposal not found for the given id.
    #[error("Proposal not found: {0}")]
    NotFound(Uuid),

    /// The vault backing the proposal is missing.
    #[error("Vault not found: {0}")]
    VaultNotFound(Uuid),

    /// No shift with the given provider order id exists.
    #[error("No shift found for order id: {0}")]
    ShiftNotFound(String),

    /// Operation not allowed in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Holder id does not belong to the vault.
    #[error("Unknown key holder: {0}")]
    UnknownHolder(Uuid),
}

/// The service orchestrating unlock proposals.
///
/// ## Usage
///
/// ```rust,ignore
/// let proposals = ProposalService::new(store, shift_client, config);
/// let proposal = proposals.create_proposal(vault_id, request)?;
/// proposals.approve(proposal.id, holder_id).await?;
/// ```
#[derive(Clone)]
pub struct ProposalService {
    /// Shared in-memory state.
    store: MemoryStore,

    /// Swap provider client used for the execution fan-out.
    shifts: ShiftClient,

    /// Application configuration.
    config: AppConfig,
}

impl ProposalService {
    /// Create a new ProposalService instance.
    pub fn new(store: MemoryStore, shifts: ShiftClient, config: AppConfig) -> Self {
        Self {
            store,
            shifts,
            config,
        }
    }

    // ==========================================
    // QUERIES
    // ==========================================

    /// Fetch a proposal by id.
    pub fn get(&self, id: Uuid) -> Result<UnlockProposal, ProposalError> {
        self.store.proposal(id).ok_or(ProposalError::NotFound(id))
    }

    // ==========================================
    // LIFECYCLE
    // ==========================================

    /// Create an unlock proposal against a ready vault.
    ///
    /// The vault moves to `unlocking` with the proposal id embedded; from
    /// that point it accepts no further deposits.
    ///
    /// ## Returns
    ///
    /// * `Ok(UnlockProposal)` - The stored proposal (status `pending`)
    /// * `Err(ProposalError::InvalidState)` - Vault not ready, or already
    ///   carrying a live proposal
    /// * `Err(ProposalError::InvalidInput)` - Bad recipient list
    pub fn create_proposal(
        &self,
        vault_id: Uuid,
        request: CreateProposalRequest,
    ) -> Result<UnlockProposal, ProposalError> {
        let vault = self
            .store
            .vault(vault_id)
            .ok_or(ProposalError::VaultNotFound(vault_id))?;

        if vault.status != VaultStatus::Ready {
            return Err(ProposalError::InvalidState(format!(
                "Vault is {} and cannot be unlocked",
                vault.status.as_str()
            )));
        }
        if vault.proposal_id.is_some() {
            return Err(ProposalError::InvalidState(
                "Vault already has a live proposal".to_string(),
            ));
        }
        if request.recipients.is_empty() {
            return Err(ProposalError::InvalidInput(
                "At least one recipient is required".to_string(),
            ));
        }

        let mut recipients = Vec::with_capacity(request.recipients.len());
        let mut payout_total = 0.0;
        for r in &request.recipients {
            if r.address.trim().is_empty() {
                return Err(ProposalError::InvalidInput(
                    "Recipient address is required".to_string(),
                ));
            }
            if !(r.amount > 0.0) {
                return Err(ProposalError::InvalidInput(
                    "Recipient amount must be greater than 0".to_string(),
                ));
            }
            payout_total += r.amount;
            recipients.push(Recipient {
                address: r.address.trim().to_string(),
                amount: r.amount,
                target_asset: r
                    .target_asset
                    .as_deref()
                    .unwrap_or(&vault.target_asset)
                    .trim()
                    .to_uppercase(),
            });
        }

        if payout_total > vault.total_deposits {
            return Err(ProposalError::InvalidInput(format!(
                "Payout total {} exceeds vault deposits {}",
                utils::format_amount(payout_total, &vault.source_asset),
                utils::format_amount(vault.total_deposits, &vault.source_asset)
            )));
        }

        let ttl_hours = request.ttl_hours.unwrap_or(self.config.proposal_ttl_hours);
        let now = Utc::now();
        let proposal = UnlockProposal {
            id: Uuid::new_v4(),
            vault_id,
            recipients,
            approvals: Vec::new(),
            executed: false,
            status: ProposalStatus::Pending,
            shifts: Vec::new(),
            created_at: now,
            expires_at: now + Duration::hours(ttl_hours),
        };

        self.store.insert_proposal(proposal.clone());
        self.store.with_vault_mut(vault_id, |v| {
            v.status = VaultStatus::Unlocking;
            v.proposal_id = Some(proposal.id);
        });

        info!(
            "Created unlock proposal {} for vault {} ({} recipients, {})",
            proposal.id,
            vault_id,
            proposal.recipients.len(),
            utils::format_amount(payout_total, &vault.source_asset)
        );

        Ok(proposal)
    }

    /// Record a holder's approval of a proposal.
    ///
    /// Duplicate approvals are ignored. When approvals reach the vault
    /// threshold the proposal executes immediately (shift fan-out).
    pub async fn approve(
        &self,
        proposal_id: Uuid,
        holder_id: Uuid,
    ) -> Result<UnlockProposal, ProposalError> {
        let proposal = self.get(proposal_id)?;
        if proposal.status != ProposalStatus::Pending || proposal.executed {
            return Err(ProposalError::InvalidState(format!(
                "Proposal is {} and no longer accepts approvals",
                proposal.status.as_str()
            )));
        }

        let vault = self
            .store
            .vault(proposal.vault_id)
            .ok_or(ProposalError::VaultNotFound(proposal.vault_id))?;
        let holder = vault
            .holder(holder_id)
            .ok_or(ProposalError::UnknownHolder(holder_id))?;

        if proposal.has_approved(holder_id) {
            // Idempotent: re-approving changes nothing
            return Ok(proposal);
        }

        let approvals = self
            .store
            .with_proposal_mut(proposal_id, |p| {
                p.approvals.push(Approval {
                    holder_id,
                    approved_at: Utc::now(),
                });
                p.approvals.len()
            })
            .ok_or(ProposalError::NotFound(proposal_id))?;

        info!(
            "Holder '{}' approved proposal {} ({}/{})",
            holder.label, proposal_id, approvals, vault.threshold
        );

        if approvals >= vault.threshold {
            self.execute(proposal_id).await?;
        }

        self.get(proposal_id)
    }

    /// Execute a proposal: place one shift per recipient.
    ///
    /// A provider error for one recipient records a failed shift for that
    /// recipient and continues with the rest; execution itself does not
    /// abort. Sets `executed` exactly once.
    pub async fn execute(&self, proposal_id: Uuid) -> Result<UnlockProposal, ProposalError> {
        let proposal = self.get(proposal_id)?;
        if proposal.executed {
            return Err(ProposalError::InvalidState(
                "Proposal has already been executed".to_string(),
            ));
        }

        let vault = self
            .store
            .vault(proposal.vault_id)
            .ok_or(ProposalError::VaultNotFound(proposal.vault_id))?;

        info!(
            "Executing proposal {}: shifting {} out of vault '{}'",
            proposal_id, vault.source_asset, vault.name
        );

        let mut shifts = Vec::with_capacity(proposal.recipients.len());
        for recipient in &proposal.recipients {
            let record = match self
                .shifts
                .create_shift(
                    &vault.source_asset,
                    &recipient.target_asset,
                    &recipient.address,
                    recipient.amount,
                )
                .await
            {
                Ok(order) => {
                    info!(
                        "Placed shift {} for {} ({} -> {})",
                        order.id, recipient.address, vault.source_asset, recipient.target_asset
                    );
                    ShiftRecord {
                        shift_id: order.id,
                        recipient_address: recipient.address.clone(),
                        amount: recipient.amount,
                        target_asset: recipient.target_asset.clone(),
                        rate: order.rate,
                        status: order.status,
                        updated_at: Utc::now(),
                    }
                }
                Err(e) => {
                    warn!(
                        "Shift for recipient {} failed at placement: {}",
                        recipient.address, e
                    );
                    ShiftRecord {
                        shift_id: format!("void-{}", Uuid::new_v4().simple()),
                        recipient_address: recipient.address.clone(),
                        amount: recipient.amount,
                        target_asset: recipient.target_asset.clone(),
                        rate: 0.0,
                        status: ShiftStatus::Failed,
                        updated_at: Utc::now(),
                    }
                }
            };
            shifts.push(record);
        }

        let all_failed = shifts.iter().all(|s| s.status == ShiftStatus::Failed);
        let status = if all_failed {
            error!("Every shift for proposal {} failed at placement", proposal_id);
            ProposalStatus::Failed
        } else {
            ProposalStatus::Executing
        };

        self.store
            .with_proposal_mut(proposal_id, |p| {
                p.executed = true;
                p.status = status;
                p.shifts = shifts;
            })
            .ok_or(ProposalError::NotFound(proposal_id))?;

        self.get(proposal_id)
    }

    /// Apply a swap status callback to the owning proposal.
    ///
    /// Once every shift is terminal the proposal is aggregated: all settled
    /// means the proposal settles and the vault is destroyed; any failure
    /// marks the proposal failed and leaves the vault in `unlocking` for
    /// operator attention.
    pub fn update_shift_status(
        &self,
        shift_id: &str,
        raw_status: &str,
    ) -> Result<UnlockProposal, ProposalError> {
        let proposal_id = self
            .store
            .find_proposal_by_shift(shift_id)
            .ok_or_else(|| ProposalError::ShiftNotFound(shift_id.to_string()))?;

        let status = ShiftStatus::from_provider(raw_status);

        let aggregate = self
            .store
            .with_proposal_mut(proposal_id, |p| {
                if let Some(shift) = p.shifts.iter_mut().find(|s| s.shift_id == shift_id) {
                    shift.status = status;
                    shift.updated_at = Utc::now();
                }

                let all_terminal = p.shifts.iter().all(|s| s.status.is_terminal());
                let any_failed = p.shifts.iter().any(|s| s.status == ShiftStatus::Failed);

                if all_terminal && p.status == ProposalStatus::Executing {
                    p.status = if any_failed {
                        ProposalStatus::Failed
                    } else {
                        ProposalStatus::Settled
                    };
                }
                p.status
            })
            .ok_or(ProposalError::NotFound(proposal_id))?;

        info!(
            "Shift {} -> {} (proposal {} now {})",
            shift_id,
            status.as_str(),
            proposal_id,
            aggregate.as_str()
        );

        match aggregate {
            ProposalStatus::Settled => {
                // Cascading self-destruct: the vault's job is done
                let proposal = self.get(proposal_id)?;
                if let Some(vault) = self.store.remove_vault(proposal.vault_id) {
                    info!(
                        "Vault '{}' ({}) destroyed after settled unlock",
                        vault.name, vault.id
                    );
                }
            }
            ProposalStatus::Failed => {
                warn!(
                    "Proposal {} finished with failed shifts; vault left in place",
                    proposal_id
                );
            }
            _ => {}
        }

        self.get(proposal_id)
    }

    /// Cancel a pending, unexecuted proposal.
    ///
    /// The vault returns to `ready` and the proposal record is dropped.
    /// Returns the final state of the cancelled proposal.
    pub fn cancel(&self, proposal_id: Uuid) -> Result<UnlockProposal, ProposalError> {
        let proposal = self.get(proposal_id)?;
        if proposal.status != ProposalStatus::Pending || proposal.executed {
            return Err(ProposalError::InvalidState(format!(
                "Proposal is {} and cannot be cancelled",
                proposal.status.as_str()
            )));
        }

        let mut proposal = self
            .store
            .remove_proposal(proposal_id)
            .ok_or(ProposalError::NotFound(proposal_id))?;
        proposal.status = ProposalStatus::Cancelled;

        self.store.with_vault_mut(proposal.vault_id, |v| {
            if v.status == VaultStatus::Unlocking {
                v.status = VaultStatus::Ready;
            }
            v.proposal_id = None;
        });

        info!(
            "Cancelled proposal {}; vault {} back to ready",
            proposal_id, proposal.vault_id
        );
        Ok(proposal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateVaultRequest, RecipientRequest};
    use crate::services::VaultService;
    use crate::store::Vault;

    struct Fixture {
        store: MemoryStore,
        vaults: VaultService,
        proposals: ProposalService,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let config = AppConfig::for_tests();
        let shifts = ShiftClient::new(&config);
        Fixture {
            vaults: VaultService::new(store.clone(), config.clone()),
            proposals: ProposalService::new(store.clone(), shifts, config),
            store,
        }
    }

    /// Create a 2-of-3 vault, fund it, and approve it to ready.
    fn ready_vault(fx: &Fixture) -> Vault {
        let vault = fx
            .vaults
            .create_vault(CreateVaultRequest {
                name: "heist payout".to_string(),
                key_holders: vec!["alice".into(), "bob".into(), "carol".into()],
                threshold: 2,
                source_asset: "BTC".to_string(),
                target_asset: "ETH".to_string(),
                ttl_hours: None,
            })
            .unwrap();
        fx.vaults.record_deposit(vault.id, 2.0).unwrap();
        let holders: Vec<Uuid> = vault.key_holders.iter().map(|h| h.id).collect();
        fx.vaults.approve_holder(vault.id, holders[0]).unwrap();
        fx.vaults.approve_holder(vault.id, holders[1]).unwrap()
    }

    fn recipients() -> Vec<RecipientRequest> {
        vec![
            RecipientRequest {
                address: "0xaaa".to_string(),
                amount: 1.0,
                target_asset: None,
            },
            RecipientRequest {
                address: "0xbbb".to_string(),
                amount: 0.5,
                target_asset: Some("USDT".to_string()),
            },
        ]
    }

    fn proposal_request() -> CreateProposalRequest {
        CreateProposalRequest {
            recipients: recipients(),
            ttl_hours: None,
        }
    }

    #[test]
    fn test_create_proposal_requires_ready_vault() {
        let fx = fixture();
        let vault = fx
            .vaults
            .create_vault(CreateVaultRequest {
                name: "not ready".to_string(),
                key_holders: vec!["alice".into()],
                threshold: 1,
                source_asset: "BTC".to_string(),
                target_asset: "ETH".to_string(),
                ttl_hours: None,
            })
            .unwrap();

        assert!(matches!(
            fx.proposals.create_proposal(vault.id, proposal_request()),
            Err(ProposalError::InvalidState(_))
        ));
    }

    #[test]
    fn test_create_proposal_moves_vault_to_unlocking() {
        let fx = fixture();
        let vault = ready_vault(&fx);

        let proposal = fx
            .proposals
            .create_proposal(vault.id, proposal_request())
            .unwrap();
        assert_eq!(proposal.status, ProposalStatus::Pending);
        // Recipient without an explicit asset inherits the vault target
        assert_eq!(proposal.recipients[0].target_asset, "ETH");
        assert_eq!(proposal.recipients[1].target_asset, "USDT");

        let vault = fx.vaults.get(vault.id).unwrap();
        assert_eq!(vault.status, VaultStatus::Unlocking);
        assert_eq!(vault.proposal_id, Some(proposal.id));

        // Only one live proposal per vault
        assert!(matches!(
            fx.proposals.create_proposal(vault.id, proposal_request()),
            Err(ProposalError::InvalidState(_))
        ));
    }

    #[test]
    fn test_create_proposal_rejects_overdraw() {
        let fx = fixture();
        let vault = ready_vault(&fx);

        let request = CreateProposalRequest {
            recipients: vec![RecipientRequest {
                address: "0xaaa".to_string(),
                amount: 5.0, // vault only holds 2.0
                target_asset: None,
            }],
            ttl_hours: None,
        };
        assert!(matches!(
            fx.proposals.create_proposal(vault.id, request),
            Err(ProposalError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_threshold_approval_triggers_execution() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        let holders: Vec<Uuid> = vault.key_holders.iter().map(|h| h.id).collect();
        let proposal = fx
            .proposals
            .create_proposal(vault.id, proposal_request())
            .unwrap();

        let p = fx.proposals.approve(proposal.id, holders[0]).await.unwrap();
        assert_eq!(p.status, ProposalStatus::Pending);
        assert!(!p.executed);
        assert!(p.shifts.is_empty());

        // Duplicate approval doesn't advance anything
        let p = fx.proposals.approve(proposal.id, holders[0]).await.unwrap();
        assert_eq!(p.approvals.len(), 1);

        let p = fx.proposals.approve(proposal.id, holders[1]).await.unwrap();
        assert!(p.executed);
        assert_eq!(p.status, ProposalStatus::Executing);
        assert_eq!(p.shifts.len(), 2);
        assert!(p.shifts.iter().all(|s| s.status == ShiftStatus::Waiting));
        assert!(p.shifts.iter().all(|s| s.rate > 0.0));

        // Vault stays unlocking while shifts are in flight
        assert_eq!(fx.vaults.get(vault.id).unwrap().status, VaultStatus::Unlocking);
    }

    #[tokio::test]
    async fn test_approve_unknown_holder() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        let proposal = fx
            .proposals
            .create_proposal(vault.id, proposal_request())
            .unwrap();

        assert!(matches!(
            fx.proposals.approve(proposal.id, Uuid::new_v4()).await,
            Err(ProposalError::UnknownHolder(_))
        ));
    }

    #[tokio::test]
    async fn test_settled_shifts_destroy_vault() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        let holders: Vec<Uuid> = vault.key_holders.iter().map(|h| h.id).collect();
        let proposal = fx
            .proposals
            .create_proposal(vault.id, proposal_request())
            .unwrap();
        fx.proposals.approve(proposal.id, holders[0]).await.unwrap();
        let p = fx.proposals.approve(proposal.id, holders[1]).await.unwrap();

        let first = p.shifts[0].shift_id.clone();
        let second = p.shifts[1].shift_id.clone();

        let p = fx.proposals.update_shift_status(&first, "settled").unwrap();
        assert_eq!(p.status, ProposalStatus::Executing);
        assert!(fx.store.vault(vault.id).is_some());

        let p = fx.proposals.update_shift_status(&second, "settled").unwrap();
        assert_eq!(p.status, ProposalStatus::Settled);
        // Cascading destruction
        assert!(fx.store.vault(vault.id).is_none());
        // Settled proposal remains inspectable
        assert!(fx.store.proposal(proposal.id).is_some());
    }

    #[tokio::test]
    async fn test_failed_shift_marks_proposal_failed() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        let holders: Vec<Uuid> = vault.key_holders.iter().map(|h| h.id).collect();
        let proposal = fx
            .proposals
            .create_proposal(vault.id, proposal_request())
            .unwrap();
        fx.proposals.approve(proposal.id, holders[0]).await.unwrap();
        let p = fx.proposals.approve(proposal.id, holders[1]).await.unwrap();

        let first = p.shifts[0].shift_id.clone();
        let second = p.shifts[1].shift_id.clone();

        let p = fx.proposals.update_shift_status(&first, "refunded").unwrap();
        // One failed, one still in flight: not aggregated yet
        assert_eq!(p.status, ProposalStatus::Executing);

        let p = fx.proposals.update_shift_status(&second, "settled").unwrap();
        assert_eq!(p.status, ProposalStatus::Failed);
        // Vault survives for operator attention
        assert_eq!(fx.vaults.get(vault.id).unwrap().status, VaultStatus::Unlocking);
    }

    #[test]
    fn test_update_unknown_shift() {
        let fx = fixture();
        assert!(matches!(
            fx.proposals.update_shift_status("cv-nope", "settled"),
            Err(ProposalError::ShiftNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_pending_proposal() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        let proposal = fx
            .proposals
            .create_proposal(vault.id, proposal_request())
            .unwrap();

        let cancelled = fx.proposals.cancel(proposal.id).unwrap();
        assert_eq!(cancelled.status, ProposalStatus::Cancelled);
        assert!(fx.store.proposal(proposal.id).is_none());

        let vault = fx.vaults.get(vault.id).unwrap();
        assert_eq!(vault.status, VaultStatus::Ready);
        assert!(vault.proposal_id.is_none());

        // A new proposal can now be created
        assert!(fx.proposals.create_proposal(vault.id, proposal_request()).is_ok());
    }

    #[tokio::test]
    async fn test_cancel_executed_proposal_rejected() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        let holders: Vec<Uuid> = vault.key_holders.iter().map(|h| h.id).collect();
        let proposal = fx
            .proposals
            .create_proposal(vault.id, proposal_request())
            .unwrap();
        fx.proposals.approve(proposal.id, holders[0]).await.unwrap();
        fx.proposals.approve(proposal.id, holders[1]).await.unwrap();

        assert!(matches!(
            fx.proposals.cancel(proposal.id),
            Err(ProposalError::InvalidState(_))
        ));
    }
}
