//! # Vault Service
//!
//! The VaultService owns the vault side of the system: creation with mock
//! deposit address generation, deposit bookkeeping, threshold-approval
//! bookkeeping, and teardown.
//!
//! ## Flow Example: Activation
//!
//! ```text
//! 1. POST /vaults creates the record (status: created)
//!               ↓
//! 2. Deposits recorded against the mock address (status: funding)
//!               ↓
//! 3. Key holders approve one by one
//!               ↓
//! 4. approved_count >= threshold  =>  status: ready
//! ```

use chrono::{Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::CreateVaultRequest;
use crate::store::{KeyHolder, MemoryStore, Vault, VaultStatus};
use crate::utils;

/// Errors that can occur in vault operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Vault not found for the given id.
    #[error("Vault not found: {0}")]
    NotFound(Uuid),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not allowed in the vault's current state.
    #[error("Vault is {status} and cannot {action}")]
    InvalidState {
        status: &'static str,
        action: &'static str,
    },

    /// Holder id does not belong to this vault.
    #[error("Unknown key holder: {0}")]
    UnknownHolder(Uuid),
}

/// The main service for managing vault records.
///
/// ## Usage
///
/// ```rust,ignore
/// let vaults = VaultService::new(store, config);
/// let vault = vaults.create_vault(request)?;
/// vaults.record_deposit(vault.id, 0.5)?;
/// ```
#[derive(Clone)]
pub struct VaultService {
    /// Shared in-memory state.
    store: MemoryStore,

    /// Application configuration.
    config: AppConfig,
}

impl VaultService {
    /// Create a new VaultService instance.
    pub fn new(store: MemoryStore, config: AppConfig) -> Self {
        Self { store, config }
    }

    // ==========================================
    // QUERIES
    // ==========================================

    /// Fetch a vault by id.
    pub fn get(&self, id: Uuid) -> Result<Vault, VaultError> {
        self.store.vault(id).ok_or(VaultError::NotFound(id))
    }

    /// Snapshot of all vaults, newest first.
    pub fn list(&self) -> Vec<Vault> {
        let mut vaults = self.store.vaults();
        vaults.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        vaults
    }

    // ==========================================
    // OPERATIONS
    // ==========================================

    /// Create a new vault.
    ///
    /// Validates the holder/threshold configuration, generates a mock
    /// deposit address for the source asset, and stores the record with
    /// status `created`.
    ///
    /// ## Returns
    ///
    /// * `Ok(Vault)` - The stored vault
    /// * `Err(VaultError::InvalidInput)` - Bad name, holders, or threshold
    pub fn create_vault(&self, request: CreateVaultRequest) -> Result<Vault, VaultError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(VaultError::InvalidInput("Vault name is required".to_string()));
        }
        if request.key_holders.is_empty() {
            return Err(VaultError::InvalidInput(
                "At least one key holder is required".to_string(),
            ));
        }
        if request.threshold == 0 || request.threshold > request.key_holders.len() {
            return Err(VaultError::InvalidInput(format!(
                "Threshold must be between 1 and {} (got {})",
                request.key_holders.len(),
                request.threshold
            )));
        }
        if request.source_asset.trim().is_empty() || request.target_asset.trim().is_empty() {
            return Err(VaultError::InvalidInput(
                "Source and target assets are required".to_string(),
            ));
        }

        let source_asset = request.source_asset.trim().to_uppercase();
        let target_asset = request.target_asset.trim().to_uppercase();
        let ttl_hours = request.ttl_hours.unwrap_or(self.config.vault_ttl_hours);
        let now = Utc::now();

        let vault = Vault {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: VaultStatus::Created,
            key_holders: request
                .key_holders
                .iter()
                .map(|label| KeyHolder {
                    id: Uuid::new_v4(),
                    label: label.trim().to_string(),
                    approved: false,
                    approved_at: None,
                })
                .collect(),
            threshold: request.threshold,
            total_deposits: 0.0,
            deposit_address: utils::mock_deposit_address(&source_asset),
            source_asset,
            target_asset,
            created_at: now,
            expires_at: now + Duration::hours(ttl_hours),
            proposal_id: None,
        };

        info!(
            "Created vault '{}' ({}): {}-of-{}, {} -> {}, deposit address {}",
            vault.name,
            vault.id,
            vault.threshold,
            vault.key_holders.len(),
            vault.source_asset,
            vault.target_asset,
            vault.deposit_address
        );

        self.store.insert_vault(vault.clone());
        Ok(vault)
    }

    /// Record a deposit against the vault's mock address.
    ///
    /// The first deposit moves `created -> funding`. Deposits are rejected
    /// once an unlock is in progress or the vault is destroyed.
    pub fn record_deposit(&self, id: Uuid, amount: f64) -> Result<Vault, VaultError> {
        if !(amount > 0.0) {
            return Err(VaultError::InvalidInput(
                "Deposit amount must be greater than 0".to_string(),
            ));
        }

        let result = self.store.with_vault_mut(id, |vault| {
            match vault.status {
                VaultStatus::Unlocking | VaultStatus::Destroyed => {
                    return Err(VaultError::InvalidState {
                        status: vault.status.as_str(),
                        action: "accept deposits",
                    });
                }
                VaultStatus::Created => vault.status = VaultStatus::Funding,
                _ => {}
            }

            vault.total_deposits += amount;
            debug!(
                "Deposit on vault {}: +{} (total {})",
                vault.id,
                utils::format_amount(amount, &vault.source_asset),
                utils::format_amount(vault.total_deposits, &vault.source_asset)
            );
            Ok(vault.clone())
        });

        result.ok_or(VaultError::NotFound(id))?
    }

    /// Record a key holder's approval.
    ///
    /// Idempotent per holder. Maintains the readiness invariant: once
    /// `approved_count >= threshold` the vault becomes `ready` (from
    /// `created` or `funding`).
    pub fn approve_holder(&self, id: Uuid, holder_id: Uuid) -> Result<Vault, VaultError> {
        let result = self.store.with_vault_mut(id, |vault| {
            if vault.status == VaultStatus::Destroyed {
                return Err(VaultError::InvalidState {
                    status: vault.status.as_str(),
                    action: "accept approvals",
                });
            }

            let holder = vault
                .key_holders
                .iter_mut()
                .find(|h| h.id == holder_id)
                .ok_or(VaultError::UnknownHolder(holder_id))?;

            if !holder.approved {
                holder.approved = true;
                holder.approved_at = Some(Utc::now());
                info!("Holder '{}' approved vault {}", holder.label, vault.id);
            }

            let approved = vault.approved_count();
            if approved >= vault.threshold
                && matches!(vault.status, VaultStatus::Created | VaultStatus::Funding)
            {
                vault.status = VaultStatus::Ready;
                info!(
                    "Vault {} reached threshold ({}/{}), now ready",
                    vault.id, approved, vault.threshold
                );
            }

            Ok(vault.clone())
        });

        result.ok_or(VaultError::NotFound(id))?
    }

    /// Destroy a vault and drop its record.
    ///
    /// Any attached proposal is removed as well. Returns the final state of
    /// the record.
    pub fn destroy(&self, id: Uuid) -> Result<Vault, VaultError> {
        let mut vault = self.store.remove_vault(id).ok_or(VaultError::NotFound(id))?;

        if let Some(proposal_id) = vault.proposal_id {
            self.store.remove_proposal(proposal_id);
        }

        vault.status = VaultStatus::Destroyed;
        info!("Destroyed vault '{}' ({})", vault.name, vault.id);
        Ok(vault)
    }
}
