//! # In-Memory Store Module
//!
//! This module holds all backend state: a vault map and a proposal map,
//! both keyed by id. There is no persistence layer; a restart loses
//! everything, which is the intended behavior for this demo system.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  MemoryStore                     │
//! │                                                  │
//! │  ┌──────────────────┐   ┌─────────────────────┐ │
//! │  │  vaults          │   │  proposals          │ │
//! │  │  DashMap<Uuid,   │   │  DashMap<Uuid,      │ │
//! │  │          Vault>  │   │    UnlockProposal>  │ │
//! │  └──────────────────┘   └─────────────────────┘ │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Locking is per entry only. Operations that touch both maps (e.g.
//! attaching a proposal to a vault) run as two independent updates with no
//! transaction between them.

pub mod models;

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

pub use models::*;

/// Shared handle to the process-memory maps.
///
/// Cloning is cheap; all clones see the same state.
///
/// ## Usage
///
/// ```rust,ignore
/// let store = MemoryStore::new();
/// store.insert_vault(vault);
/// let found = store.vault(id);
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// All live vaults, keyed by vault id.
    vaults: Arc<DashMap<Uuid, Vault>>,

    /// All unlock proposals, keyed by proposal id.
    proposals: Arc<DashMap<Uuid, UnlockProposal>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // VAULTS
    // ==========================================

    /// Insert or replace a vault record.
    pub fn insert_vault(&self, vault: Vault) {
        self.vaults.insert(vault.id, vault);
    }

    /// Fetch a vault by id (cloned out of the map).
    pub fn vault(&self, id: Uuid) -> Option<Vault> {
        self.vaults.get(&id).map(|v| v.value().clone())
    }

    /// Snapshot of all vaults.
    pub fn vaults(&self) -> Vec<Vault> {
        self.vaults.iter().map(|v| v.value().clone()).collect()
    }

    /// Mutate a vault in place under its entry lock.
    ///
    /// Returns `None` when the vault doesn't exist, otherwise whatever the
    /// closure returns.
    pub fn with_vault_mut<F, R>(&self, id: Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut Vault) -> R,
    {
        self.vaults.get_mut(&id).map(|mut v| f(&mut v))
    }

    /// Remove a vault record.
    pub fn remove_vault(&self, id: Uuid) -> Option<Vault> {
        self.vaults.remove(&id).map(|(_, v)| v)
    }

    /// Number of vaults currently held.
    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }

    // ==========================================
    // PROPOSALS
    // ==========================================

    /// Insert or replace a proposal record.
    pub fn insert_proposal(&self, proposal: UnlockProposal) {
        self.proposals.insert(proposal.id, proposal);
    }

    /// Fetch a proposal by id (cloned out of the map).
    pub fn proposal(&self, id: Uuid) -> Option<UnlockProposal> {
        self.proposals.get(&id).map(|p| p.value().clone())
    }

    /// Snapshot of all proposals.
    pub fn proposals(&self) -> Vec<UnlockProposal> {
        self.proposals.iter().map(|p| p.value().clone()).collect()
    }

    /// Mutate a proposal in place under its entry lock.
    pub fn with_proposal_mut<F, R>(&self, id: Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut UnlockProposal) -> R,
    {
        self.proposals.get_mut(&id).map(|mut p| f(&mut p))
    }

    /// Remove a proposal record.
    pub fn remove_proposal(&self, id: Uuid) -> Option<UnlockProposal> {
        self.proposals.remove(&id).map(|(_, p)| p)
    }

    /// Number of proposals currently held.
    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    /// Find the proposal owning a given shift order id.
    ///
    /// Webhook callbacks only carry the provider order id, so this scans
    /// the proposal map. Fine at demo scale.
    pub fn find_proposal_by_shift(&self, shift_id: &str) -> Option<Uuid> {
        self.proposals
            .iter()
            .find(|p| p.shifts.iter().any(|s| s.shift_id == shift_id))
            .map(|p| p.id)
    }
}
