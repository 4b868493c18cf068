//! # Self-Destruct Sweeper
//!
//! Background service that enforces vault and proposal lifetimes:
//!
//! - pending unlock proposals past their expiry are cancelled and their
//!   vault returned to `ready`;
//! - vaults past their expiry are destroyed, unless an executed proposal
//!   still has shifts in flight;
//! - terminal proposals whose vault is already gone are purged.
//!
//! ## Sweep Loop
//!
//! ```text
//! SelfDestructSweeper (background task)
//!              │
//!              └── Every SWEEP_INTERVAL seconds: run_once()
//!                        │
//!                        ├── cancel expired pending proposals
//!                        ├── destroy expired vaults
//!                        └── purge orphaned terminal proposals
//! ```
//!
//! The same sweep can be invoked manually via `POST /admin/sweep`.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::store::{MemoryStore, ProposalStatus, VaultStatus};

use super::{ProposalService, VaultService};

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Expired pending proposals that were cancelled.
    pub proposals_cancelled: usize,

    /// Expired vaults that were destroyed.
    pub vaults_destroyed: usize,

    /// Terminal proposals purged because their vault no longer exists.
    pub proposals_purged: usize,
}

impl SweepReport {
    fn is_empty(&self) -> bool {
        self.proposals_cancelled == 0 && self.vaults_destroyed == 0 && self.proposals_purged == 0
    }
}

/// The sweeper service.
///
/// ## Usage
///
/// ```rust,ignore
/// let sweeper = SelfDestructSweeper::new(store, vaults, proposals, config);
///
/// // Run forever in the background
/// tokio::spawn(async move { sweeper.start().await });
/// ```
#[derive(Clone)]
pub struct SelfDestructSweeper {
    /// Shared in-memory state.
    store: MemoryStore,

    /// Vault teardown goes through the vault service.
    vaults: VaultService,

    /// Proposal cancellation goes through the proposal service.
    proposals: ProposalService,

    /// Application configuration.
    config: AppConfig,
}

impl SelfDestructSweeper {
    /// Create a new sweeper instance.
    pub fn new(
        store: MemoryStore,
        vaults: VaultService,
        proposals: ProposalService,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            vaults,
            proposals,
            config,
        }
    }

    /// Run the sweep loop forever.
    pub async fn start(&self) {
        info!(
            "Starting self-destruct sweeper (every {}s)",
            self.config.sweep_interval
        );

        let mut ticker = interval(Duration::from_secs(self.config.sweep_interval.max(1)));
        loop {
            ticker.tick().await;
            let report = self.run_once();
            if !report.is_empty() {
                info!(
                    "Sweep: {} proposals cancelled, {} vaults destroyed, {} proposals purged",
                    report.proposals_cancelled, report.vaults_destroyed, report.proposals_purged
                );
            }
        }
    }

    /// Run one sweep pass and report what was cleaned up.
    pub fn run_once(&self) -> SweepReport {
        let now = Utc::now();
        let mut report = SweepReport::default();
        debug!("Running self-destruct sweep");

        // Expired pending proposals go first so their vaults are back to
        // ready before the vault pass looks at them.
        for proposal in self.store.proposals() {
            if proposal.status == ProposalStatus::Pending && proposal.is_expired(now) {
                match self.proposals.cancel(proposal.id) {
                    Ok(_) => {
                        info!("Swept expired proposal {}", proposal.id);
                        report.proposals_cancelled += 1;
                    }
                    Err(e) => warn!("Failed to sweep proposal {}: {}", proposal.id, e),
                }
            }
        }

        for vault in self.store.vaults() {
            if !vault.is_expired(now) || vault.status == VaultStatus::Destroyed {
                continue;
            }

            // Don't pull a vault out from under in-flight shifts
            let mid_unlock = vault
                .proposal_id
                .and_then(|pid| self.store.proposal(pid))
                .map(|p| p.status == ProposalStatus::Executing)
                .unwrap_or(false);
            if mid_unlock {
                debug!("Skipping expired vault {} (shifts in flight)", vault.id);
                continue;
            }

            match self.vaults.destroy(vault.id) {
                Ok(_) => {
                    info!("Swept expired vault '{}' ({})", vault.name, vault.id);
                    report.vaults_destroyed += 1;
                }
                Err(e) => warn!("Failed to sweep vault {}: {}", vault.id, e),
            }
        }

        // Settled/failed proposals outlive their vault for inspection, but
        // not forever: once the vault is gone and they are terminal, drop
        // them on the next expiry.
        for proposal in self.store.proposals() {
            let terminal = matches!(
                proposal.status,
                ProposalStatus::Settled | ProposalStatus::Failed
            );
            if terminal && proposal.is_expired(now) && self.store.vault(proposal.vault_id).is_none()
            {
                self.store.remove_proposal(proposal.id);
                report.proposals_purged += 1;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProposalRequest, CreateVaultRequest, RecipientRequest};
    use crate::services::sideshift::ShiftClient;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    struct Fixture {
        store: MemoryStore,
        vaults: VaultService,
        proposals: ProposalService,
        sweeper: SelfDestructSweeper,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let config = AppConfig::for_tests();
        let shifts = ShiftClient::new(&config);
        let vaults = VaultService::new(store.clone(), config.clone());
        let proposals = ProposalService::new(store.clone(), shifts, config.clone());
        let sweeper = SelfDestructSweeper::new(
            store.clone(),
            vaults.clone(),
            proposals.clone(),
            config,
        );
        Fixture {
            store,
            vaults,
            proposals,
            sweeper,
        }
    }

    fn ready_vault(fx: &Fixture) -> crate::store::Vault {
        let vault = fx
            .vaults
            .create_vault(CreateVaultRequest {
                name: "sweep target".to_string(),
                key_holders: vec!["alice".into(), "bob".into()],
                threshold: 1,
                source_asset: "BTC".to_string(),
                target_asset: "ETH".to_string(),
                ttl_hours: None,
            })
            .unwrap();
        fx.vaults.record_deposit(vault.id, 1.0).unwrap();
        let holder = vault.key_holders[0].id;
        fx.vaults.approve_holder(vault.id, holder).unwrap()
    }

    fn expire_vault(fx: &Fixture, id: Uuid) {
        fx.store.with_vault_mut(id, |v| {
            v.expires_at = Utc::now() - ChronoDuration::hours(1);
        });
    }

    fn expire_proposal(fx: &Fixture, id: Uuid) {
        fx.store.with_proposal_mut(id, |p| {
            p.expires_at = Utc::now() - ChronoDuration::hours(1);
        });
    }

    #[test]
    fn test_fresh_records_untouched() {
        let fx = fixture();
        ready_vault(&fx);

        let report = fx.sweeper.run_once();
        assert_eq!(report.vaults_destroyed, 0);
        assert_eq!(report.proposals_cancelled, 0);
        assert_eq!(fx.store.vault_count(), 1);
    }

    #[test]
    fn test_expired_vault_destroyed() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        expire_vault(&fx, vault.id);

        let report = fx.sweeper.run_once();
        assert_eq!(report.vaults_destroyed, 1);
        assert!(fx.store.vault(vault.id).is_none());
    }

    #[test]
    fn test_expired_pending_proposal_reset() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        let proposal = fx
            .proposals
            .create_proposal(
                vault.id,
                CreateProposalRequest {
                    recipients: vec![RecipientRequest {
                        address: "0xaaa".to_string(),
                        amount: 0.5,
                        target_asset: None,
                    }],
                    ttl_hours: None,
                },
            )
            .unwrap();
        expire_proposal(&fx, proposal.id);

        let report = fx.sweeper.run_once();
        assert_eq!(report.proposals_cancelled, 1);
        assert!(fx.store.proposal(proposal.id).is_none());
        assert_eq!(
            fx.vaults.get(vault.id).unwrap().status,
            VaultStatus::Ready
        );
    }

    #[tokio::test]
    async fn test_expired_vault_mid_unlock_is_skipped() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        let holder = vault.key_holders[0].id;
        let proposal = fx
            .proposals
            .create_proposal(
                vault.id,
                CreateProposalRequest {
                    recipients: vec![RecipientRequest {
                        address: "0xaaa".to_string(),
                        amount: 0.5,
                        target_asset: None,
                    }],
                    ttl_hours: None,
                },
            )
            .unwrap();
        // Threshold is 1: this executes the proposal (shifts in flight)
        fx.proposals.approve(proposal.id, holder).await.unwrap();
        expire_vault(&fx, vault.id);

        let report = fx.sweeper.run_once();
        assert_eq!(report.vaults_destroyed, 0);
        assert!(fx.store.vault(vault.id).is_some());
    }

    #[test]
    fn test_orphaned_terminal_proposal_purged() {
        let fx = fixture();
        let vault = ready_vault(&fx);
        let proposal = fx
            .proposals
            .create_proposal(
                vault.id,
                CreateProposalRequest {
                    recipients: vec![RecipientRequest {
                        address: "0xaaa".to_string(),
                        amount: 0.5,
                        target_asset: None,
                    }],
                    ttl_hours: None,
                },
            )
            .unwrap();

        // Simulate a settled unlock whose vault is already gone
        fx.store.with_proposal_mut(proposal.id, |p| {
            p.executed = true;
            p.status = ProposalStatus::Settled;
        });
        fx.store.remove_vault(vault.id);
        expire_proposal(&fx, proposal.id);

        let report = fx.sweeper.run_once();
        assert_eq!(report.proposals_purged, 1);
        assert!(fx.store.proposal(proposal.id).is_none());
    }
}
