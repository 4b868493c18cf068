//! # Services Module
//!
//! Core business logic for the CipherVault backend. Each service handles a
//! specific domain.
//!
//! ## Services Overview
//!
//! | Service | Responsibility |
//! |---------|---------------|
//! | `VaultService` | Vault CRUD, deposits, threshold activation |
//! | `ProposalService` | Unlock proposals, approvals, shift fan-out |
//! | `ShiftClient` | Swap provider HTTP client with mock fallback |
//! | `SelfDestructSweeper` | Expiry sweep for vaults and proposals |
//!
//! ## Service Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      SERVICES LAYER                         │
//! │                                                             │
//! │  ┌───────────────┐        ┌──────────────────────────────┐ │
//! │  │ VaultService  │        │       ProposalService        │ │
//! │  │ create        │        │ create / approve / execute   │ │
//! │  │ deposit       │        │ update_shift_status / cancel │ │
//! │  │ approve       │        └──────────────┬───────────────┘ │
//! │  │ destroy       │                       │                 │
//! │  └───────┬───────┘              ┌────────┴────────┐        │
//! │          │                      ▼                 ▼        │
//! │          │              ┌─────────────┐  ┌──────────────┐  │
//! │          │              │ ShiftClient │  │ SelfDestruct │  │
//! │          │              │ (SideShift/ │  │   Sweeper    │  │
//! │          │              │    mock)    │  │              │  │
//! │          │              └─────────────┘  └──────┬───────┘  │
//! │          └────────────────────┬─────────────────┘          │
//! │                               ▼                            │
//! │                         MemoryStore                        │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod proposal_service;
pub mod self_destruct;
pub mod sideshift;
pub mod vault_service;

pub use proposal_service::ProposalService;
pub use self_destruct::SelfDestructSweeper;
pub use sideshift::ShiftClient;
pub use vault_service::VaultService;
