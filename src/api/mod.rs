//! # REST API Module
//!
//! This module defines all HTTP endpoints for the CipherVault API.
//!
//! ## Endpoint Overview
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/vaults` | Create a vault |
//! | GET | `/vaults` | List vaults |
//! | GET | `/vaults/:id` | Get a vault |
//! | DELETE | `/vaults/:id` | Destroy a vault |
//! | POST | `/vaults/:id/deposits` | Record a deposit |
//! | POST | `/vaults/:id/approvals` | Holder activation approval |
//! | POST | `/vaults/:id/proposals` | Create an unlock proposal |
//! | GET | `/proposals/:id` | Get a proposal |
//! | POST | `/proposals/:id/approvals` | Holder unlock approval |
//! | DELETE | `/proposals/:id` | Cancel a pending proposal |
//! | POST | `/webhooks/shift` | Swap status callback |
//! | POST | `/admin/sweep` | Manual self-destruct sweep |
//! | GET | `/health` | Health check |
//!
//! ## Request/Response Format
//!
//! All requests and responses use JSON:
//!
//! ```json
//! // Success response
//! {
//!     "success": true,
//!     "data": { ... }
//! }
//!
//! // Error response
//! {
//!     "success": false,
//!     "error": {
//!         "code": "ERROR_CODE",
//!         "message": "Human readable message"
//!     }
//! }
//! ```

pub mod handlers;
pub mod routes;

pub use routes::configure_routes;
