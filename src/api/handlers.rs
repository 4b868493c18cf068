//! # API Request Handlers
//!
//! This module contains the handler functions for each API endpoint.
//! Each handler:
//! 1. Extracts request data
//! 2. Calls the appropriate service
//! 3. Returns a formatted response
//!
//! ## Error Handling
//!
//! All errors are caught and returned as JSON:
//!
//! ```json
//! {
//!     "success": false,
//!     "error": {
//!         "code": "VAULT_NOT_FOUND",
//!         "message": "Vault not found: 550e8400-..."
//!     }
//! }
//! ```

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{
    ApiResponse, ApprovalRequest, CreateProposalRequest, CreateVaultRequest, DepositRequest,
    HealthResponse, ProposalResponse, ShiftWebhookRequest, VaultResponse,
};
use crate::services::proposal_service::ProposalError;
use crate::services::vault_service::VaultError;
use crate::AppState;

/// API information endpoint (root).
///
/// Returns information about available API endpoints.
///
/// ## Endpoint
///
/// `GET /`
pub async fn api_info() -> HttpResponse {
    let info = json!({
        "name": "CipherVault API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Backend API for multi-party vaults with swap-on-unlock",
        "endpoints": {
            "health": { "method": "GET", "path": "/health" },
            "vaults": {
                "create": { "method": "POST", "path": "/vaults" },
                "list": { "method": "GET", "path": "/vaults" },
                "get": { "method": "GET", "path": "/vaults/{id}" },
                "deposit": { "method": "POST", "path": "/vaults/{id}/deposits" },
                "approve": { "method": "POST", "path": "/vaults/{id}/approvals" },
                "destroy": { "method": "DELETE", "path": "/vaults/{id}" },
                "propose": { "method": "POST", "path": "/vaults/{id}/proposals" }
            },
            "proposals": {
                "get": { "method": "GET", "path": "/proposals/{id}" },
                "approve": { "method": "POST", "path": "/proposals/{id}/approvals" },
                "cancel": { "method": "DELETE", "path": "/proposals/{id}" }
            },
            "webhooks": {
                "shift": { "method": "POST", "path": "/webhooks/shift" }
            }
        }
    });

    HttpResponse::Ok().json(ApiResponse::success(info))
}

/// Health check endpoint.
///
/// ## Endpoint
///
/// `GET /health`
///
/// ## Example
///
/// ```bash
/// curl http://127.0.0.1:8080/health
/// ```
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "status": "healthy",
///         "vaults": 3,
///         "proposals": 1,
///         "swapProvider": "mock",
///         "version": "0.1.0",
///         "timestamp": "2026-08-06T12:00:00Z"
///     }
/// }
/// ```
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        vaults: state.store.vault_count(),
        proposals: state.store.proposal_count(),
        swap_provider: if state.config.use_mock_shifts() {
            "mock"
        } else {
            "live"
        }
        .to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    };

    HttpResponse::Ok().json(ApiResponse::success(response))
}

// ==========================================
// VAULTS
// ==========================================

/// Create a new vault.
///
/// ## Endpoint
///
/// `POST /vaults`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/vaults \
///   -H "Content-Type: application/json" \
///   -d '{
///     "name": "family savings",
///     "keyHolders": ["alice", "bob", "carol"],
///     "threshold": 2,
///     "sourceAsset": "BTC",
///     "targetAsset": "ETH"
///   }'
/// ```
///
/// The response includes the generated key holder ids and the mock deposit
/// address.
pub async fn create_vault(
    state: web::Data<Arc<AppState>>,
    body: web::Json<CreateVaultRequest>,
) -> HttpResponse {
    info!("Create vault request: '{}'", body.name);

    match state.vaults.create_vault(body.into_inner()) {
        Ok(vault) => HttpResponse::Created().json(ApiResponse::success(VaultResponse::from(vault))),
        Err(e) => vault_error_response(&e),
    }
}

/// List all vaults, newest first.
///
/// ## Endpoint
///
/// `GET /vaults`
pub async fn list_vaults(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let vaults: Vec<VaultResponse> = state
        .vaults
        .list()
        .into_iter()
        .map(VaultResponse::from)
        .collect();

    HttpResponse::Ok().json(ApiResponse::success(vaults))
}

/// Get a single vault.
///
/// ## Endpoint
///
/// `GET /vaults/{id}`
pub async fn get_vault(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    match state.vaults.get(path.into_inner()) {
        Ok(vault) => HttpResponse::Ok().json(ApiResponse::success(VaultResponse::from(vault))),
        Err(e) => vault_error_response(&e),
    }
}

/// Record a deposit against a vault.
///
/// The first deposit moves the vault from `created` to `funding`.
///
/// ## Endpoint
///
/// `POST /vaults/{id}/deposits`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/vaults/$VAULT_ID/deposits \
///   -H "Content-Type: application/json" \
///   -d '{ "amount": 0.5 }'
/// ```
pub async fn deposit(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<DepositRequest>,
) -> HttpResponse {
    let vault_id = path.into_inner();
    info!("Deposit request: {} on vault {}", body.amount, vault_id);

    match state.vaults.record_deposit(vault_id, body.amount) {
        Ok(vault) => HttpResponse::Ok().json(ApiResponse::success(VaultResponse::from(vault))),
        Err(e) => vault_error_response(&e),
    }
}

/// Record a key holder's activation approval.
///
/// When approvals reach the vault threshold the vault becomes `ready`.
///
/// ## Endpoint
///
/// `POST /vaults/{id}/approvals`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/vaults/$VAULT_ID/approvals \
///   -H "Content-Type: application/json" \
///   -d '{ "holderId": "550e8400-e29b-41d4-a716-446655440000" }'
/// ```
pub async fn approve_vault(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<ApprovalRequest>,
) -> HttpResponse {
    let vault_id = path.into_inner();
    info!("Vault approval: holder {} on {}", body.holder_id, vault_id);

    match state.vaults.approve_holder(vault_id, body.holder_id) {
        Ok(vault) => HttpResponse::Ok().json(ApiResponse::success(VaultResponse::from(vault))),
        Err(e) => vault_error_response(&e),
    }
}

/// Destroy a vault.
///
/// ## Endpoint
///
/// `DELETE /vaults/{id}`
pub async fn destroy_vault(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    match state.vaults.destroy(path.into_inner()) {
        Ok(vault) => HttpResponse::Ok().json(ApiResponse::success(VaultResponse::from(vault))),
        Err(e) => vault_error_response(&e),
    }
}

// ==========================================
// PROPOSALS
// ==========================================

/// Create an unlock proposal for a ready vault.
///
/// The vault moves to `unlocking`; holders then approve the proposal via
/// `POST /proposals/{id}/approvals`.
///
/// ## Endpoint
///
/// `POST /vaults/{id}/proposals`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/vaults/$VAULT_ID/proposals \
///   -H "Content-Type: application/json" \
///   -d '{
///     "recipients": [
///         { "address": "0xaaa...", "amount": 1.0 },
///         { "address": "0xbbb...", "amount": 0.5, "targetAsset": "USDT" }
///     ]
///   }'
/// ```
pub async fn create_proposal(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<CreateProposalRequest>,
) -> HttpResponse {
    let vault_id = path.into_inner();
    info!(
        "Create proposal request: vault {}, {} recipients",
        vault_id,
        body.recipients.len()
    );

    match state.proposals.create_proposal(vault_id, body.into_inner()) {
        Ok(proposal) => {
            HttpResponse::Created().json(ApiResponse::success(ProposalResponse::from(proposal)))
        }
        Err(e) => proposal_error_response(&e),
    }
}

/// Get a single proposal.
///
/// ## Endpoint
///
/// `GET /proposals/{id}`
pub async fn get_proposal(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    match state.proposals.get(path.into_inner()) {
        Ok(proposal) => {
            HttpResponse::Ok().json(ApiResponse::success(ProposalResponse::from(proposal)))
        }
        Err(e) => proposal_error_response(&e),
    }
}

/// Record a key holder's approval of a proposal.
///
/// When approvals reach the vault threshold the proposal executes: one
/// shift is placed per recipient and the response carries the tracking
/// records.
///
/// ## Endpoint
///
/// `POST /proposals/{id}/approvals`
pub async fn approve_proposal(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<ApprovalRequest>,
) -> HttpResponse {
    let proposal_id = path.into_inner();
    info!(
        "Proposal approval: holder {} on {}",
        body.holder_id, proposal_id
    );

    match state.proposals.approve(proposal_id, body.holder_id).await {
        Ok(proposal) => {
            HttpResponse::Ok().json(ApiResponse::success(ProposalResponse::from(proposal)))
        }
        Err(e) => proposal_error_response(&e),
    }
}

/// Cancel a pending proposal.
///
/// The vault returns to `ready`.
///
/// ## Endpoint
///
/// `DELETE /proposals/{id}`
pub async fn cancel_proposal(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    match state.proposals.cancel(path.into_inner()) {
        Ok(proposal) => {
            HttpResponse::Ok().json(ApiResponse::success(ProposalResponse::from(proposal)))
        }
        Err(e) => proposal_error_response(&e),
    }
}

// ==========================================
// WEBHOOKS & ADMIN
// ==========================================

/// Swap status callback.
///
/// The swap provider (or a curl-wielding operator in mock mode) reports
/// shift status changes here; the owning proposal is updated and
/// aggregated.
///
/// ## Endpoint
///
/// `POST /webhooks/shift`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/webhooks/shift \
///   -H "Content-Type: application/json" \
///   -d '{ "shiftId": "cv-9f3a1b2c4d5e", "status": "settled" }'
/// ```
pub async fn shift_webhook(
    state: web::Data<Arc<AppState>>,
    body: web::Json<ShiftWebhookRequest>,
) -> HttpResponse {
    info!("Shift webhook: {} -> {}", body.shift_id, body.status);

    match state
        .proposals
        .update_shift_status(&body.shift_id, &body.status)
    {
        Ok(proposal) => {
            HttpResponse::Ok().json(ApiResponse::success(ProposalResponse::from(proposal)))
        }
        Err(e) => proposal_error_response(&e),
    }
}

/// Run the self-destruct sweep immediately.
///
/// ## Endpoint
///
/// `POST /admin/sweep`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "proposalsCancelled": 1,
///         "vaultsDestroyed": 2,
///         "proposalsPurged": 0
///     }
/// }
/// ```
pub async fn run_sweep(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let report = state.sweeper.run_once();
    HttpResponse::Ok().json(ApiResponse::success(report))
}

// ==========================================
// ERROR MAPPING
// ==========================================

/// Map a vault service error onto an HTTP status and error code.
fn vault_error_response(e: &VaultError) -> HttpResponse {
    error!("Vault operation failed: {}", e);

    let (status, code) = match e {
        VaultError::NotFound(_) => (StatusCode::NOT_FOUND, "VAULT_NOT_FOUND"),
        VaultError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        VaultError::InvalidState { .. } => (StatusCode::CONFLICT, "INVALID_STATE"),
        VaultError::UnknownHolder(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_HOLDER"),
    };

    HttpResponse::build(status).json(ApiResponse::<()>::error(code, &e.to_string()))
}

/// Map a proposal service error onto an HTTP status and error code.
fn proposal_error_response(e: &ProposalError) -> HttpResponse {
    error!("Proposal operation failed: {}", e);

    let (status, code) = match e {
        ProposalError::NotFound(_) => (StatusCode::NOT_FOUND, "PROPOSAL_NOT_FOUND"),
        ProposalError::VaultNotFound(_) => (StatusCode::NOT_FOUND, "VAULT_NOT_FOUND"),
        ProposalError::ShiftNotFound(_) => (StatusCode::NOT_FOUND, "SHIFT_NOT_FOUND"),
        ProposalError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
        ProposalError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        ProposalError::UnknownHolder(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_HOLDER"),
    };

    HttpResponse::build(status).json(ApiResponse::<()>::error(code, &e.to_string()))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::Value;

    use super::*;
    use crate::api::configure_routes;
    use crate::config::AppConfig;
    use crate::services::{ProposalService, SelfDestructSweeper, ShiftClient, VaultService};
    use crate::store::MemoryStore;

    fn app_state() -> Arc<AppState> {
        let store = MemoryStore::new();
        let config = AppConfig::for_tests();
        let shifts = ShiftClient::new(&config);
        let vaults = VaultService::new(store.clone(), config.clone());
        let proposals = ProposalService::new(store.clone(), shifts, config.clone());
        let sweeper = SelfDestructSweeper::new(
            store.clone(),
            vaults.clone(),
            proposals.clone(),
            config.clone(),
        );
        Arc::new(AppState {
            store,
            vaults,
            proposals,
            sweeper,
            config,
        })
    }

    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health_endpoint() {
        let state = app_state();
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["swapProvider"], "mock");
    }

    #[actix_web::test]
    async fn test_vault_lifecycle_over_http() {
        let state = app_state();
        let app = test_app!(state);

        // Create
        let req = test::TestRequest::post()
            .uri("/vaults")
            .set_json(json!({
                "name": "api vault",
                "keyHolders": ["alice", "bob"],
                "threshold": 2,
                "sourceAsset": "BTC",
                "targetAsset": "ETH"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "created");
        let vault_id = body["data"]["id"].as_str().unwrap().to_string();
        let holder_ids: Vec<String> = body["data"]["keyHolders"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["id"].as_str().unwrap().to_string())
            .collect();

        // Deposit
        let req = test::TestRequest::post()
            .uri(&format!("/vaults/{}/deposits", vault_id))
            .set_json(json!({ "amount": 1.5 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "funding");
        assert_eq!(body["data"]["totalDeposits"], 1.5);

        // Approvals up to threshold
        for (i, holder_id) in holder_ids.iter().enumerate() {
            let req = test::TestRequest::post()
                .uri(&format!("/vaults/{}/approvals", vault_id))
                .set_json(json!({ "holderId": holder_id }))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            let expected = if i == 1 { "ready" } else { "funding" };
            assert_eq!(body["data"]["status"], expected);
        }

        // Listed
        let req = test::TestRequest::get().uri("/vaults").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_unlock_flow_over_http() {
        let state = app_state();
        let app = test_app!(state);

        // Set up a ready 1-of-1 vault through the services directly
        let vault = state
            .vaults
            .create_vault(CreateVaultRequest {
                name: "unlock me".to_string(),
                key_holders: vec!["alice".into()],
                threshold: 1,
                source_asset: "BTC".to_string(),
                target_asset: "ETH".to_string(),
                ttl_hours: None,
            })
            .unwrap();
        state.vaults.record_deposit(vault.id, 1.0).unwrap();
        let holder_id = vault.key_holders[0].id;
        state.vaults.approve_holder(vault.id, holder_id).unwrap();

        // Create proposal
        let req = test::TestRequest::post()
            .uri(&format!("/vaults/{}/proposals", vault.id))
            .set_json(json!({
                "recipients": [{ "address": "0xaaa", "amount": 0.75 }]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "pending");
        let proposal_id = body["data"]["id"].as_str().unwrap().to_string();

        // Approve: threshold is 1, so this executes the fan-out
        let req = test::TestRequest::post()
            .uri(&format!("/proposals/{}/approvals", proposal_id))
            .set_json(json!({ "holderId": holder_id }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "executing");
        assert_eq!(body["data"]["executed"], true);
        let shift_id = body["data"]["shifts"][0]["shiftId"].as_str().unwrap().to_string();

        // Settle via webhook: proposal settles, vault is destroyed
        let req = test::TestRequest::post()
            .uri("/webhooks/shift")
            .set_json(json!({ "shiftId": shift_id, "status": "settled" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "settled");

        let req = test::TestRequest::get()
            .uri(&format!("/vaults/{}", vault.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_webhook_unknown_shift_is_404() {
        let state = app_state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/webhooks/shift")
            .set_json(json!({ "shiftId": "cv-unknown", "status": "settled" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "SHIFT_NOT_FOUND");
    }

    #[actix_web::test]
    async fn test_create_vault_bad_threshold_is_400() {
        let state = app_state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/vaults")
            .set_json(json!({
                "name": "broken",
                "keyHolders": ["alice"],
                "threshold": 3,
                "sourceAsset": "BTC",
                "targetAsset": "ETH"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[actix_web::test]
    async fn test_admin_sweep_reports_counts() {
        let state = app_state();
        let app = test_app!(state);

        let req = test::TestRequest::post().uri("/admin/sweep").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["vaultsDestroyed"], 0);
        assert_eq!(body["data"]["proposalsCancelled"], 0);
    }
}
