//! # API Route Configuration
//!
//! This module sets up all the HTTP routes for the API.

use actix_web::web;

use super::handlers;

/// Configure all API routes.
///
/// This function is called from main.rs to set up
/// all the endpoint routes.
///
/// ## Route Structure
///
/// ```text
/// /
/// ├── /health                    GET - Health check
/// ├── /vaults
/// │   ├── ""                     POST - Create vault, GET - List vaults
/// │   └── /{id}
/// │       ├── ""                 GET - Get vault, DELETE - Destroy vault
/// │       ├── /deposits          POST - Record deposit
/// │       ├── /approvals         POST - Holder activation approval
/// │       └── /proposals         POST - Create unlock proposal
/// ├── /proposals/{id}
/// │   ├── ""                     GET - Get proposal, DELETE - Cancel
/// │   └── /approvals             POST - Holder unlock approval
/// ├── /webhooks/shift            POST - Swap status callback
/// └── /admin/sweep               POST - Manual self-destruct sweep
/// ```
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Root endpoint - API information
        .route("/", web::get().to(handlers::api_info))
        // Health check endpoint
        .route("/health", web::get().to(handlers::health_check))
        // Vault endpoints
        .service(
            web::scope("/vaults")
                .route("", web::post().to(handlers::create_vault))
                .route("", web::get().to(handlers::list_vaults))
                .route("/{id}", web::get().to(handlers::get_vault))
                .route("/{id}", web::delete().to(handlers::destroy_vault))
                .route("/{id}/deposits", web::post().to(handlers::deposit))
                .route("/{id}/approvals", web::post().to(handlers::approve_vault))
                .route("/{id}/proposals", web::post().to(handlers::create_proposal)),
        )
        // Proposal endpoints
        .service(
            web::scope("/proposals")
                .route("/{id}", web::get().to(handlers::get_proposal))
                .route("/{id}", web::delete().to(handlers::cancel_proposal))
                .route(
                    "/{id}/approvals",
                    web::post().to(handlers::approve_proposal),
                ),
        )
        // Swap provider callbacks
        .service(
            web::scope("/webhooks").route("/shift", web::post().to(handlers::shift_webhook)),
        )
        // Operational endpoints
        .service(web::scope("/admin").route("/sweep", web::post().to(handlers::run_sweep)));
}
