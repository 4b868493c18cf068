//! # CipherVault Backend Service
//!
//! This is the main entry point for the backend service that manages
//! CipherVault multi-party vaults. It provides:
//!
//! - REST API for vault and unlock-proposal operations
//! - Swap fan-out through a SideShift-compatible provider (or a
//!   deterministic mock when no API key is configured)
//! - A webhook endpoint for swap status callbacks
//! - A background self-destruct sweeper for expired records
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                       BACKEND SERVICE                           │
//! │                                                                 │
//! │  ┌─────────────┐  ┌───────────────┐  ┌──────────────────────┐  │
//! │  │  REST API   │  │   Webhooks    │  │ Background Services  │  │
//! │  │  (Actix)    │  │               │  │ • Self-destruct      │  │
//! │  │             │  │ /webhooks/    │  │   sweeper            │  │
//! │  │  /vaults    │  │     shift     │  │                      │  │
//! │  │  /proposals │  │               │  │                      │  │
//! │  └──────┬──────┘  └───────┬───────┘  └──────────┬───────────┘  │
//! │         └─────────────────┴─────────────────────┘              │
//! │                           │                                    │
//! │  ┌────────────────────────┴──────────────────────────────────┐ │
//! │  │                     SERVICE LAYER                          │ │
//! │  │  ┌──────────────┐ ┌─────────────────┐ ┌────────────────┐  │ │
//! │  │  │ VaultService │ │ ProposalService │ │  ShiftClient   │  │ │
//! │  │  └──────────────┘ └─────────────────┘ └────────────────┘  │ │
//! │  └────────────────────────┬──────────────────────────────────┘ │
//! │                           │                                    │
//! │                 ┌─────────┴─────────┐                          │
//! │                 │    MemoryStore    │   (no persistence:       │
//! │                 │  vaults/proposals │    restart wipes state)  │
//! │                 └───────────────────┘                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! 1. Optionally copy `.env.example` to `.env` and configure
//! 2. Start the server: `cargo run`
//!
//! With no configuration at all the service runs in mock swap mode and is
//! fully usable offline.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod models;
mod services;
mod store;
mod utils;

use config::AppConfig;
use services::{ProposalService, SelfDestructSweeper, ShiftClient, VaultService};
use store::MemoryStore;

/// Application state shared across all handlers.
///
/// `Arc` lets every worker thread and the background sweeper share the same
/// services and store.
pub struct AppState {
    /// The in-memory vault/proposal maps.
    pub store: MemoryStore,

    /// Vault management service.
    pub vaults: VaultService,

    /// Unlock proposal orchestration service.
    pub proposals: ProposalService,

    /// Expiry sweeper (also invoked manually via /admin/sweep).
    pub sweeper: SelfDestructSweeper,

    /// Application configuration.
    pub config: AppConfig,
}

/// Main entry point for the backend service.
///
/// This function:
/// 1. Initializes logging
/// 2. Loads configuration from environment
/// 3. Builds the store and services
/// 4. Starts the background sweeper
/// 5. Launches the HTTP server
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // =========================================
    // STEP 1: Initialize Logging
    // =========================================
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("🚀 Starting CipherVault Backend Service");

    // =========================================
    // STEP 2: Load Configuration
    // =========================================
    dotenvy::dotenv().ok(); // It's okay if .env doesn't exist

    let config = AppConfig::from_env().expect("Failed to load configuration");

    info!("📋 Configuration loaded");
    info!("   Swap provider: {}", config.sideshift_api_url);
    info!(
        "   Swap mode: {}",
        if config.use_mock_shifts() { "mock" } else { "live" }
    );

    // =========================================
    // STEP 3: Initialize Store and Services
    // =========================================
    let store = MemoryStore::new();
    let shift_client = ShiftClient::new(&config);

    let vaults = VaultService::new(store.clone(), config.clone());
    let proposals = ProposalService::new(store.clone(), shift_client, config.clone());
    let sweeper = SelfDestructSweeper::new(
        store.clone(),
        vaults.clone(),
        proposals.clone(),
        config.clone(),
    );

    info!("🔧 Services initialized");

    // =========================================
    // STEP 4: Create Application State
    // =========================================
    let app_state = Arc::new(AppState {
        store,
        vaults,
        proposals,
        sweeper: sweeper.clone(),
        config: config.clone(),
    });

    // =========================================
    // STEP 5: Start Background Sweeper
    // =========================================
    tokio::spawn(async move {
        sweeper.start().await;
    });

    info!("💣 Self-destruct sweeper started");

    // =========================================
    // STEP 6: Start HTTP Server
    // =========================================
    let server_host = config.server_host.clone();
    let server_port = config.server_port;

    info!("🌐 Starting HTTP server on {}:{}", server_host, server_port);

    HttpServer::new(move || {
        App::new()
            // Attach shared application state
            .app_data(web::Data::new(app_state.clone()))
            // The SPA talks to us from another origin
            .wrap(Cors::permissive())
            // Add logging middleware
            .wrap(middleware::Logger::default())
            // Configure API routes
            .configure(api::configure_routes)
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
