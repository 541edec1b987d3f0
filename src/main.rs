// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stride-Sync API Server
//!
//! Keeps a local store of Strava activities in step with Strava through
//! on-demand incremental syncs.

use std::sync::Arc;
use stride_sync::{
    config::{Config, StoreBackend},
    db::{ActivityStore, FirestoreDb, MemoryStore, TokenStore},
    services::{StravaClient, StravaService, SyncEngine},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        store = ?config.store_backend,
        "Starting Stride-Sync API"
    );

    let (store, tokens) = open_stores(&config).await?;

    // Shared token cache and refresh locks for this instance
    let token_cache = Arc::new(dashmap::DashMap::new());
    let refresh_locks = Arc::new(dashmap::DashMap::new());

    let client = StravaClient::new(
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
        config.strava_http_timeout,
    )?;
    let strava_service = StravaService::new(client, tokens, token_cache, refresh_locks);

    let sync_engine = SyncEngine::new(
        Arc::new(strava_service),
        store.clone(),
        config.sync.clone(),
    );
    tracing::info!(
        per_page = config.sync.per_page,
        max_pages = config.sync.max_pages,
        detail_sport_types = ?config.sync.detail_sport_types,
        "Sync engine initialized"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        sync_engine,
    });

    // Build router
    let app = stride_sync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Open the configured activity and token stores.
async fn open_stores(
    config: &Config,
) -> Result<(Arc<dyn ActivityStore>, Arc<dyn TokenStore>), Box<dyn std::error::Error>> {
    match config.store_backend {
        StoreBackend::Firestore => {
            let db = Arc::new(FirestoreDb::new(&config.gcp_project_id).await?);
            let store: Arc<dyn ActivityStore> = db.clone();
            let tokens: Arc<dyn TokenStore> = db;
            Ok((store, tokens))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            let memory = Arc::new(MemoryStore::new());
            let store: Arc<dyn ActivityStore> = memory.clone();
            let tokens: Arc<dyn TokenStore> = memory;
            Ok((store, tokens))
        }
    }
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stride_sync=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
