// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account Mediator API Server
//!
//! Mediates user account lifecycle between HTTP clients, the identity
//! provider, Cloud Vision and the user document store.

use account_mediator::{
    config::Config,
    db::{FirestoreDb, MemoryDb, UserStore},
    services::{AccountService, IdentityClient, SafeSearchClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Account Mediator API");

    // User store: Firestore when a project is configured, in-memory otherwise
    let store: Arc<dyn UserStore> = match &config.gcp_project_id {
        Some(project_id) => Arc::new(FirestoreDb::new(project_id).await?),
        None => {
            tracing::warn!("GCP_PROJECT_ID not set, using in-memory user store");
            Arc::new(MemoryDb::new())
        }
    };

    let identity = Arc::new(IdentityClient::new(&config)?);
    tracing::info!(domain = %config.idp_domain, "Identity provider client initialized");

    let moderator = Arc::new(SafeSearchClient::new(&config)?);
    tracing::info!("Cloud Vision client initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        accounts: AccountService::new(store, identity, moderator),
    });

    // Build router
    let app = account_mediator::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("account_mediator=debug,info")),
        )
        .with(format)
        .init();
}
